use crate::context::Context;
use crate::error::HubError;
use crate::tmpl::Template;

const GIT_URL: &str = "git://${host}/${user}/${repo}.git";
const SSH_URL: &str = "git@${host}:${user}/${repo}.git";
const WEB_URL: &str = "https://${host}/${user}/${repo}${path}";

pub const NO_USER: &str = "** No GitHub user set. See http://help.github.com/git-email-settings/";

#[derive(Debug, Clone, Default)]
pub struct UrlParams {
    pub user: Option<String>,
    /// Either `repo` or `user/repo`.
    pub repo: Option<String>,
    pub private: bool,
    /// Web path appended to the repository page; selects a browser URL.
    pub web: Option<String>,
}

/// Build a clone or web URL, filling gaps from the context: the login
/// for a missing user and the current repository for a missing name.
pub fn github_url(ctx: &dyn Context, host: &str, params: &UrlParams) -> Result<String, HubError> {
    let mut user = params.user.clone();
    let mut repo = params.repo.clone();
    if let Some((u, r)) = params.repo.as_deref().and_then(|r| r.split_once('/')) {
        user = Some(u.to_string());
        repo = Some(r.to_string());
    }
    let user = match user {
        Some(u) => u,
        None => ctx.github_user().ok_or_else(|| HubError::abort(NO_USER))?,
    };
    let repo = repo.unwrap_or_else(|| ctx.repo_name());

    let pattern = match (&params.web, params.private) {
        (Some(_), _) => WEB_URL,
        (None, true) => SSH_URL,
        (None, false) => GIT_URL,
    };
    let vars = crate::vars! {
        "host" => host,
        "user" => user,
        "repo" => repo,
        "path" => params.web.clone().unwrap_or_default(),
    };
    Ok(Template::parse(pattern)?.render(&vars))
}

/// Extract `(owner, repo)` from a remote URL pointing at `host`, in any
/// of the `git://`, `https://`, `ssh://` or `git@host:` forms.
pub fn parse_remote_url(url: &str, host: &str) -> Option<(String, String)> {
    let at = url.find(host)?;
    let rest = &url[at + host.len()..];
    let rest = rest.strip_prefix(':').or_else(|| rest.strip_prefix('/'))?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let (owner, repo) = rest.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
