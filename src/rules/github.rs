//! Rules that talk to the hosting service or open its web pages.

use super::Scope;
use crate::api::CreateOptions;
use crate::args::Args;
use crate::cmd::Flow;
use crate::context::UrlParams;
use crate::error::HubError;

const BROWSE_USAGE: &str = "Usage: hub browse [<USER>/]<REPOSITORY>";
const COMPARE_USAGE: &str = "Usage: hub compare [USER] [<START>...]<END>";
const NO_LAUNCHER: &str = "Please set $BROWSER to a web launcher to use this command.";

// $ hub fork
// ... hardcore forking action ...
// > git remote add -f YOUR_USER git@github.com:YOUR_USER/CURRENT_REPO.git
pub fn fork(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    let (Some(user), Some(_), Some(owner)) =
        (scope.repo.github_user(), scope.repo.github_token(), scope.repo.repo_owner())
    else {
        return Ok(());
    };
    let repo = scope.repo.repo_name();

    let exists = scope
        .api
        .repo_exists(&user, &repo)
        .map_err(|e| HubError::abort(format!("error creating fork: {e}")))?;
    let notice = if exists {
        Some(format!("{user}/{repo} already exists on GitHub"))
    } else {
        scope
            .api
            .fork_repo(&owner, &repo)
            .map_err(|e| HubError::abort(format!("error creating fork: {e}")))?;
        None
    };

    if args.contains("--no-remote") {
        args.skip();
        args.after_fn(move |out| {
            if let Some(n) = notice {
                out.puts(n)?;
            }
            Ok(Flow::Continue)
        });
        return Ok(());
    }

    let url = scope.github_url(&UrlParams { private: true, ..Default::default() })?;
    args.replace_all(["remote".to_string(), "add".into(), "-f".into(), user.clone(), url]);
    args.after_fn(move |out| {
        if let Some(n) = notice {
            out.puts(n)?;
        }
        out.puts(format!("new remote: {user}"))?;
        Ok(Flow::Continue)
    });
    Ok(())
}

// $ hub create
// ... create repo on github ...
// > git remote add -f origin git@github.com:YOUR_USER/CURRENT_REPO.git
pub fn create(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    if !scope.repo.is_repo() {
        args.skip();
        args.after_fn(|out| {
            out.puts("'create' must be run from inside a git repository")?;
            Ok(Flow::Continue)
        });
        return Ok(());
    }
    let (Some(user), Some(_)) = (scope.repo.github_user(), scope.repo.github_token()) else {
        return Ok(());
    };

    let mut rest: Vec<String> = args.tokens().iter().skip(1).cloned().collect();
    let mut opts = CreateOptions::default();
    if let Some(pos) = rest.iter().position(|a| a == "-p") {
        rest.remove(pos);
        opts.private = true;
    }
    let mut rest = rest.into_iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-d" => opts.description = rest.next(),
            "-h" => opts.homepage = rest.next(),
            _ => return Err(HubError::abort(format!("unexpected argument: {arg}"))),
        }
    }

    let repo = scope.repo.repo_name();
    let exists = scope
        .api
        .repo_exists(&user, &repo)
        .map_err(|e| HubError::abort(format!("error creating repository: {e}")))?;
    let action = if exists {
        "set remote origin"
    } else {
        scope
            .api
            .create_repo(&repo, &opts)
            .map_err(|e| HubError::abort(format!("error creating repository: {e}")))?;
        "created repository"
    };

    let url = scope.github_url(&UrlParams { private: true, ..Default::default() })?;
    if scope.repo.remotes().first().map(String::as_str) != Some("origin") {
        args.replace_all(["remote", "add", "-f", "origin", url.as_str()]);
    } else {
        args.replace_all(["remote", "-v"]);
    }
    args.after_fn(move |out| {
        if exists {
            out.puts(format!("{user}/{repo} already exists on GitHub"))?;
        }
        out.puts(format!("{action}: {user}/{repo}"))?;
        Ok(Flow::Continue)
    });
    Ok(())
}

// $ hub browse pjhyett/github-services
// > open https://github.com/pjhyett/github-services
//
// $ hub browse -- issues
// > open https://github.com/CURRENT_REPO/issues
pub fn browse(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    args.shift();
    browse_command(args, scope, |args, scope| {
        let mut dest = args.shift();
        if dest.as_deref() == Some("--") {
            dest = None;
        }
        let mut params = UrlParams::default();
        match &dest {
            Some(d) => params.repo = Some(d.clone()),
            None => match scope.repo.repo_user() {
                Some(u) => params.user = Some(u),
                None => return Err(HubError::abort(BROWSE_USAGE)),
            },
        }

        // Branch pages only follow the checkout when browsing the current repo.
        let tracked = if dest.is_none() { scope.repo.tracked_branch() } else { None };
        params.web = match args.shift().as_deref() {
            Some("commits") => Some(format!("/commits/{}", tracked.as_deref().unwrap_or("master"))),
            Some("tree") | None => tracked.filter(|b| b != "master").map(|b| format!("/tree/{b}")),
            Some(page) => Some(format!("/{page}")),
        };
        Ok(params)
    })
}

// $ hub compare 1.0...fix
// > open https://github.com/CURRENT_REPO/compare/1.0...fix
//
// $ hub compare myfork feature
// > open https://github.com/myfork/REPO/compare/feature
pub fn compare(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    args.shift();
    browse_command(args, scope, |args, scope| {
        let (range, user) = if args.is_empty() {
            match scope.repo.tracked_branch() {
                Some(branch) if branch != "master" => (branch, scope.repo.repo_user()),
                _ => return Err(HubError::abort(COMPARE_USAGE)),
            }
        } else {
            let range = args.pop().unwrap_or_default();
            let user = args.pop().or_else(|| scope.repo.repo_user());
            (range, user)
        };
        Ok(UrlParams { user, web: Some(format!("/compare/{range}")), ..Default::default() })
    })
}

/// Shared tail of `browse` and `compare`: `-u` prints the URL instead of
/// opening it.
fn browse_command<F>(args: &mut Args, scope: &Scope<'_>, params: F) -> Result<(), HubError>
where
    F: FnOnce(&mut Args, &Scope<'_>) -> Result<UrlParams, HubError>,
{
    let url_only = args.remove("-u");
    if args.remove("-p") {
        eprintln!("Warning: the `-p` flag has no effect anymore");
    }
    let mut params = params(args, scope)?;
    params.private = true;
    if params.web.is_none() {
        params.web = Some(String::new());
    }

    let launcher = if url_only { "echo".to_string() } else { browser_launcher(scope)? };
    args.set_executable(launcher);
    args.push(scope.github_url(&params)?);
    Ok(())
}

fn browser_launcher(scope: &Scope<'_>) -> Result<String, HubError> {
    if let Some(browser) = &scope.config.browser {
        return Ok(browser.clone());
    }
    if cfg!(target_os = "macos") {
        return Ok("open".to_string());
    }
    ["xdg-open", "cygstart"]
        .into_iter()
        .find(|cmd| which::which(cmd).is_ok())
        .map(str::to_string)
        .ok_or_else(|| HubError::abort(NO_LAUNCHER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CommandSpec;
    use crate::config::Config;
    use crate::rules::testing::{apply, replay};
    use crate::rules::Rule;
    use crate::test_utils::{FakeApi, FakeContext};

    fn browse_with(rule: Rule, tokens: &[&str], ctx: &FakeContext) -> Result<Args, HubError> {
        let cfg = Config { browser: Some("firefox".into()), ..Config::default() };
        let api = FakeApi::default();
        let scope = Scope::new(ctx, &api, &cfg);
        let mut args = Args::new(tokens.iter().copied());
        rule(&mut args, &scope)?;
        Ok(args)
    }

    #[test]
    fn fork_creates_and_adds_remote() {
        let api = FakeApi::default();
        let args = apply(fork, &["fork"], &FakeContext::in_repo(), &api).unwrap();
        assert_eq!(api.calls(), ["fork defunkt/hub"]);
        assert_eq!(args.tokens(), ["remote", "add", "-f", "tpw", "git@github.com:tpw/hub.git"]);
        let (out, exit) = replay(args);
        assert_eq!(out, "new remote: tpw\n");
        assert_eq!(exit, None);
    }

    #[test]
    fn fork_existing_repo_only_notes_it() {
        let api = FakeApi::with_repos(["tpw/hub"]);
        let args = apply(fork, &["fork", "--no-remote"], &FakeContext::in_repo(), &api).unwrap();
        assert!(api.calls().is_empty());
        assert!(args.is_skipped());
        assert_eq!(replay(args).0, "tpw/hub already exists on GitHub\n");
    }

    #[test]
    fn fork_failure_aborts() {
        let api = FakeApi { fail_writes: Some("Not Found (HTTP 404)".into()), ..FakeApi::default() };
        let err = apply(fork, &["fork"], &FakeContext::in_repo(), &api).unwrap_err();
        assert_eq!(err.to_string(), "error creating fork: Not Found (HTTP 404)");
    }

    #[test]
    fn fork_without_credentials_passes_through() {
        let ctx = FakeContext { token: None, ..FakeContext::in_repo() };
        let args = apply(fork, &["fork"], &ctx, &FakeApi::default()).unwrap();
        assert_eq!(args.tokens(), ["fork"]);
        assert!(!args.is_chained());
    }

    #[test]
    fn create_outside_repo_skips() {
        let args = apply(create, &["create"], &FakeContext::default(), &FakeApi::default()).unwrap();
        assert!(args.is_skipped());
        assert_eq!(replay(args).0, "'create' must be run from inside a git repository\n");
    }

    #[test]
    fn create_with_options() {
        let api = FakeApi::default();
        let mut ctx = FakeContext::in_repo();
        ctx.remotes.clear();
        let args = apply(create, &["create", "-p", "-d", "a tool", "-h", "http://x.io"], &ctx, &api).unwrap();
        let opts = CreateOptions { private: true, description: Some("a tool".into()), homepage: Some("http://x.io".into()) };
        assert_eq!(api.calls(), [format!("create hub {opts:?}")]);
        assert_eq!(args.tokens(), ["remote", "add", "-f", "origin", "git@github.com:tpw/hub.git"]);
        assert_eq!(replay(args).0, "created repository: tpw/hub\n");
    }

    #[test]
    fn create_existing_with_origin_lists_remotes() {
        let api = FakeApi::with_repos(["tpw/hub"]);
        let args = apply(create, &["create"], &FakeContext::in_repo(), &api).unwrap();
        assert!(api.calls().is_empty());
        assert_eq!(args.tokens(), ["remote", "-v"]);
        assert_eq!(replay(args).0, "tpw/hub already exists on GitHub\nset remote origin: tpw/hub\n");
    }

    #[test]
    fn create_rejects_unknown_argument() {
        let err = apply(create, &["create", "--wat"], &FakeContext::in_repo(), &FakeApi::default()).unwrap_err();
        assert_eq!(err.to_string(), "unexpected argument: --wat");
    }

    #[test]
    fn browse_current_repo() {
        let args = browse_with(browse, &["browse"], &FakeContext::in_repo()).unwrap();
        assert_eq!(args.primary("git"), CommandSpec::new("firefox", ["https://github.com/defunkt/hub"]));
    }

    #[test]
    fn browse_other_repo_url_only() {
        let args = browse_with(browse, &["browse", "-u", "pjhyett/github-services", "wiki"], &FakeContext::in_repo()).unwrap();
        assert_eq!(args.primary("git"), CommandSpec::new("echo", ["https://github.com/pjhyett/github-services/wiki"]));
    }

    #[test]
    fn browse_follows_tracked_branch() {
        let ctx = FakeContext { tracked: Some("feature".into()), ..FakeContext::in_repo() };
        let args = browse_with(browse, &["browse", "--", "commits"], &ctx).unwrap();
        assert_eq!(args.tokens(), ["https://github.com/defunkt/hub/commits/feature"]);
        let args = browse_with(browse, &["browse"], &ctx).unwrap();
        assert_eq!(args.tokens(), ["https://github.com/defunkt/hub/tree/feature"]);
    }

    #[test]
    fn browse_outside_repo_needs_destination() {
        let err = browse_with(browse, &["browse"], &FakeContext::default()).unwrap_err();
        assert_eq!(err.to_string(), BROWSE_USAGE);
    }

    #[test]
    fn compare_ranges() {
        let ctx = FakeContext::in_repo();
        let args = browse_with(compare, &["compare", "1.0...fix"], &ctx).unwrap();
        assert_eq!(args.tokens(), ["https://github.com/defunkt/hub/compare/1.0...fix"]);
        let args = browse_with(compare, &["compare", "myfork", "feature"], &ctx).unwrap();
        assert_eq!(args.tokens(), ["https://github.com/myfork/hub/compare/feature"]);
    }

    #[test]
    fn compare_without_range_uses_tracked_branch() {
        let ctx = FakeContext { tracked: Some("feature".into()), ..FakeContext::in_repo() };
        let args = browse_with(compare, &["compare", "-u"], &ctx).unwrap();
        assert_eq!(args.primary("git"), CommandSpec::new("echo", ["https://github.com/defunkt/hub/compare/feature"]));

        let err = browse_with(compare, &["compare"], &FakeContext::in_repo()).unwrap_err();
        assert_eq!(err.to_string(), COMPARE_USAGE);
    }
}
