//! Rules that turn `user/repo` shorthands into remotes and URLs.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::Scope;
use crate::args::Args;
use crate::cmd::CommandSpec;
use crate::config::VERSION;
use crate::context::UrlParams;
use crate::error::HubError;
use crate::git;

/// `clone` options whose value is a separate token.
static CLONE_VALUE_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(--(upload-pack|template|depth|origin|branch|reference)|-[ubo])$").unwrap()
});
static URL_OR_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?://|.+?@|[./])").unwrap());
static REMOTE_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+(,\w+)+$").unwrap());
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").unwrap());
static USER_SHA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+)@([a-f0-9]{7,40})$").unwrap());
static PULL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(/pull/\d+)/\w*$").unwrap());

// $ hub clone rtomayko/tilt
// > git clone git://github.com/rtomayko/tilt.git
//
// $ hub clone -p tilt
// > git clone git@github.com:YOUR_LOGIN/tilt.git
pub fn clone(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    let ssh = args.remove("-p");
    let mut idx = 1;
    while idx < args.len() {
        let arg = args[idx].to_string();
        if arg.starts_with('-') {
            if CLONE_VALUE_FLAG.is_match(&arg) {
                idx += 1;
            }
        } else if arg.contains("://") || arg.contains('@') || Path::new(&arg).is_dir() {
            break;
        } else if arg.matches('/').count() <= 1 && !arg.contains(':') {
            let url = scope.github_url(&UrlParams { repo: Some(arg), private: ssh, ..Default::default() })?;
            args.set(idx, url);
            break;
        }
        idx += 1;
    }
    Ok(())
}

// $ hub submodule add -b ryppl ryppl/pip vendor/pip
// > git submodule add -b ryppl git://github.com/ryppl/pip.git vendor/pip
pub fn submodule(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    let Some(index) = args.index_of("add") else { return Ok(()) };
    args.delete_at(index);

    let branch = args.index_of("-b").or_else(|| args.index_of("--branch"));
    let branch_name = branch.and_then(|b| {
        args.delete_at(b);
        args.delete_at(b)
    });

    clone(args, scope)?;

    if let (Some(b), Some(name)) = (branch, branch_name) {
        args.insert_at(b, ["-b".to_string(), name]);
    }
    args.insert_at(index, ["add"]);
    Ok(())
}

// $ hub remote add pjhyett
// > git remote add pjhyett git://github.com/pjhyett/THIS_REPO.git
//
// $ hub remote add origin
// > git remote add origin git://github.com/YOUR_LOGIN/THIS_REPO.git
pub fn remote(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    if !matches!(args.get(1), Some("add") | Some("set-url")) {
        return Ok(());
    }
    match args.last() {
        Some(last) if !URL_OR_PATH.is_match(last) => {}
        _ => return Ok(()),
    }

    let ssh = args.remove("-p");
    let Some(last) = args.last().map(str::to_string) else { return Ok(()) };
    let (user, repo) = match last.split_once('/') {
        Some((u, r)) => (u.to_string(), Some(r.to_string())),
        None => (last.clone(), None),
    };

    let words = args.words();
    let params = if words.get(2).map(String::as_str) == Some("origin") && words.len() == 3 {
        UrlParams { private: ssh, ..Default::default() }
    } else if words.len() >= 2 && words[words.len() - 2] == words[1] {
        // `remote add rtomayko/tilt` names the remote after the user.
        if let Some(idx) = args.index_of(&last) {
            args.set(idx, user.clone());
        }
        UrlParams { user: Some(user), repo, private: ssh, ..Default::default() }
    } else {
        // Remote named explicitly; the shorthand is replaced by the URL.
        args.pop();
        UrlParams { user: Some(user), repo, private: ssh, ..Default::default() }
    };
    args.push(scope.github_url(&params)?);
    Ok(())
}

// $ hub fetch mislav,xoebus
// > git remote add mislav git://github.com/mislav/REPO.git
// > git remote add xoebus git://github.com/xoebus/REPO.git
// > git fetch --multiple mislav xoebus
pub fn fetch(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    let words = args.words();
    let mut names: Vec<String> = if args.contains("--multiple") {
        words.into_iter().skip(1).collect()
    } else if let Some(remote_name) = words.get(1) {
        if REMOTE_LIST.is_match(remote_name) {
            let index = args.index_of(remote_name).unwrap_or(1);
            args.remove(remote_name);
            let names: Vec<String> = remote_name.split(',').map(str::to_string).collect();
            args.insert_at(index, std::iter::once("--multiple".to_string()).chain(names.iter().cloned()));
            names
        } else {
            vec![remote_name.clone()]
        }
    } else {
        Vec::new()
    };

    let remotes = scope.repo.remotes();
    let repo_name = scope.repo.repo_name();
    names.retain(|name| {
        if NON_WORD.is_match(name) || remotes.contains(name) || scope.repo.remotes_group(name).is_some() {
            return false;
        }
        scope.api.repo_exists(name, &repo_name).unwrap_or_else(|e| {
            warn!(remote = %name, error = %e, "repository lookup failed");
            false
        })
    });

    for name in names {
        let url = scope.github_url(&UrlParams { user: Some(name.clone()), ..Default::default() })?;
        args.before(git!("remote", "add", name, url));
    }
    Ok(())
}

// $ hub cherry-pick https://github.com/mislav/hub/commit/a319d88
// > git remote add -f mislav git://github.com/mislav/hub.git
// > git cherry-pick a319d88
//
// $ hub cherry-pick mislav@a319d88
// > git fetch mislav
// > git cherry-pick a319d88
pub fn cherry_pick(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    if args.contains("-m") || args.contains("--mainline") {
        return Ok(());
    }
    let Some(reference) = args.words().pop() else { return Ok(()) };
    let commit_url = Regex::new(&format!(
        r"^(?:https?:)?//{}/(.+?)/(.+?)/commit/([a-f0-9]{{7,40}})",
        regex::escape(&scope.config.host)
    ))
    .map_err(|e| HubError::ResolveError(e.to_string()))?;

    let (user, repo, sha) = if let Some(c) = commit_url.captures(&reference) {
        (c[1].to_string(), Some(c[2].to_string()), c[3].to_string())
    } else if let Some(c) = USER_SHA.captures(&reference) {
        (c[1].to_string(), None, c[2].to_string())
    } else {
        return Ok(());
    };
    if let Some(idx) = args.index_of(&reference) {
        args.set(idx, sha);
    }

    if scope.repo.repo_owner().as_deref() == Some(user.as_str()) {
        args.before(git!("fetch", scope.repo.default_remote()));
    } else if scope.repo.remotes().contains(&user) {
        args.before(git!("fetch", user));
    } else {
        let url = scope.github_url(&UrlParams { user: Some(user.clone()), repo, ..Default::default() })?;
        args.before(git!("remote", "add", "-f", user, url));
    }
    Ok(())
}

// $ hub am https://github.com/defunkt/hub/pull/55
// > curl https://github.com/defunkt/hub/pull/55.patch -o /tmp/55.patch
// > git am /tmp/55.patch
pub fn am(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    let patch_url = Regex::new(&format!(r"^https?://(gist\.)?{}/", regex::escape(&scope.config.host)))
        .map_err(|e| HubError::ResolveError(e.to_string()))?;
    let found = args.tokens().iter().enumerate().find_map(|(i, a)| {
        patch_url.captures(a).map(|c| (i, a.clone(), c.get(1).is_some()))
    });
    let Some((idx, mut url, gist)) = found else { return Ok(()) };

    if !gist {
        url = PULL_SUFFIX.replace(&url, "$1").into_owned();
    }
    let ext = if gist { "txt" } else { "patch" };
    if Path::new(&url).extension().and_then(|e| e.to_str()) != Some(ext) {
        url = format!("{url}.{ext}");
    }
    let base = url.rsplit('/').next().unwrap_or_default();
    let prefix = if gist { "gist-" } else { "" };
    let patch_file = scope.config.tmpdir.join(format!("{prefix}{base}")).to_string_lossy().into_owned();

    args.before(CommandSpec::new(
        "curl",
        ["-#LA".to_string(), format!("hub {VERSION}"), url, "-o".to_string(), patch_file.clone()],
    ));
    args.set(idx, patch_file);
    Ok(())
}

// $ hub init -g
// > git init
// > git remote add origin git@github.com:USER/REPO.git
pub fn init(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    if args.remove("-g") {
        let url = scope.github_url(&UrlParams {
            repo: Some(scope.repo.current_dirname()),
            private: true,
            ..Default::default()
        })?;
        args.after(git!("remote", "add", "origin", url));
    }
    Ok(())
}

// $ hub push origin,staging cool-feature
// > git push origin cool-feature
// > git push staging cool-feature
pub fn push(args: &mut Args, _scope: &Scope<'_>) -> Result<(), HubError> {
    let Some(targets) = args.get(1).filter(|t| t.contains(',')).map(str::to_string) else {
        return Ok(());
    };
    let branch = args.get(2).map(str::to_string);
    let mut remotes = targets.split(',').filter(|r| !r.is_empty());
    if let Some(first) = remotes.next() {
        args.set(1, first);
    }
    for name in remotes {
        let mut cmd = git!("push", name);
        cmd.args.extend(branch.clone());
        args.after(cmd);
    }
    Ok(())
}
