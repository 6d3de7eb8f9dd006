//! Read-only facts about the current checkout, as rules see them.

pub mod url;

use std::cell::RefCell;
use std::collections::HashMap;
use std::process::{Command, Stdio};

use tracing::trace;

use crate::config::{Config, GIT};

pub use url::{github_url, parse_remote_url, UrlParams, NO_USER};

/// Repository queries rules may call while rewriting.
pub trait Context {
    fn is_repo(&self) -> bool;
    /// Owner of the default remote on the hosting service.
    fn repo_owner(&self) -> Option<String>;
    /// Owner of the remote the current branch tracks, else `repo_owner`.
    fn repo_user(&self) -> Option<String>;
    fn repo_name(&self) -> String;
    fn current_dirname(&self) -> String;
    /// Configured remotes, `origin` first.
    fn remotes(&self) -> Vec<String>;
    fn remotes_group(&self, name: &str) -> Option<String>;
    fn default_remote(&self) -> String { "origin".to_string() }
    fn tracked_branch(&self) -> Option<String>;
    fn github_user(&self) -> Option<String>;
    fn github_token(&self) -> Option<String>;
    fn core_pager(&self) -> Option<String>;
}

/// Lookup of the host VCS's own command aliases.
pub trait AliasSource {
    fn alias_for(&self, name: &str) -> Option<String>;
}

/// Answers `Context` queries by asking git, once per query.
pub struct GitContext {
    host: String,
    user: Option<String>,
    token: Option<String>,
    cache: RefCell<HashMap<String, Option<String>>>,
}

impl GitContext {
    pub fn new(config: &Config) -> Self {
        GitContext {
            host: config.host.clone(),
            user: config.github_user.clone(),
            token: config.github_token.clone(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Trimmed stdout of a successful git call with non-empty output.
    fn read(&self, args: &[&str]) -> Option<String> {
        let key = args.join(" ");
        if let Some(hit) = self.cache.borrow().get(&key) {
            return hit.clone();
        }
        let value = Command::new(GIT)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
            .filter(|s| !s.is_empty());
        trace!(query = %key, found = value.is_some(), "git query");
        self.cache.borrow_mut().insert(key, value.clone());
        value
    }

    fn config(&self, key: &str) -> Option<String> {
        self.read(&["config", key])
    }

    fn current_branch(&self) -> Option<String> {
        self.read(&["symbolic-ref", "-q", "HEAD"])
            .map(|r| r.trim_start_matches("refs/heads/").to_string())
    }

    fn remote_owner(&self, remote: &str) -> Option<String> {
        let url = self.config(&format!("remote.{remote}.url"))?;
        parse_remote_url(&url, &self.host).map(|(owner, _)| owner)
    }
}

impl Context for GitContext {
    fn is_repo(&self) -> bool {
        self.read(&["rev-parse", "-q", "--git-dir"]).is_some()
    }

    fn repo_owner(&self) -> Option<String> {
        self.remote_owner(&self.default_remote())
    }

    fn repo_user(&self) -> Option<String> {
        let tracking = self
            .current_branch()
            .and_then(|b| self.config(&format!("branch.{b}.remote")));
        tracking
            .and_then(|remote| self.remote_owner(&remote))
            .or_else(|| self.repo_owner())
    }

    fn repo_name(&self) -> String {
        self.config(&format!("remote.{}.url", self.default_remote()))
            .and_then(|url| parse_remote_url(&url, &self.host))
            .map(|(_, repo)| repo)
            .unwrap_or_else(|| self.current_dirname())
    }

    fn current_dirname(&self) -> String {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_default()
    }

    fn remotes(&self) -> Vec<String> {
        let mut list: Vec<String> = self
            .read(&["remote"])
            .map(|out| out.lines().map(str::to_string).collect())
            .unwrap_or_default();
        if let Some(pos) = list.iter().position(|r| r == "origin") {
            let origin = list.remove(pos);
            list.insert(0, origin);
        }
        list
    }

    fn remotes_group(&self, name: &str) -> Option<String> {
        self.config(&format!("remotes.{name}"))
    }

    fn tracked_branch(&self) -> Option<String> {
        let branch = self.current_branch()?;
        self.config(&format!("branch.{branch}.merge"))
            .map(|r| r.trim_start_matches("refs/heads/").to_string())
    }

    fn github_user(&self) -> Option<String> {
        self.user.clone().or_else(|| self.config("github.user"))
    }

    fn github_token(&self) -> Option<String> {
        self.token.clone().or_else(|| self.config("github.token"))
    }

    fn core_pager(&self) -> Option<String> {
        self.read(&["config", "--get-all", "core.pager"])
            .and_then(|all| all.lines().next().map(str::to_string))
    }
}

impl AliasSource for GitContext {
    fn alias_for(&self, name: &str) -> Option<String> {
        self.config(&format!("alias.{name}"))
    }
}
