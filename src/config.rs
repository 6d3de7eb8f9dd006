//! Settings read from the environment at startup.
//!
//! Git-level settings (`github.user`, `core.pager`, aliases) are read on
//! demand through the repository context instead; the environment values
//! here take precedence over them where both exist.

use std::path::PathBuf;

use crate::tmpl::{Env, VariableResolver};

/// The executable every primary command runs unless a rule overrides it.
pub const GIT: &str = "git";
pub const DEFAULT_HOST: &str = "github.com";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub github_user: Option<String>,
    pub github_token: Option<String>,
    pub browser: Option<String>,
    pub git_pager: Option<String>,
    pub pager: Option<String>,
    pub tmpdir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            github_user: None,
            github_token: None,
            browser: None,
            git_pager: None,
            pager: None,
            tmpdir: std::env::temp_dir(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self { Self::load(&Env) }

    pub fn load<V: VariableResolver + ?Sized>(vars: &V) -> Self {
        let non_empty = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Config::default();
        if let Some(host) = non_empty("GITHUB_HOST") {
            cfg.host = host.trim().to_string();
        }
        cfg.github_user = non_empty("GITHUB_USER");
        cfg.github_token = non_empty("GITHUB_TOKEN");
        cfg.browser = non_empty("BROWSER");
        // An empty pager value is meaningful: it turns paging off.
        cfg.git_pager = vars.get("GIT_PAGER");
        cfg.pager = vars.get("PAGER");
        if let Some(dir) = non_empty("TMPDIR") {
            cfg.tmpdir = PathBuf::from(dir);
        }
        cfg
    }
}
