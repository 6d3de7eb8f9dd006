//! The fixed set of rewrite rules, keyed by normalized command name.

pub mod github;
pub mod meta;
pub mod remote;

use std::collections::BTreeMap;

use crate::api::HostingApi;
use crate::args::Args;
use crate::config::Config;
use crate::context::{github_url, Context, UrlParams, NO_USER};
use crate::error::HubError;

pub type Rule = fn(&mut Args, &Scope<'_>) -> Result<(), HubError>;

/// What a rule may consult while rewriting.
pub struct Scope<'a> {
    pub repo: &'a dyn Context,
    pub api: &'a dyn HostingApi,
    pub config: &'a Config,
}

impl<'a> Scope<'a> {
    pub fn new(repo: &'a dyn Context, api: &'a dyn HostingApi, config: &'a Config) -> Self {
        Scope { repo, api, config }
    }

    pub fn github_url(&self, params: &UrlParams) -> Result<String, HubError> {
        github_url(self.repo, &self.config.host, params)
    }

    pub fn github_user(&self) -> Result<String, HubError> {
        self.repo.github_user().ok_or_else(|| HubError::abort(NO_USER))
    }
}

#[derive(Clone, Default)]
pub struct RuleSet { rules: BTreeMap<&'static str, Rule> }

impl RuleSet {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, name: &'static str, rule: Rule) -> Self {
        self.rules.insert(name, rule);
        self
    }

    pub fn builtin() -> Self {
        RuleSet::new()
            .with("clone", remote::clone)
            .with("submodule", remote::submodule)
            .with("remote", remote::remote)
            .with("fetch", remote::fetch)
            .with("cherry_pick", remote::cherry_pick)
            .with("am", remote::am)
            .with("init", remote::init)
            .with("push", remote::push)
            .with("fork", github::fork)
            .with("create", github::create)
            .with("browse", github::browse)
            .with("compare", github::compare)
            .with("alias", meta::alias)
            .with("version", meta::version)
            .with("--version", meta::version)
            .with("help", meta::help)
            .with("--help", meta::help)
            .with("hub", meta::hub)
    }

    pub fn get(&self, name: &str) -> Option<Rule> { self.rules.get(name).copied() }
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ { self.rules.keys().copied() }
}
