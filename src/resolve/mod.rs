//! Picks the rewrite rule for an invocation, expanding git aliases first.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::args::Args;
use crate::context::AliasSource;
use crate::error::HubError;
use crate::rules::{Rule, RuleSet, Scope};

/// Fallback command when only flags were given.
pub const FALLBACK: &str = "help";

/// Any token matching this means git has something to do besides help.
static ACTIONABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^-]|version|exec-path$|html-path").unwrap());
static COMPOUND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w)-").unwrap());

/// Outcome of looking up a command line.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Normalized effective command name.
    pub name: String,
    /// Tokens the first token expands to, when it names a git alias.
    pub expansion: Option<Vec<String>>,
    pub rule: Option<Rule>,
    /// Whether `help` has to be put in front of the tokens.
    pub fallback: bool,
}

/// `cherry-pick` becomes `cherry_pick`; only the first compound is joined.
pub fn normalize(name: &str) -> String {
    COMPOUND.replace(name, "${1}_").into_owned()
}

pub struct Resolver<'a> {
    rules: RuleSet,
    aliases: &'a dyn AliasSource,
}

impl<'a> Resolver<'a> {
    pub fn new(rules: RuleSet, aliases: &'a dyn AliasSource) -> Self {
        Resolver { rules, aliases }
    }

    pub fn resolve(&self, tokens: &[String]) -> Resolution {
        let fallback = !tokens.iter().any(|t| ACTIONABLE.is_match(t));
        let candidate = if fallback { FALLBACK } else { tokens[0].as_str() };

        let expansion = self.expand_alias(candidate);
        let effective = expansion
            .as_ref()
            .and_then(|words| words.first())
            .map(String::as_str)
            .unwrap_or(candidate);
        let name = normalize(effective);
        let rule = self.rules.get(&name);
        debug!(candidate, %name, alias = expansion.is_some(), matched = rule.is_some(), "resolved command");
        Resolution { name, expansion, rule, fallback }
    }

    /// Resolve `args` and let the matching rule rewrite them. Without a
    /// match the tokens are left exactly as given.
    pub fn dispatch(&self, args: &mut Args, scope: &Scope<'_>) -> Result<Resolution, HubError> {
        let resolution = self.resolve(args.tokens());
        if resolution.fallback {
            args.unshift(FALLBACK);
        }
        if let Some(rule) = resolution.rule {
            if let Some(words) = &resolution.expansion {
                args.delete_at(0);
                args.insert_at(0, words.iter().cloned());
            }
            rule(args, scope)?;
        }
        Ok(resolution)
    }

    /// Aliases starting with `!` are shell commands; those are left to git.
    fn expand_alias(&self, name: &str) -> Option<Vec<String>> {
        let expanded = self.aliases.alias_for(name)?;
        if expanded.starts_with('!') {
            debug!(alias = name, "shell alias left to git");
            return None;
        }
        shlex::split(&expanded).filter(|words| !words.is_empty())
    }
}
