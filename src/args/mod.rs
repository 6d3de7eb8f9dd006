//! The mutable argument list a rewrite rule works on.
//!
//! Besides the tokens handed to git, an `Args` carries the scheduling
//! slots a rule may fill: commands to run before the primary one, steps
//! to run after it, a replacement executable and a skip flag. Index-based
//! mutators do not adjust indices a rule is holding on to; re-fetch them
//! after any insert or delete.

use std::ops::Index;

use crate::cmd::{Callback, CommandSpec, Flow, Step};
use crate::error::HubError;
use crate::pager::Console;

#[derive(Debug, Default)]
pub struct Args {
    tokens: Vec<String>,
    before: Vec<CommandSpec>,
    after: Vec<Step>,
    executable: Option<String>,
    skip: bool,
    noop: bool,
}

/// An `Args` taken apart for execution.
#[derive(Debug)]
pub struct Chain {
    pub before: Vec<CommandSpec>,
    pub primary: Option<CommandSpec>,
    pub after: Vec<Step>,
}

impl Args {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Args { tokens: tokens.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    /// Build from the process arguments, consuming any `--noop` flags
    /// given ahead of the command name.
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = Self::new(argv);
        let lead = args.tokens.iter().position(|t| !t.starts_with('-')).unwrap_or(args.tokens.len());
        let before = args.tokens.len();
        let mut i = 0;
        args.tokens.retain(|t| {
            let keep = i >= lead || t != "--noop";
            i += 1;
            keep
        });
        args.noop = args.tokens.len() != before;
        args
    }

    pub fn tokens(&self) -> &[String] { &self.tokens }
    pub fn len(&self) -> usize { self.tokens.len() }
    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }
    pub fn command(&self) -> Option<&str> { self.get(0) }
    pub fn get(&self, i: usize) -> Option<&str> { self.tokens.get(i).map(String::as_str) }
    pub fn last(&self) -> Option<&str> { self.tokens.last().map(String::as_str) }
    pub fn contains(&self, tok: &str) -> bool { self.tokens.iter().any(|t| t == tok) }
    pub fn index_of(&self, tok: &str) -> Option<usize> { self.tokens.iter().position(|t| t == tok) }

    /// Tokens that are not flags.
    pub fn words(&self) -> Vec<String> {
        self.tokens.iter().filter(|t| !t.starts_with('-')).cloned().collect()
    }

    pub fn unshift(&mut self, tok: impl Into<String>) { self.tokens.insert(0, tok.into()); }
    pub fn push(&mut self, tok: impl Into<String>) { self.tokens.push(tok.into()); }

    pub fn shift(&mut self) -> Option<String> {
        if self.tokens.is_empty() { None } else { Some(self.tokens.remove(0)) }
    }

    pub fn pop(&mut self) -> Option<String> { self.tokens.pop() }

    /// Insert `toks` so the first of them lands at index `i`.
    pub fn insert_at<I, S>(&mut self, i: usize, toks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let at = i.min(self.tokens.len());
        self.tokens.splice(at..at, toks.into_iter().map(Into::into));
    }

    pub fn delete_at(&mut self, i: usize) -> Option<String> {
        if i < self.tokens.len() { Some(self.tokens.remove(i)) } else { None }
    }

    /// Drop every token equal to `tok`; true when any was present.
    pub fn remove(&mut self, tok: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != tok);
        self.tokens.len() != before
    }

    pub fn set(&mut self, i: usize, tok: impl Into<String>) {
        if let Some(slot) = self.tokens.get_mut(i) {
            *slot = tok.into();
        }
    }

    pub fn replace_all<I, S>(&mut self, toks: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = toks.into_iter().map(Into::into).collect();
    }

    pub fn before(&mut self, cmd: CommandSpec) { self.before.push(cmd); }
    pub fn after(&mut self, step: impl Into<Step>) { self.after.push(step.into()); }

    pub fn after_fn<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Console<'_>) -> Result<Flow, HubError> + 'static,
    {
        let cb: Callback = Box::new(f);
        self.after.push(Step::Call(cb));
    }

    pub fn set_executable(&mut self, program: impl Into<String>) { self.executable = Some(program.into()); }
    pub fn executable(&self) -> Option<&str> { self.executable.as_deref() }
    pub fn skip(&mut self) { self.skip = true; }
    pub fn is_skipped(&self) -> bool { self.skip }
    pub fn is_noop(&self) -> bool { self.noop }
    pub fn pre_commands(&self) -> &[CommandSpec] { &self.before }
    pub fn post_actions(&self) -> &[Step] { &self.after }

    /// True when running needs a supervising process rather than a
    /// straight exec of the primary command.
    pub fn is_chained(&self) -> bool {
        !self.before.is_empty() || !self.after.is_empty() || self.executable.is_some() || self.skip
    }

    pub fn primary(&self, default_program: &str) -> CommandSpec {
        CommandSpec {
            program: self.executable.clone().unwrap_or_else(|| default_program.to_string()),
            args: self.tokens.clone(),
        }
    }

    pub fn into_chain(self, default_program: &str) -> Chain {
        let primary = if self.skip { None } else { Some(self.primary(default_program)) };
        Chain { before: self.before, primary, after: self.after }
    }
}

impl Index<usize> for Args {
    type Output = str;
    fn index(&self, i: usize) -> &str { &self.tokens[i] }
}
