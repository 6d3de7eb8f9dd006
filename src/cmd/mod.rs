//! Command modeling for scheduled and primary invocations.

use std::fmt;

use crate::config::GIT;
use crate::error::HubError;
use crate::pager::Console;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }

    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(GIT, args)
    }

    /// A raw command line handed to `sh -c` verbatim.
    pub fn shell(line: impl Into<String>) -> Self {
        CommandSpec { program: "sh".into(), args: vec!["-c".into(), line.into()] }
    }
}

/// What a post-action callback wants the orchestrator to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

pub type Callback = Box<dyn FnOnce(&mut Console<'_>) -> Result<Flow, HubError>>;

/// One entry of the post-action queue.
pub enum Step {
    Run(CommandSpec),
    Call(Callback),
}

impl From<CommandSpec> for Step {
    fn from(cmd: CommandSpec) -> Self { Step::Run(cmd) }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Run(cmd) => f.debug_tuple("Run").field(cmd).finish(),
            Step::Call(_) => f.write_str("Call(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_spec_uses_default_program() {
        let c = CommandSpec::git(["remote", "add", "mislav"]);
        assert_eq!(c.program, "git");
        assert_eq!(c.args, vec!["remote", "add", "mislav"]);
    }

    #[test]
    fn shell_spec_wraps_line() {
        let c = CommandSpec::shell("git remote add origin git@github.com:me/x.git");
        assert_eq!(c.program, "sh");
        assert_eq!(c.args[0], "-c");
        assert_eq!(c.args[1], "git remote add origin git@github.com:me/x.git");
    }

    #[test]
    fn step_debug_hides_callbacks() {
        let s = Step::Call(Box::new(|_| Ok(Flow::Continue)));
        assert_eq!(format!("{:?}", s), "Call(..)");
        let r: Step = CommandSpec::git(["status"]).into();
        assert!(format!("{:?}", r).starts_with("Run(CommandSpec"));
    }
}
