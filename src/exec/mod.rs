//! Running a rewritten invocation.
//!
//! An invocation with nothing scheduled around it is exec'd in place. Any
//! pre-command, post-action, executable override or skip turns hub into a
//! supervisor that runs the pieces one after another, stopping at the
//! first non-zero exit.

use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::args::Args;
use crate::cmd::{CommandSpec, Flow, Step};
use crate::config::GIT;
use crate::error::HubError;
use crate::pager::Console;
use crate::render::Renderer;

pub trait Executor {
    /// Run to completion with inherited stdio; returns the exit code.
    fn spawn(&self, cmd: &CommandSpec) -> Result<i32, HubError>;
    /// Replace the current process. Only returns where that is not
    /// possible, after running the command as a child instead.
    fn replace(&self, cmd: &CommandSpec) -> Result<i32, HubError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn spawn(&self, cmd: &CommandSpec) -> Result<i32, HubError> {
        let status = Command::new(&cmd.program)
            .args(&cmd.args)
            .status()
            .map_err(|source| HubError::ExecError { program: cmd.program.clone(), source })?;
        Ok(exit_code(status))
    }

    #[cfg(unix)]
    fn replace(&self, cmd: &CommandSpec) -> Result<i32, HubError> {
        use std::os::unix::process::CommandExt;
        let source = Command::new(&cmd.program).args(&cmd.args).exec();
        Err(HubError::ExecError { program: cmd.program.clone(), source })
    }

    #[cfg(not(unix))]
    fn replace(&self, cmd: &CommandSpec) -> Result<i32, HubError> {
        self.spawn(cmd)
    }
}

/// Exit code as a shell reports it: `128 + n` for death by signal `n`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

pub struct Orchestrator<'a, E: Executor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: Executor + ?Sized> Orchestrator<'a, E> {
    pub fn new(executor: &'a E) -> Self { Orchestrator { executor } }

    pub fn run(&self, args: Args, console: &mut Console<'_>) -> Result<i32, HubError> {
        if !args.is_chained() {
            let primary = args.primary(GIT);
            debug!(program = %primary.program, args = ?primary.args, "exec");
            return self.executor.replace(&primary);
        }

        let chain = args.into_chain(GIT);
        debug!(
            before = chain.before.len(),
            primary = chain.primary.is_some(),
            after = chain.after.len(),
            "supervising chain"
        );
        for cmd in &chain.before {
            let code = self.spawn(cmd)?;
            if code != 0 {
                return Ok(code);
            }
        }
        if let Some(primary) = &chain.primary {
            let code = self.spawn(primary)?;
            if code != 0 {
                return Ok(code);
            }
        }
        for step in chain.after {
            match step {
                Step::Run(cmd) => {
                    let code = self.spawn(&cmd)?;
                    if code != 0 {
                        return Ok(code);
                    }
                }
                Step::Call(callback) => {
                    if let Flow::Exit(code) = callback(console)? {
                        debug!(code, "callback ended the chain");
                        return Ok(code);
                    }
                }
            }
        }
        Ok(0)
    }

    fn spawn(&self, cmd: &CommandSpec) -> Result<i32, HubError> {
        debug!(program = %cmd.program, args = ?cmd.args, "spawn");
        let code = self.executor.spawn(cmd)?;
        if code != 0 {
            debug!(program = %cmd.program, code, "child failed, halting chain");
        }
        Ok(code)
    }
}

/// Renders what an invocation would run, without running it.
pub struct Planner<'a, R: Renderer> { pub renderer: &'a R }

impl<'a, R: Renderer> Planner<'a, R> {
    /// One line per command; callbacks are not shown.
    pub fn plan(&self, args: &Args) -> Result<Vec<String>, HubError> {
        let mut cmds: Vec<CommandSpec> = args.pre_commands().to_vec();
        if !args.is_skipped() {
            cmds.push(args.primary(GIT));
        }
        cmds.extend(args.post_actions().iter().filter_map(|s| match s {
            Step::Run(cmd) => Some(cmd.clone()),
            Step::Call(_) => None,
        }));
        self.renderer.render_all(&cmds)
    }
}
