//! hub::prelude - grab-and-go imports for driving an invocation

pub use crate::args::Args;
pub use crate::cmd::{CommandSpec, Flow, Step};
pub use crate::config::Config;
pub use crate::context::{AliasSource, Context, GitContext};
pub use crate::error::HubError;
pub use crate::exec::{Executor, Orchestrator, Planner, ProcessExecutor};
pub use crate::pager::Console;
pub use crate::render::PosixRenderer;
pub use crate::resolve::Resolver;
pub use crate::rules::{RuleSet, Scope};
