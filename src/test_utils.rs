use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::env;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::api::{CreateOptions, HostingApi};
use crate::cmd::CommandSpec;
use crate::context::{AliasSource, Context};
use crate::error::HubError;
use crate::exec::Executor;

pub fn env_lock() -> MutexGuard<'static, ()> {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct EnvVarGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvVarGuard {
    pub fn set(key: &'static str, value: &str) -> Self {
        let original = env::var(key).ok();
        env::set_var(key, value);
        Self { key, original }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => env::set_var(self.key, value),
            None => env::remove_var(self.key),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeContext {
    pub is_repo: bool,
    pub owner: Option<String>,
    pub repo_user: Option<String>,
    pub repo_name: String,
    pub dirname: String,
    pub remotes: Vec<String>,
    pub groups: HashMap<String, String>,
    pub tracked: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
    pub pager: Option<String>,
    pub aliases: HashMap<String, String>,
}

impl FakeContext {
    /// Inside a clone of `defunkt/hub`, logged in as `tpw`.
    pub fn in_repo() -> Self {
        FakeContext {
            is_repo: true,
            owner: Some("defunkt".into()),
            repo_user: Some("defunkt".into()),
            repo_name: "hub".into(),
            dirname: "hub".into(),
            remotes: vec!["origin".into()],
            user: Some("tpw".into()),
            token: Some("abc123".into()),
            ..FakeContext::default()
        }
    }

    pub fn alias(mut self, name: &str, expansion: &str) -> Self {
        self.aliases.insert(name.into(), expansion.into());
        self
    }
}

impl Context for FakeContext {
    fn is_repo(&self) -> bool { self.is_repo }
    fn repo_owner(&self) -> Option<String> { self.owner.clone() }
    fn repo_user(&self) -> Option<String> { self.repo_user.clone() }
    fn repo_name(&self) -> String { self.repo_name.clone() }
    fn current_dirname(&self) -> String { self.dirname.clone() }
    fn remotes(&self) -> Vec<String> { self.remotes.clone() }
    fn remotes_group(&self, name: &str) -> Option<String> { self.groups.get(name).cloned() }
    fn tracked_branch(&self) -> Option<String> { self.tracked.clone() }
    fn github_user(&self) -> Option<String> { self.user.clone() }
    fn github_token(&self) -> Option<String> { self.token.clone() }
    fn core_pager(&self) -> Option<String> { self.pager.clone() }
}

impl AliasSource for FakeContext {
    fn alias_for(&self, name: &str) -> Option<String> { self.aliases.get(name).cloned() }
}

/// Hosting API double: a fixed set of existing `user/repo` names and a
/// log of write calls.
#[derive(Debug, Default)]
pub struct FakeApi {
    pub existing: HashSet<String>,
    pub fail_writes: Option<String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeApi {
    pub fn with_repos<const N: usize>(names: [&str; N]) -> Self {
        FakeApi { existing: names.iter().map(|s| s.to_string()).collect(), ..FakeApi::default() }
    }

    pub fn calls(&self) -> Vec<String> { self.calls.borrow().clone() }

    fn write(&self, call: String) -> Result<(), HubError> {
        self.calls.borrow_mut().push(call);
        match &self.fail_writes {
            Some(msg) => Err(HubError::ApiError(msg.clone())),
            None => Ok(()),
        }
    }
}

impl HostingApi for FakeApi {
    fn repo_exists(&self, user: &str, repo: &str) -> Result<bool, HubError> {
        Ok(self.existing.contains(&format!("{user}/{repo}")))
    }
    fn fork_repo(&self, owner: &str, repo: &str) -> Result<(), HubError> {
        self.write(format!("fork {owner}/{repo}"))
    }
    fn create_repo(&self, name: &str, opts: &CreateOptions) -> Result<(), HubError> {
        self.write(format!("create {name} {opts:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Spawn(CommandSpec),
    Replace(CommandSpec),
}

/// Executor double that records calls and answers with scripted codes.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    codes: HashMap<CommandSpec, i32>,
    events: RefCell<Vec<Event>>,
}

impl RecordingExecutor {
    pub fn fail(mut self, cmd: CommandSpec, code: i32) -> Self {
        self.codes.insert(cmd, code);
        self
    }

    pub fn events(&self) -> Vec<Event> { self.events.borrow().clone() }

    fn code(&self, cmd: &CommandSpec) -> i32 { self.codes.get(cmd).copied().unwrap_or(0) }
}

impl Executor for RecordingExecutor {
    fn spawn(&self, cmd: &CommandSpec) -> Result<i32, HubError> {
        self.events.borrow_mut().push(Event::Spawn(cmd.clone()));
        Ok(self.code(cmd))
    }
    fn replace(&self, cmd: &CommandSpec) -> Result<i32, HubError> {
        self.events.borrow_mut().push(Event::Replace(cmd.clone()));
        Ok(self.code(cmd))
    }
}

/// A cloneable in-memory writer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String { String::from_utf8_lossy(&self.0.borrow()).into_owned() }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
