//! Git-style automatic paging of hub's own output.
//!
//! When stdout is a terminal, the first write through a [`Console`] forks:
//! the child becomes the consumer, reading the pipe on its stdin and
//! exec'ing the pager once the first byte shows up; the parent keeps
//! running the command chain with stdout (and stderr, if that is a
//! terminal too) pointed at the pipe. The parent stays the producer so the
//! invocation's exit status is the chain's, and it waits for the pager in
//! [`Console::finish`].
//!
//! Everything the consumer needs (argv for each attempt, the environment)
//! is built before forking. The child itself only duplicates descriptors,
//! polls, execs and copies bytes.

use std::ffi::CString;
use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write};
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::os::unix::ffi::OsStrExt;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use tracing::{debug, warn};

use crate::config::Config;
use crate::context::Context;
use crate::error::HubError;

pub const DEFAULT_PAGER: &str = "less -isr";
/// Last resort when the configured pager cannot be started.
const FALLBACK_PAGER: &str = "cat";
const SHELL: &str = "/bin/sh";
/// Characters that make a pager setting a shell command line.
const SHELL_META: &str = "|&;<>()$`\\\"'*?[]#~=%{}\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerCommand {
    /// Write straight through; no pager process.
    Passthrough,
    Program(String),
}

/// `GIT_PAGER`, then `core.pager`, then `PAGER`, then [`DEFAULT_PAGER`].
/// The first value present wins even when it is empty, and empty means
/// no paging.
pub fn select_pager(git_pager: Option<&str>, core_pager: Option<&str>, pager: Option<&str>) -> PagerCommand {
    let chosen = git_pager.or(core_pager).or(pager).unwrap_or(DEFAULT_PAGER).trim();
    if chosen.is_empty() || chosen == FALLBACK_PAGER {
        PagerCommand::Passthrough
    } else {
        PagerCommand::Program(chosen.to_string())
    }
}

/// Programs the consumer tries in order. A plain command is only tried
/// when it resolves on `PATH`; shell syntax goes to `/bin/sh -c`. `cat`
/// always comes last.
pub fn attempts(command: &str) -> Vec<Vec<String>> {
    let mut list = Vec::new();
    let words = shlex::split(command).unwrap_or_default();
    if command.contains(|c| SHELL_META.contains(c)) || words.is_empty() {
        list.push(vec![SHELL.to_string(), "-c".to_string(), command.to_string()]);
    } else {
        match which::which(&words[0]) {
            Ok(path) => {
                let mut argv = vec![path.to_string_lossy().into_owned()];
                argv.extend(words[1..].iter().cloned());
                list.push(argv);
            }
            Err(e) => warn!(pager = %words[0], error = %e, "pager not found, using cat"),
        }
    }
    let cat = which::which(FALLBACK_PAGER)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| format!("/bin/{FALLBACK_PAGER}"));
    list.push(vec![cat]);
    list
}

/// Descriptors the producer points at the pipe.
fn redirect_targets(stderr_tty: bool) -> Vec<RawFd> {
    let mut fds = vec![libc::STDOUT_FILENO];
    if stderr_tty {
        fds.push(libc::STDERR_FILENO);
    }
    fds
}

/// Prepared exec arguments for the consumer.
struct Launch {
    attempts: Vec<Vec<CString>>,
    env: Vec<CString>,
}

impl Launch {
    fn new(command: &str) -> Self {
        let attempts = attempts(command)
            .into_iter()
            .filter_map(|argv| argv.into_iter().map(CString::new).collect::<Result<Vec<_>, _>>().ok())
            .collect();

        let mut env: Vec<CString> = std::env::vars_os()
            .filter_map(|(k, v)| {
                let mut entry = k.as_bytes().to_vec();
                entry.push(b'=');
                entry.extend_from_slice(v.as_bytes());
                CString::new(entry).ok()
            })
            .collect();
        if std::env::var_os("LESS").is_none() {
            // Quit when the output fits one screen; keep colors.
            env.extend(CString::new("LESS=FSRX").ok());
        }
        Launch { attempts, env }
    }

    /// Runs in the forked child. Never returns.
    fn consume(&self) -> ! {
        if !wait_for_input() {
            unsafe { libc::_exit(0) };
        }
        for argv in &self.attempts {
            if let Some(path) = argv.first() {
                let _ = unistd::execve(path, argv.as_slice(), self.env.as_slice());
            }
        }
        copy_through();
        unsafe { libc::_exit(0) }
    }
}

/// The consumer half of a running pager split.
#[derive(Debug)]
pub struct Pager {
    child: Pid,
    targets: Vec<RawFd>,
}

impl Pager {
    pub fn spawn(command: &str) -> Result<Pager, HubError> {
        io::stdout().flush()?;
        io::stderr().flush()?;
        Self::spawn_into(command, redirect_targets(io::stderr().is_terminal()), None)
    }

    /// Fork the consumer and point every descriptor in `targets` at the
    /// pipe. `output` becomes the consumer's stdout when given.
    fn spawn_into(command: &str, targets: Vec<RawFd>, output: Option<RawFd>) -> Result<Pager, HubError> {
        let launch = Launch::new(command);
        let (read, write) = unistd::pipe().map_err(|e| HubError::PagerError(format!("pipe: {e}")))?;
        for fd in [read.as_raw_fd(), write.as_raw_fd()] {
            fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
                .map_err(|e| HubError::PagerError(format!("fcntl: {e}")))?;
        }

        // Safety: the child only rearranges descriptors, polls and then
        // execs or _exits; it never returns into the caller.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                drop(write);
                let redirected = unistd::dup2(read.as_raw_fd(), libc::STDIN_FILENO).is_ok()
                    && output.map_or(true, |fd| unistd::dup2(fd, libc::STDOUT_FILENO).is_ok());
                if !redirected {
                    unsafe { libc::_exit(1) };
                }
                drop(read);
                launch.consume()
            }
            Ok(ForkResult::Parent { child }) => {
                drop(read);
                for &fd in &targets {
                    unistd::dup2(write.as_raw_fd(), fd).map_err(|e| HubError::PagerError(format!("dup2 {fd}: {e}")))?;
                }
                drop(write);
                debug!(pid = child.as_raw(), pager = command, "pager started");
                Ok(Pager { child, targets })
            }
            Err(e) => Err(HubError::PagerError(format!("fork: {e}"))),
        }
    }

    /// Close our end of the pipe and wait for the pager to quit.
    pub fn wait(self) -> Result<(), HubError> {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        // Keep the targets valid but detached so the pager sees EOF.
        let null = OpenOptions::new().write(true).open("/dev/null")?;
        for &fd in &self.targets {
            unistd::dup2(null.as_raw_fd(), fd).map_err(|e| HubError::PagerError(format!("dup2 {fd}: {e}")))?;
        }
        drop(null);
        loop {
            match waitpid(self.child, None) {
                Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => return Ok(()),
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => return Ok(()),
                Err(e) => return Err(HubError::PagerError(format!("waitpid: {e}"))),
            }
        }
    }
}

/// Block until stdin has a byte to read. False when the writer went away
/// without sending anything.
fn wait_for_input() -> bool {
    let stdin = unsafe { BorrowedFd::borrow_raw(libc::STDIN_FILENO) };
    let mut fds = [PollFd::new(stdin, PollFlags::POLLIN)];
    loop {
        match poll(&mut fds, PollTimeout::NONE) {
            Ok(_) => {
                let revents = fds[0].revents().unwrap_or(PollFlags::empty());
                return revents.contains(PollFlags::POLLIN);
            }
            Err(Errno::EINTR) => continue,
            Err(_) => return true,
        }
    }
}

/// Stdin to stdout with raw reads and writes, for when nothing could be
/// exec'd.
fn copy_through() {
    let stdout = unsafe { BorrowedFd::borrow_raw(libc::STDOUT_FILENO) };
    let mut buf = [0u8; 8192];
    loop {
        let n = match unistd::read(libc::STDIN_FILENO, &mut buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(Errno::EINTR) => continue,
            Err(_) => return,
        };
        let mut chunk = &buf[..n];
        while !chunk.is_empty() {
            match unistd::write(stdout, chunk) {
                Ok(w) => chunk = &chunk[w..],
                Err(Errno::EINTR) => continue,
                Err(_) => return,
            }
        }
    }
}

/// Where hub prints its own output. Starts the pager lazily on the first
/// write, and only when stdout is a terminal.
pub struct Console<'a> {
    out: Box<dyn Write + 'a>,
    tty: bool,
    paging: bool,
    started: bool,
    /// Set once the reader hung up; later output is dropped.
    closed: bool,
    config: &'a Config,
    repo: &'a dyn Context,
    pager: Option<Pager>,
}

impl<'a> Console<'a> {
    pub fn stdout(config: &'a Config, repo: &'a dyn Context) -> Self {
        let tty = io::stdout().is_terminal();
        Self::with_writer(io::stdout(), tty, config, repo)
    }

    pub fn with_writer(out: impl Write + 'a, tty: bool, config: &'a Config, repo: &'a dyn Context) -> Self {
        Console { out: Box::new(out), tty, paging: true, started: false, closed: false, config, repo, pager: None }
    }

    /// Write unpaged from here on; has no effect once a pager is running.
    pub fn disable_pager(&mut self) { self.paging = false; }

    pub fn is_paging(&self) -> bool { self.pager.is_some() }

    fn page(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if !self.tty || !self.paging {
            return;
        }
        let core = self.repo.core_pager();
        let choice = select_pager(self.config.git_pager.as_deref(), core.as_deref(), self.config.pager.as_deref());
        match choice {
            PagerCommand::Passthrough => debug!("paging disabled"),
            PagerCommand::Program(cmd) => match Pager::spawn(&cmd) {
                Ok(p) => self.pager = Some(p),
                Err(e) => warn!(error = %e, "could not start pager, writing directly"),
            },
        }
    }

    /// A reader that quit early (a pager closed with `q`) ends the output
    /// quietly, the way git treats it.
    fn absorb(&mut self, res: io::Result<()>) -> Result<(), HubError> {
        match res {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("output closed by reader");
                self.closed = true;
                Ok(())
            }
            other => Ok(other?),
        }
    }

    fn write_out(&mut self, bytes: &[u8]) -> Result<(), HubError> {
        self.page();
        if self.closed {
            return Ok(());
        }
        let res = self.out.write_all(bytes);
        self.absorb(res)
    }

    pub fn print(&mut self, text: impl AsRef<str>) -> Result<(), HubError> {
        self.write_out(text.as_ref().as_bytes())
    }

    pub fn puts(&mut self, line: impl AsRef<str>) -> Result<(), HubError> {
        self.write_out(format!("{}\n", line.as_ref()).as_bytes())
    }

    pub fn finish(&mut self) -> Result<(), HubError> {
        if !self.closed {
            let res = self.out.flush();
            self.absorb(res)?;
        }
        if let Some(pager) = self.pager.take() {
            pager.wait()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::test_utils::{FakeContext, SharedBuf};

    #[test]
    fn selection_order() {
        assert_eq!(select_pager(Some("most"), Some("less -R"), Some("more")), PagerCommand::Program("most".into()));
        assert_eq!(select_pager(None, Some("less -R"), Some("more")), PagerCommand::Program("less -R".into()));
        assert_eq!(select_pager(None, None, Some("more")), PagerCommand::Program("more".into()));
        assert_eq!(select_pager(None, None, None), PagerCommand::Program(DEFAULT_PAGER.into()));
    }

    #[test]
    fn empty_value_disables_paging() {
        assert_eq!(select_pager(Some(""), Some("less"), None), PagerCommand::Passthrough);
        assert_eq!(select_pager(None, None, Some("  ")), PagerCommand::Passthrough);
        assert_eq!(select_pager(Some("cat"), None, None), PagerCommand::Passthrough);
    }

    #[test]
    fn non_terminal_output_is_untouched() {
        let cfg = Config::default();
        let ctx = FakeContext::default();
        let buf = SharedBuf::default();
        let mut console = Console::with_writer(buf.clone(), false, &cfg, &ctx);
        console.print("\x1b[1mbold\x1b[0m ").unwrap();
        console.puts("line").unwrap();
        console.print("no newline").unwrap();
        console.finish().unwrap();
        assert!(!console.is_paging());
        assert_eq!(buf.contents(), "\x1b[1mbold\x1b[0m line\nno newline");
    }

    #[test]
    fn terminal_with_empty_pager_writes_directly() {
        let cfg = Config { git_pager: Some(String::new()), ..Config::default() };
        let ctx = FakeContext::default();
        let buf = SharedBuf::default();
        let mut console = Console::with_writer(buf.clone(), true, &cfg, &ctx);
        console.puts("hub version 0.1.0").unwrap();
        assert!(!console.is_paging());
        console.finish().unwrap();
        assert_eq!(buf.contents(), "hub version 0.1.0\n");
    }

    #[test]
    fn disabled_console_never_pages() {
        let cfg = Config { git_pager: Some("less".into()), ..Config::default() };
        let ctx = FakeContext::default();
        let buf = SharedBuf::default();
        let mut console = Console::with_writer(buf.clone(), true, &cfg, &ctx);
        console.disable_pager();
        console.puts("usage: git").unwrap();
        assert!(!console.is_paging());
        assert_eq!(buf.contents(), "usage: git\n");
    }

    /// Feed `input` to a real forked consumer and collect what it wrote.
    fn page_through(command: &str, input: &[u8]) -> String {
        // One split at a time so no consumer inherits another's pipe.
        static SPLIT: Mutex<()> = Mutex::new(());
        let _guard = SPLIT.lock().unwrap_or_else(|p| p.into_inner());
        let out = tempfile::NamedTempFile::new().unwrap();
        let sink = OpenOptions::new().write(true).open("/dev/null").unwrap();
        let pager = Pager::spawn_into(command, vec![sink.as_raw_fd()], Some(out.as_file().as_raw_fd())).unwrap();
        fcntl(sink.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).unwrap();
        (&sink).write_all(input).unwrap();
        pager.wait().unwrap();
        std::fs::read_to_string(out.path()).unwrap()
    }

    #[test]
    fn pager_receives_output() {
        assert_eq!(page_through("tr a-z A-Z", b"hub version 0.1.0\n"), "HUB VERSION 0.1.0\n");
    }

    #[test]
    fn missing_pager_falls_back_to_cat() {
        assert_eq!(page_through("hub-no-such-pager-xyz", b"hub version 0.1.0\n"), "hub version 0.1.0\n");
        assert_eq!(page_through("hub-no-such-pager-xyz -R", b"line\n"), "line\n");
    }

    #[test]
    fn shell_syntax_runs_through_sh() {
        assert_eq!(page_through("tr a-z A-Z; echo done", b"hub\n"), "HUB\ndone\n");
    }

    #[test]
    fn no_output_never_launches_pager() {
        assert_eq!(page_through("echo launched", b""), "");
    }

    #[test]
    fn pager_gets_less_defaults() {
        let env = page_through("env", b"x");
        assert!(env.lines().any(|l| l.starts_with("LESS=")), "{env}");
    }

    #[test]
    fn attempts_end_with_cat() {
        let missing = attempts("hub-no-such-pager-xyz");
        assert_eq!(missing.len(), 1);
        assert!(missing[0][0].ends_with("cat"));

        let shell = attempts("less -R | head");
        assert_eq!(shell[0], ["/bin/sh", "-c", "less -R | head"]);
        assert_eq!(shell.len(), 2);

        let plain = attempts("tr a-z A-Z");
        assert!(plain[0][0].ends_with("/tr"));
        assert_eq!(plain[0][1..], ["a-z", "A-Z"]);
        assert!(plain[1][0].ends_with("cat"));
    }

    #[test]
    fn stderr_joins_pipe_only_on_terminal() {
        assert_eq!(redirect_targets(false), [libc::STDOUT_FILENO]);
        assert_eq!(redirect_targets(true), [libc::STDOUT_FILENO, libc::STDERR_FILENO]);
    }

    struct Failing(io::ErrorKind);

    impl Write for Failing {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> { Err(self.0.into()) }
        fn flush(&mut self) -> io::Result<()> { Err(self.0.into()) }
    }

    #[test]
    fn reader_hanging_up_ends_output_quietly() {
        let cfg = Config::default();
        let ctx = FakeContext::default();
        let mut console = Console::with_writer(Failing(io::ErrorKind::BrokenPipe), false, &cfg, &ctx);
        console.puts("hub version 0.1.0").unwrap();
        console.print("more").unwrap();
        console.finish().unwrap();
    }

    #[test]
    fn other_write_errors_propagate() {
        let cfg = Config::default();
        let ctx = FakeContext::default();
        let mut console = Console::with_writer(Failing(io::ErrorKind::PermissionDenied), false, &cfg, &ctx);
        assert!(matches!(console.puts("x"), Err(HubError::Io(_))));
    }
}
