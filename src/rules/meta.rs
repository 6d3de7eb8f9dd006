//! Rules about hub itself: help, version and shell aliasing.

use std::sync::LazyLock;

use regex::Regex;

use super::Scope;
use crate::args::Args;
use crate::cmd::Flow;
use crate::config::VERSION;
use crate::error::HubError;

static ALL_FLAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--?a").unwrap());
static PAGINATE_FLAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{1,2}p").unwrap());

const SHELLS: [(&str, &str); 5] = [
    ("bash", "alias git=hub"),
    ("csh", "alias git hub"),
    ("fish", "alias git hub"),
    ("sh", "alias git=hub"),
    ("zsh", r#"function git(){hub "$@"}"#),
];

pub const HELP_TEXT: &str = "\
usage: git [--version] [--exec-path[=GIT_EXEC_PATH]] [--html-path]
    [-p|--paginate|--no-pager] [--bare] [--git-dir=GIT_DIR]
    [--work-tree=GIT_WORK_TREE] [--help] COMMAND [ARGS]

Basic Commands:
   init       Create an empty git repository or reinitialize an existing one
   add        Add new or modified files to the staging area
   rm         Remove files from the working directory and staging area
   mv         Move or rename a file, a directory, or a symlink
   status     Show the status of the working directory and staging area
   commit     Record changes to the repository

History Commands:
   log        Show the commit history log
   diff       Show changes between commits, commit and working tree, etc
   show       Show information about commits, tags or files

Branching Commands:
   branch     List, create, or delete branches
   checkout   Switch the active branch to another branch
   merge      Join two or more development histories (branches) together
   tag        Create, list, delete, sign or verify a tag object

Remote Commands:
   clone      Clone a remote repository into a new directory
   fetch      Download data, tags and branches from a remote repository
   pull       Fetch from and merge with another repository or a local branch
   push       Upload data, tags and branches to a remote repository
   remote     View and manage a set of remote repositories

Advanced commands:
   reset      Reset your staging area or working directory to another point
   rebase     Re-apply a series of patches in one branch onto another
   bisect     Find by binary search the change that introduced a bug
   grep       Print files with lines matching a pattern in your codebase

See 'git help COMMAND' for more information on a specific command.
";

fn alias_usage() -> String {
    let mut text = String::from(
        "usage: hub alias [-s] SHELL\n\n\
         You already have hub installed and available in your PATH,\n\
         but to get the full experience you'll want to alias it to\n\
         `git`.\n\n\
         To see how to accomplish this for your shell, run the alias\n\
         command again with the name of your shell.\n\n\
         Known shells:\n",
    );
    for (name, _) in SHELLS {
        text.push_str(&format!("  {name}\n"));
    }
    text.push_str("\nOptions:\n");
    text.push_str("  -s   Silent. Useful when using the output with eval, e.g.\n");
    text.push_str("       $ eval `hub alias -s bash`\n");
    text
}

// $ hub alias bash
// Run this in your shell to start using `hub` as `git`:
//   alias git=hub
pub fn alias(args: &mut Args, _scope: &Scope<'_>) -> Result<(), HubError> {
    let silent = args.remove("-s");
    let text = match args.get(1) {
        None => alias_usage(),
        Some(shell) => {
            let line = SHELLS
                .iter()
                .find(|(name, _)| *name == shell)
                .map(|(_, line)| *line)
                .ok_or_else(|| HubError::abort(format!("fatal: never heard of `{shell}'")))?;
            if silent {
                format!("{line}\n")
            } else {
                format!("Run this in your shell to start using `hub` as `git`:\n  {line}\n")
            }
        }
    };
    args.skip();
    args.after_fn(move |out| {
        out.print(text)?;
        Ok(Flow::Exit(0))
    });
    Ok(())
}

// $ hub version
// > git version
// (print hub version)
pub fn version(args: &mut Args, _scope: &Scope<'_>) -> Result<(), HubError> {
    args.after_fn(|out| {
        out.puts(format!("hub version {VERSION}"))?;
        Ok(Flow::Continue)
    });
    Ok(())
}

// $ hub help
// (print improved help text)
//
// $ hub help hub
// > man hub
pub fn help(args: &mut Args, _scope: &Scope<'_>) -> Result<(), HubError> {
    let topic = args.tokens().iter().skip(1).find(|t| !t.starts_with('-')).cloned();
    match topic.as_deref() {
        Some("hub") => {
            args.set_executable("man");
            args.replace_all(["hub"]);
        }
        None if !args.tokens().iter().any(|t| ALL_FLAG.is_match(t)) => {
            let paginate = args.tokens().iter().any(|t| PAGINATE_FLAG.is_match(t));
            args.skip();
            args.after_fn(move |out| {
                if !paginate {
                    out.disable_pager();
                }
                out.print(HELP_TEXT)?;
                Ok(Flow::Exit(0))
            });
        }
        _ => {}
    }
    Ok(())
}

// $ hub hub
// (same as `hub help hub`)
pub fn hub(args: &mut Args, scope: &Scope<'_>) -> Result<(), HubError> {
    args.set(0, "help");
    help(args, scope)
}
