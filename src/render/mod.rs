//! Rendering command specs as POSIX shell lines.

use crate::cmd::CommandSpec;
use crate::error::HubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotePolicy {
    /// Quote every argument.
    Strict,
    /// Quote only arguments a shell would split or expand.
    Loose,
}

pub trait Renderer {
    fn render_cmd(&self, cmd: &CommandSpec) -> Result<String, HubError>;
    fn render_all(&self, cmds: &[CommandSpec]) -> Result<Vec<String>, HubError> {
        cmds.iter().map(|c| self.render_cmd(c)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PosixRenderer { pub quote: QuotePolicy }

impl Default for PosixRenderer { fn default() -> Self { Self { quote: QuotePolicy::Strict } } }

impl PosixRenderer {
    pub fn loose() -> Self { Self { quote: QuotePolicy::Loose } }

    fn quote_arg(&self, s: &str) -> String {
        match self.quote {
            QuotePolicy::Strict => quote_sh(s),
            QuotePolicy::Loose if is_simple_word(s) => s.to_string(),
            QuotePolicy::Loose => quote_sh(s),
        }
    }
}

impl Renderer for PosixRenderer {
    fn render_cmd(&self, cmd: &CommandSpec) -> Result<String, HubError> {
        if cmd.program.is_empty() {
            return Err(HubError::RenderError("program empty".into()));
        }
        let mut parts = vec![quote_prog(&cmd.program)];
        parts.extend(cmd.args.iter().map(|a| self.quote_arg(a)));
        Ok(parts.join(" "))
    }
}

fn quote_prog(p: &str) -> String {
    if is_simple_word(p) { p.to_string() } else { quote_sh(p) }
}

fn is_simple_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| matches!(c,
        'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' | '/' | ':' | '+' | '%' | '@' | '=' | ','))
}

fn quote_sh(s: &str) -> String {
    if s.is_empty() { return "''".to_string(); }
    let escaped = s.replace('\'', "'\"'\"'");
    format!("'{}'", escaped)
}
