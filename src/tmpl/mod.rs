//! `${var}` templates for URL patterns and variable lookup.

use std::collections::HashMap;

use crate::error::HubError;

#[derive(Debug, Clone, Default)]
pub struct Template(pub Vec<Segment>);

#[derive(Debug, Clone)]
pub enum Segment {
    Lit(String),
    Var(String),
}

pub trait VariableResolver {
    fn get(&self, key: &str) -> Option<String>;
}

/// Resolves from the process environment.
#[derive(Clone, Default)]
pub struct Env;
impl VariableResolver for Env {
    fn get(&self, key: &str) -> Option<String> { std::env::var(key).ok() }
}

#[derive(Clone, Default)]
pub struct Store { m: HashMap<String, String> }
impl Store {
    pub fn new() -> Self { Self::default() }
    pub fn with(mut self, k: &str, v: impl Into<String>) -> Self { self.m.insert(k.into(), v.into()); self }
}
impl VariableResolver for Store {
    fn get(&self, key: &str) -> Option<String> { self.m.get(key).cloned() }
}

impl Template {
    /// Parse a string containing `${VAR}` expansions.
    /// `$$` emits a single `$`; a lone `$` is literal.
    /// Errors on `${` with no closing `}` or an invalid name.
    pub fn parse(input: &str) -> Result<Self, HubError> {
        let mut segs: Vec<Segment> = Vec::new();
        let mut lit = String::new();
        let mut chars = input.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            if ch != '$' {
                lit.push(ch);
                continue;
            }
            match chars.peek() {
                Some((_, '$')) => {
                    chars.next();
                    lit.push('$');
                }
                Some((_, '{')) => {
                    chars.next();
                    let start = i + 2;
                    let end = input[start..]
                        .find('}')
                        .map(|off| start + off)
                        .ok_or_else(|| HubError::ResolveError("Unclosed ${ in template".into()))?;
                    let var = &input[start..end];
                    if var.is_empty() || !var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                        return Err(HubError::ResolveError(format!("Invalid var name: {}", var)));
                    }
                    if !lit.is_empty() {
                        segs.push(Segment::Lit(std::mem::take(&mut lit)));
                    }
                    segs.push(Segment::Var(var.to_string()));
                    while let Some((j, _)) = chars.next() {
                        if j == end { break; }
                    }
                }
                _ => lit.push('$'),
            }
        }
        if !lit.is_empty() { segs.push(Segment::Lit(lit)); }
        Ok(Template(segs))
    }

    /// Missing variables render as empty strings.
    pub fn render<V: VariableResolver + ?Sized>(&self, vars: &V) -> String {
        let mut out = String::new();
        for seg in &self.0 {
            match seg {
                Segment::Lit(s) => out.push_str(s),
                Segment::Var(k) => out.push_str(&vars.get(k).unwrap_or_default()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("git://github.com/").unwrap();
        assert!(matches!(&t.0[0], Segment::Lit(s) if s == "git://github.com/"));
        assert_eq!(t.0.len(), 1);
    }

    #[test]
    fn render_with_store() {
        let t = Template::parse("git@${host}:${user}/${repo}.git").unwrap();
        let vars = Store::new().with("host", "github.com").with("user", "defunkt").with("repo", "hub");
        assert_eq!(t.render(&vars), "git@github.com:defunkt/hub.git");
    }

    #[test]
    fn missing_vars_render_empty() {
        let t = Template::parse("/${path}!").unwrap();
        assert_eq!(t.render(&Store::new()), "/!");
    }

    #[test]
    fn dollar_escape_and_lone_dollar() {
        let t = Template::parse("price: $$100 or $5").unwrap();
        assert_eq!(t.render(&Store::new()), "price: $100 or $5");
    }

    #[test]
    fn unclosed_and_invalid_names_error() {
        assert!(matches!(Template::parse("${OPEN"), Err(HubError::ResolveError(_))));
        assert!(matches!(Template::parse("${a b}"), Err(HubError::ResolveError(_))));
        assert!(matches!(Template::parse("${}"), Err(HubError::ResolveError(_))));
    }
}
