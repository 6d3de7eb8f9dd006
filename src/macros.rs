//! Terse macros for everyday usage

/// Build a `CommandSpec` for an arbitrary program.
#[macro_export]
macro_rules! cmd {
    ($prog:expr $(, $arg:expr )* $(,)?) => {{
        $crate::cmd::CommandSpec {
            program: ::std::string::String::from($prog),
            args: ::std::vec![ $( ::std::string::ToString::to_string(&$arg) ),* ],
        }
    }};
}

/// Build a `CommandSpec` that runs git.
#[macro_export]
macro_rules! git {
    ( $( $arg:expr ),* $(,)? ) => {{
        $crate::cmd!($crate::config::GIT $(, $arg )*)
    }};
}

/// Build a `tmpl::Store` from `key => value` pairs.
#[macro_export]
macro_rules! vars {
    ( $( $k:expr => $v:expr ),* $(,)? ) => {{
        let mut __s = $crate::tmpl::Store::new();
        $( __s = __s.with($k, $v); )*
        __s
    }};
}

#[cfg(test)]
mod tests {
    use crate::cmd::CommandSpec;
    use crate::tmpl::VariableResolver;

    #[test]
    fn git_macro_stringifies_arguments() {
        let name = String::from("mislav");
        assert_eq!(git!("remote", "add", name, "url"), CommandSpec::git(["remote", "add", "mislav", "url"]));
        assert_eq!(git!(), CommandSpec::git(Vec::<String>::new()));
    }

    #[test]
    fn cmd_macro_takes_program() {
        assert_eq!(cmd!("man", "hub"), CommandSpec::new("man", ["hub"]));
    }

    #[test]
    fn vars_macro_builds_store() {
        let s = vars! { "user" => "mislav", "repo" => "hub" };
        assert_eq!(s.get("user").as_deref(), Some("mislav"));
        assert_eq!(s.get("missing"), None);
    }
}
