//! hub: rewrite git command lines, then run them (and what they schedule).

pub mod error;
pub mod cmd;
pub mod args;
pub mod tmpl;
pub mod config;
pub mod context;
pub mod api;
pub mod rules;
pub mod resolve;
pub mod render;
pub mod exec;
pub mod pager;
pub mod prelude;
pub mod macros;

#[cfg(test)]
mod test_utils;

pub use error::HubError;
