use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    /// A rule refused to continue; the message is shown as-is.
    #[error("{0}")]
    Abort(String),
    #[error("{program}: {source}")]
    ExecError {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    ApiError(String),
    #[error("Resolve error: {0}")]
    ResolveError(String),
    #[error("Render error: {0}")]
    RenderError(String),
    #[error("Pager error: {0}")]
    PagerError(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl HubError {
    pub fn abort(msg: impl Into<String>) -> Self {
        HubError::Abort(msg.into())
    }

    /// Exit status reported to the invoking shell.
    pub fn exit_code(&self) -> i32 {
        match self {
            HubError::ExecError { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
            HubError::ExecError { .. } => 126,
            _ => 1,
        }
    }
}
