use thiserror::Error;

/// Failure of one swap request.
///
/// `InvalidUsage` is the client's fault, `InternalError` is ours. The message of
/// either is returned verbatim to the caller, so it must never carry paths from
/// the working area.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("{0}")]
    InvalidUsage(String),

    #[error("{0}")]
    InternalError(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Which side of the contract a [`SwapError`] blames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Client,
    Server,
    Cancelled,
}

impl SwapError {
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        SwapError::InvalidUsage(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        SwapError::InternalError(message.into())
    }

    /// Wrap a failure of the PDF library that has no more specific context.
    pub fn merge_library(detail: impl std::fmt::Display) -> Self {
        SwapError::InternalError(format!("Error from merge library ({detail})"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SwapError::InvalidUsage(_) => ErrorKind::Client,
            SwapError::InternalError(_) => ErrorKind::Server,
            SwapError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

pub type SwapResult<T> = std::result::Result<T, SwapError>;
