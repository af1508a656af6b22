use crate::types::DrsError;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a client operation.
///
/// `Validation` and `Remote` never overlap: the first is raised locally on a
/// malformed payload, the second when the server or the transport fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }
}

/// Structural validation failure of a DRS payload. Never sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {entity} at `{}`: {kind}", display_path(.path))]
pub struct ValidationError {
    /// Entity being validated, e.g. `DrsObject`
    pub entity: &'static str,
    /// Path to the offending field, e.g. `contents[0].contents[2].name`
    pub path: String,
    pub kind: ValidationErrorKind,
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("required field is missing")]
    Missing,

    #[error("expected {expected}")]
    WrongType { expected: &'static str },

    /// Field does not decode into the model, e.g. an unknown access method
    /// type. Carries the decoder's message.
    #[error("{0}")]
    Decode(String),

    #[error("must not be empty")]
    Empty,

    #[error("`{0}` is not a portable filename ([A-Za-z0-9._-])")]
    InvalidName(String),

    #[error("`{value}` is not a valid URI: {reason}")]
    InvalidUri { value: String, reason: String },

    #[error("unknown field")]
    UnknownField,

    #[error("contents nested deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("a blob must carry at least one access method")]
    MissingAccessMethods,

    #[error("access method must carry an access_id or an access_url")]
    MissingAccessLocation,
}

/// Failure reported by the server or by the transport underneath it.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("server returned status {status}{}", describe(.error))]
    Status {
        status: u16,
        /// Error entity, when the server supplied a decodable one
        error: Option<DrsError>,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// HTTP status of the failed response; `None` for transport failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Transport(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DrsError> {
        match self {
            RemoteError::Status { error, .. } => error.as_ref(),
            RemoteError::Transport(_) => None,
        }
    }
}

fn describe(error: &Option<DrsError>) -> impl fmt::Display + '_ {
    struct Describe<'a>(Option<&'a str>);

    impl fmt::Display for Describe<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.0 {
                Some(msg) => write!(f, ": {}", msg),
                None => Ok(()),
            }
        }
    }

    Describe(error.as_ref().and_then(|e| e.msg.as_deref()))
}
