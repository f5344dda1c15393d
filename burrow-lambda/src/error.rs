use burrow_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("function name {0:?} must match [A-Za-z0-9_-]+")]
    InvalidName(String),

    #[error("handler {0:?} must be of the form \"pkg.func\"")]
    InvalidHandler(String),

    #[error("function {0:?} already exists")]
    AlreadyExists(String),

    #[error("function {0:?} not found")]
    NotFound(String),

    #[error("invocation payload of {actual} bytes exceeds the {limit}-byte limit")]
    RequestTooLarge { actual: usize, limit: usize },

    #[error("invocation timed out")]
    InvocationTimedOut,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unzip of function source failed: {0}")]
    Unzip(String),

    #[error(transparent)]
    Woof(#[from] burrow_woof::Error),

    #[error(transparent)]
    Worker(#[from] burrow_worker::Error),
}

impl From<Error> for ErrorKind {
    fn from(e: Error) -> Self {
        let msg = e.to_string();
        match e {
            Error::InvalidName(_) | Error::InvalidHandler(_) => ErrorKind::InvalidParameter(msg),
            Error::AlreadyExists(_) => ErrorKind::ResourceConflict(msg),
            Error::NotFound(_) => ErrorKind::ResourceNotFound(msg),
            Error::RequestTooLarge { .. } => ErrorKind::RequestTooLarge(msg),
            Error::InvocationTimedOut => ErrorKind::Timeout(msg),
            Error::Io(_) | Error::Json(_) | Error::Unzip(_) => ErrorKind::ServiceError(msg),
            Error::Woof(inner) => inner.into(),
            Error::Worker(inner) => inner.into(),
        }
    }
}
