use burrow_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("worker pool queue is closed")]
    QueueClosed,

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("handler returned an error: {0}")]
    Handler(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] serde_json::Error),

    #[error(transparent)]
    Woof(#[from] burrow_woof::Error),
}

impl From<Error> for ErrorKind {
    fn from(e: Error) -> Self {
        match e {
            Error::Timeout(ms) => ErrorKind::Timeout(format!("no result after {ms}ms")),
            other => ErrorKind::ServiceError(other.to_string()),
        }
    }
}
