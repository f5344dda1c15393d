use burrow_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("woof {0:?} not found")]
    NotFound(String),

    #[error("woof {0:?} already exists")]
    AlreadyExists(String),

    #[error("payload of {len} bytes exceeds record size {record_size} for woof {name:?}")]
    PayloadTooLarge {
        name: String,
        len: usize,
        record_size: usize,
    },

    #[error("corrupt woof {0:?}: {1}")]
    Corrupt(String, String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

impl From<Error> for ErrorKind {
    fn from(e: Error) -> Self {
        let msg = e.to_string();
        match e {
            Error::NotFound(n) => ErrorKind::ResourceNotFound(format!("woof {n:?}")),
            Error::AlreadyExists(n) => ErrorKind::ResourceConflict(format!("woof {n:?}")),
            Error::PayloadTooLarge { .. } => ErrorKind::RequestTooLarge(msg),
            Error::Corrupt(..) | Error::Io(_) | Error::Join(_) => ErrorKind::ServiceError(msg),
        }
    }
}
