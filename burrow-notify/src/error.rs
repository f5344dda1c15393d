use burrow_core::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported filter rule name {0:?}; only \"prefix\" is recognised")]
    UnsupportedFilterName(String),

    #[error("malformed notification configuration: {0}")]
    MalformedConfig(String),

    #[error(transparent)]
    Xml(#[from] quick_xml::de::DeError),

    #[error(transparent)]
    XmlWrite(#[from] quick_xml::se::SeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<Error> for ErrorKind {
    fn from(e: Error) -> Self {
        match e {
            Error::UnsupportedFilterName(_) | Error::MalformedConfig(_) | Error::Xml(_) => {
                ErrorKind::InvalidParameter(e.to_string())
            }
            Error::XmlWrite(_) | Error::Io(_) => ErrorKind::ServiceError(e.to_string()),
        }
    }
}
