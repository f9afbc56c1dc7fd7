#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A structurally invalid payload was rejected by a parser.
    #[error("malformed {kind} payload: {reason}")]
    Payload { kind: &'static str, reason: String },

    /// A frame carried a message id or name with no registered parser.
    #[error("unknown message: {0}")]
    UnknownMessage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn payload(kind: &'static str, reason: impl Into<String>) -> Self {
        Error::Payload {
            kind,
            reason: reason.into(),
        }
    }
}
