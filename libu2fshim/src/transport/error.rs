pub use crate::proto::model::U2fError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlatformError {
    MalformedRequest,
    Busy,
    InvalidResult,
    ReadOnlyBinding,
}

impl std::error::Error for PlatformError {}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportError {
    ChannelClosed,
    PostFailed,
    InvalidEnvelope,
}

impl std::error::Error for TransportError {}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Transport(TransportError),
    Platform(PlatformError),
    U2f(U2fError),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::U2f(error) => write!(f, "U2f({})", error),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        Error::Transport(error)
    }
}

impl From<PlatformError> for Error {
    fn from(error: PlatformError) -> Self {
        Error::Platform(error)
    }
}

impl From<U2fError> for Error {
    fn from(error: U2fError) -> Self {
        Error::U2f(error)
    }
}
