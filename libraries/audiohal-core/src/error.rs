/// Core error types for the stream adapters
use thiserror::Error;

use crate::status::{self, Status};

/// Result type alias using `HalError`
pub type Result<T> = std::result::Result<T, HalError>;

/// Error reported by a stream or device adapter
///
/// Every variant carries the raw driver status it was built from, so callers
/// that need the exact code can recover it with [`HalError::status`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The driver does not implement the operation
    #[error("Operation not supported by driver (status {0})")]
    Unsupported(Status),

    /// The operation is illegal in the driver's current state
    #[error("Operation invalid in current stream state (status {0})")]
    InvalidState(Status),

    /// Transport or hardware failure during a transfer
    #[error("Driver I/O failure (status {0})")]
    Io(Status),

    /// The driver rejected an argument
    #[error("Invalid argument (status {0})")]
    InvalidArgument(Status),

    /// Driver status outside the known vocabulary
    #[error("Unknown driver error (status {0})")]
    Unknown(Status),
}

impl HalError {
    /// Classify a raw driver status. Returns `None` for [`status::OK`].
    pub fn from_status(code: Status) -> Option<Self> {
        let err = match code {
            status::OK => return None,
            status::INVALID_OPERATION | status::NOT_SUPPORTED => Self::Unsupported(code),
            status::NO_INIT | status::BUSY | status::ALREADY => Self::InvalidState(code),
            status::IO_ERROR | status::DEAD_OBJECT => Self::Io(code),
            status::BAD_VALUE => Self::InvalidArgument(code),
            _ => Self::Unknown(code),
        };
        Some(err)
    }

    /// Create an unsupported-operation error
    pub fn unsupported() -> Self {
        Self::Unsupported(status::INVALID_OPERATION)
    }

    /// The raw driver status behind this error
    pub fn status(&self) -> Status {
        match *self {
            Self::Unsupported(code)
            | Self::InvalidState(code)
            | Self::Io(code)
            | Self::InvalidArgument(code)
            | Self::Unknown(code) => code,
        }
    }

    /// Whether the driver reported the operation as not implemented
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_not_an_error() {
        assert_eq!(HalError::from_status(status::OK), None);
    }

    #[test]
    fn taxonomy() {
        assert_eq!(
            HalError::from_status(status::NOT_SUPPORTED),
            Some(HalError::Unsupported(status::NOT_SUPPORTED))
        );
        assert_eq!(
            HalError::from_status(status::ALREADY),
            Some(HalError::InvalidState(status::ALREADY))
        );
        assert_eq!(
            HalError::from_status(status::DEAD_OBJECT),
            Some(HalError::Io(status::DEAD_OBJECT))
        );
        assert_eq!(
            HalError::from_status(status::BAD_VALUE),
            Some(HalError::InvalidArgument(status::BAD_VALUE))
        );
        assert_eq!(HalError::from_status(-7), Some(HalError::Unknown(-7)));
    }

    #[test]
    fn unsupported_helper() {
        let err = HalError::unsupported();
        assert!(err.is_unsupported());
        assert_eq!(err.status(), status::INVALID_OPERATION);
    }

    #[test]
    fn display_includes_status() {
        let msg = HalError::Io(status::IO_ERROR).to_string();
        assert!(msg.contains("-5"), "message was {msg}");
    }
}
