//! Error types for the co-simulation channel.
//!
//! Every failure is returned to the caller as an [`Error`]; nothing in this
//! crate aborts the host process. Each variant maps to a stable negative
//! status code (see [`Error::code`]) for callers that speak integers.

use std::io;

use thiserror::Error;

/// Result type alias for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Status code returned by the integer surface on success.
pub const STATUS_OK: i32 = 0;

/// Why a transport operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TransportFailure {
    /// The peer closed or reset the connection.
    Disconnected,
    /// Nobody was listening at the endpoint.
    Refused,
    /// A configured socket deadline expired.
    TimedOut,
    /// Any other transport failure.
    Other,
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportFailure::Disconnected => write!(f, "disconnected"),
            TransportFailure::Refused => write!(f, "refused"),
            TransportFailure::TimedOut => write!(f, "timed out"),
            TransportFailure::Other => write!(f, "failed"),
        }
    }
}

/// Errors that can occur during channel operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// `open` was called on a channel that is already open.
    #[error("Channel is already open")]
    AlreadyOpen,

    /// `send`/`recv` was called on a closed channel.
    #[error("Channel is not connected")]
    NotConnected,

    /// A caller-supplied argument was rejected before any I/O happened.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying stream failed.
    #[error("Transport {kind}: {message}")]
    Transport {
        /// Failure category.
        kind: TransportFailure,
        /// Description from the operating system.
        message: String,
    },

    /// The socket could not be created or bound.
    #[error("Resource error: {0}")]
    Resource(String),

    /// The peer sent something the command protocol does not understand.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A framed message exceeds the configured maximum.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual message size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

impl Error {
    /// Create a transport error of the given kind.
    pub fn transport(kind: TransportFailure, message: impl Into<String>) -> Self {
        Error::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a peer disconnection.
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::transport(TransportFailure::Disconnected, message)
    }

    /// Stable negative status code for this error.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Error::NotConnected => -1,
            Error::AlreadyOpen => -2,
            Error::Transport { .. } => -3,
            Error::InvalidArgument(_) => -4,
            Error::Resource(_) => -5,
            Error::Protocol(_) => -6,
            Error::MessageTooLarge { .. } => -7,
        }
    }

    /// Check if this error means the peer is gone.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::Transport {
                kind: TransportFailure::Disconnected,
                ..
            }
        )
    }

    /// Classify an error raised while establishing a connection.
    ///
    /// Allocation, permission and address conflicts are resource errors;
    /// everything else is a transport error.
    pub(crate) fn from_open(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::AddrInUse
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::OutOfMemory => Error::Resource(err.to_string()),
            _ if is_descriptor_exhaustion(&err) => Error::Resource(err.to_string()),
            _ => err.into(),
        }
    }
}

// ENFILE / EMFILE
#[cfg(unix)]
fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(23 | 24))
}

#[cfg(not(unix))]
fn is_descriptor_exhaustion(_err: &io::Error) -> bool {
    false
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::WriteZero => TransportFailure::Disconnected,
            io::ErrorKind::ConnectionRefused => TransportFailure::Refused,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportFailure::TimedOut,
            _ => TransportFailure::Other,
        };
        Error::transport(kind, err.to_string())
    }
}

/// Collapse a unit result into a status code.
#[must_use]
pub fn status(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => e.code(),
    }
}

/// Collapse a byte-count result into a status code.
///
/// Counts that do not fit in an `i32` saturate.
#[must_use]
pub fn count_status(result: &Result<usize>) -> i32 {
    match result {
        Ok(n) => i32::try_from(*n).unwrap_or(i32::MAX),
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MessageTooLarge {
            size: 2_000_000,
            max: 1_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Message too large: 2000000 bytes (max: 1000000)"
        );
        assert_eq!(
            Error::disconnected("peer left").to_string(),
            "Transport disconnected: peer left"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe broken");
        let err: Error = io_err.into();
        assert!(err.is_disconnect());

        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Transport {
                kind: TransportFailure::Refused,
                ..
            }
        ));

        let io_err = io::Error::new(io::ErrorKind::WouldBlock, "deadline");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Transport {
                kind: TransportFailure::TimedOut,
                ..
            }
        ));
    }

    #[test]
    fn test_error_from_open() {
        let err = Error::from_open(io::Error::new(io::ErrorKind::AddrInUse, "in use"));
        assert!(matches!(err, Error::Resource(_)));

        #[cfg(unix)]
        {
            let err = Error::from_open(io::Error::from_raw_os_error(24));
            assert!(matches!(err, Error::Resource(_)));
        }

        let err = Error::from_open(io::Error::new(io::ErrorKind::ConnectionRefused, "no"));
        assert_eq!(err.code(), -3);
    }

    #[test]
    fn test_codes_are_stable_and_distinct() {
        let errors = [
            Error::NotConnected,
            Error::AlreadyOpen,
            Error::disconnected("x"),
            Error::InvalidArgument("x".into()),
            Error::Resource("x".into()),
            Error::Protocol("x".into()),
            Error::MessageTooLarge { size: 2, max: 1 },
        ];
        let codes: Vec<i32> = errors.iter().map(Error::code).collect();
        assert_eq!(codes, vec![-1, -2, -3, -4, -5, -6, -7]);
    }

    #[test]
    fn test_status_helpers() {
        assert_eq!(status(&Ok(())), STATUS_OK);
        assert_eq!(status(&Err(Error::AlreadyOpen)), -2);
        assert_eq!(count_status(&Ok(4)), 4);
        assert_eq!(count_status(&Ok(0)), 0);
        assert_eq!(count_status(&Err(Error::NotConnected)), -1);
        assert_eq!(count_status(&Ok(usize::MAX)), i32::MAX);
    }

    #[test]
    fn test_error_clone() {
        let err = Error::NotConnected;
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
