use std::io;

use thiserror::Error;

/// Portable status taxonomy shared by every transport backend.
///
/// Native operating-system failures are folded into these variants through
/// a fixed mapping; anything without a dedicated variant becomes [`Error::Io`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid arguments")]
    InvalidArguments,

    #[error("out of memory")]
    OutOfMemory,

    #[error("no such device")]
    NoDevice,

    #[error("access denied")]
    NoAccess,

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// A transfer did not complete within its time bound. The partial byte
    /// count is meaningful and always reported.
    #[error("timed out after {actual} byte(s)")]
    Timeout { actual: usize },

    /// The backend does not implement the requested operation.
    #[error("unsupported operation")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NoDevice,
            io::ErrorKind::PermissionDenied => Error::NoAccess,
            io::ErrorKind::InvalidInput => Error::InvalidArguments,
            io::ErrorKind::OutOfMemory => Error::OutOfMemory,
            io::ErrorKind::TimedOut => Error::Timeout { actual: 0 },
            _ => Error::Io(err),
        }
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Error::NoDevice,
            serialport::ErrorKind::InvalidInput => Error::InvalidArguments,
            serialport::ErrorKind::Io(kind) => io::Error::new(kind, err.description).into(),
            serialport::ErrorKind::Unknown => {
                Error::Io(io::Error::new(io::ErrorKind::Other, err.description))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_errors_map_to_portable_statuses() {
        assert!(matches!(
            Error::from(io::Error::from(io::ErrorKind::NotFound)),
            Error::NoDevice
        ));
        assert!(matches!(
            Error::from(io::Error::from(io::ErrorKind::PermissionDenied)),
            Error::NoAccess
        ));
        assert!(matches!(
            Error::from(io::Error::from(io::ErrorKind::InvalidInput)),
            Error::InvalidArguments
        ));
        assert!(matches!(
            Error::from(io::Error::from(io::ErrorKind::TimedOut)),
            Error::Timeout { actual: 0 }
        ));
        // Anything unmapped degrades to a generic I/O failure.
        assert!(matches!(
            Error::from(io::Error::from(io::ErrorKind::BrokenPipe)),
            Error::Io(_)
        ));
    }

    #[test]
    fn serial_errors_map_through_the_same_table() {
        let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "unplugged");
        assert!(matches!(Error::from(err), Error::NoDevice));

        let err = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
            "denied",
        );
        assert!(matches!(Error::from(err), Error::NoAccess));

        let err = serialport::Error::new(serialport::ErrorKind::Unknown, "???");
        assert!(matches!(Error::from(err), Error::Io(_)));
    }
}
