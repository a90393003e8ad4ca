use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Every failure the multipart encoder can report.
///
/// Nothing is retried internally: each variant is surfaced to the caller at the
/// point where it happens.
#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("failed to gather entropy for boundary: {source}")]
    Entropy { source: rand::Error },

    #[error("invalid boundary: {reason}")]
    InvalidBoundary { reason: String },

    #[error("failed to open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to release resource of part {field:?}: {source}")]
    Release { field: String, source: io::Error },

    #[error("multipart body must be finalized before reading")]
    NotReady,

    #[error("cannot add part {field:?}, multipart body already finalized")]
    AlreadyFinalized { field: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("http error: {source}")]
    Http {
        #[from]
        source: http::Error,
    },
}

impl MultipartError {
    pub fn entropy(e: rand::Error) -> Self {
        Self::Entropy { source: e }
    }

    pub fn invalid_boundary<S: ToString>(str: S) -> Self {
        Self::InvalidBoundary { reason: str.to_string() }
    }

    pub fn open<P: AsRef<Path>>(path: P, e: io::Error) -> Self {
        Self::Open { path: path.as_ref().to_path_buf(), source: e }
    }

    pub fn release<S: ToString>(field: S, e: io::Error) -> Self {
        Self::Release { field: field.to_string(), source: e }
    }

    pub fn already_finalized<S: ToString>(field: S) -> Self {
        Self::AlreadyFinalized { field: field.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The [`io::ErrorKind`] this error maps to when surfaced through [`std::io::Read`].
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Open { source, .. } | Self::Release { source, .. } | Self::Io { source } => source.kind(),
            Self::InvalidBoundary { .. } => io::ErrorKind::InvalidInput,
            Self::Entropy { .. } | Self::NotReady | Self::AlreadyFinalized { .. } | Self::Http { .. } => {
                io::ErrorKind::Other
            }
        }
    }
}

impl From<MultipartError> for io::Error {
    fn from(e: MultipartError) -> Self {
        let kind = e.kind();
        match e {
            MultipartError::Io { source } => source,
            e => io::Error::new(kind, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_passthrough() {
        let e = MultipartError::io(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"));
        let io_error = io::Error::from(e);
        assert_eq!(io_error.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(io_error.to_string(), "short read");
        assert!(io_error.get_ref().is_some_and(|inner| inner.downcast_ref::<MultipartError>().is_none()));
    }

    #[test]
    fn test_release_keeps_kind() {
        let e = MultipartError::release("file", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(e.to_string(), "failed to release resource of part \"file\": denied");

        let io_error = io::Error::from(e);
        assert_eq!(io_error.kind(), io::ErrorKind::PermissionDenied);
        let inner = io_error.get_ref().and_then(|inner| inner.downcast_ref::<MultipartError>());
        assert!(matches!(inner, Some(MultipartError::Release { field, .. }) if field == "file"));
    }

    #[test]
    fn test_not_ready_message() {
        let io_error = io::Error::from(MultipartError::NotReady);
        assert_eq!(io_error.kind(), io::ErrorKind::Other);
        assert_eq!(io_error.to_string(), "multipart body must be finalized before reading");
    }
}
