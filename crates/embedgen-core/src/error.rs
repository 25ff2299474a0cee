//! Error types for the embedgen-core library.
//!
//! This module provides error handling using the `thiserror` crate, with
//! variants for validation, stream and artifact-parsing failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for embedgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all embedgen operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be written to its destination
    #[error("failed to write artifact '{path}': {source}")]
    FileWrite {
        /// Destination of the artifact
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The directory holding an artifact could not be created
    #[error("failed to create output directory '{path}': {source}")]
    DirectoryCreate {
        /// Directory that was to hold the artifact
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The input stream failed while chunks were being planned
    #[error("failed to read input stream at byte {offset}: {source}")]
    Read {
        /// Number of bytes successfully consumed before the failure
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Identifier is not usable as a variable name
    #[error("identifier not suitable as variable name: '{value}'")]
    InvalidIdentifier {
        /// The rejected identifier
        value: String,
    },

    /// Namespace is not a valid bare identifier
    #[error("invalid namespace: '{value}'")]
    InvalidNamespace {
        /// The rejected namespace
        value: String,
    },

    /// Chunk size leaves no room for payload bytes
    #[error("invalid chunk size {value}: must be at least 2")]
    InvalidChunkSize {
        /// The rejected chunk size
        value: usize,
    },

    /// Header path is absolute where a relative one is required
    #[error("header path '{path}' must be relative to the include directory")]
    AbsoluteHeaderPath {
        /// The offending path
        path: PathBuf,
    },

    /// Path traversal attempt detected
    #[error("path traversal detected: '{path}' would escape the include directory")]
    PathTraversal {
        /// The suspicious path
        path: PathBuf,
    },

    /// Escaped text does not follow the fixed octal format
    #[error("invalid escape sequence at offset {offset}: {details}")]
    InvalidEscape {
        /// Character offset of the malformed unit
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// A definition artifact could not be parsed or is inconsistent
    #[error("malformed definition artifact: {details}")]
    MalformedArtifact {
        /// Detailed description of the issue
        details: String,
    },

    /// Chunks reached the definition writer out of sequence
    #[error("chunk {found} arrived out of order, expected chunk {expected}")]
    ChunkOrder {
        /// Ordinal the writer was waiting for
        expected: usize,
        /// Ordinal of the chunk it was given
        found: usize,
    },

    /// A chunk sink rejected its input
    #[error("failed to emit artifact text: {0}")]
    Format(#[from] std::fmt::Error),

    /// Reconstructed data differs from the original input
    #[error("reconstructed data differs from input at byte {offset}")]
    RoundTripMismatch {
        /// First differing byte offset
        offset: usize,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new artifact write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new output directory error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new stream read error
    pub fn read(offset: u64, source: std::io::Error) -> Self {
        Self::Read { offset, source }
    }

    /// Creates a new path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Creates a new escape format error
    pub fn invalid_escape(offset: usize, details: impl Into<String>) -> Self {
        Self::InvalidEscape {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new malformed artifact error
    pub fn malformed_artifact(details: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            details: details.into(),
        }
    }

    /// Returns true if the error stems from caller-supplied configuration
    /// rather than from I/O or artifact content
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::InvalidNamespace { .. }
                | Self::InvalidChunkSize { .. }
                | Self::AbsoluteHeaderPath { .. }
                | Self::PathTraversal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::path_traversal("../outside.hpp");
        assert!(err.to_string().contains("path traversal"));
        assert!(err.to_string().contains("../outside.hpp"));

        let err = Error::InvalidChunkSize { value: 1 };
        assert_eq!(err.to_string(), "invalid chunk size 1: must be at least 2");

        let err = Error::ChunkOrder {
            expected: 2,
            found: 5,
        };
        assert_eq!(err.to_string(), "chunk 5 arrived out of order, expected chunk 2");
    }

    #[test]
    fn test_write_errors_keep_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::file_write("out/lorem.cpp", source);
        assert!(err.to_string().starts_with("failed to write artifact 'out/lorem.cpp'"));
        assert!(std::error::Error::source(&err).is_some());

        let source = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "file in the way");
        let err = Error::directory_create("out", source);
        assert!(
            matches!(err, Error::DirectoryCreate { ref path, .. } if path.as_os_str() == "out")
        );
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_is_usage_error() {
        assert!(Error::InvalidIdentifier {
            value: "1abc".into()
        }
        .is_usage_error());
        assert!(!Error::malformed_artifact("test").is_usage_error());
        assert!(!Error::RoundTripMismatch { offset: 3 }.is_usage_error());
    }
}
