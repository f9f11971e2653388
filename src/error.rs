//! Error types for restitch library.

use std::io;
use thiserror::Error;

/// Result type alias for restitch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document reconstruction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An extraction backend failed for the whole document.
    ///
    /// Element-level problems are recovered locally and never surface
    /// here; this variant is reserved for a collaborator that cannot
    /// produce output at all.
    #[error("extraction backend failed for {file}")]
    Backend {
        /// Source file identifier the backend was invoked on.
        file: String,
        /// The underlying cause reported by the backend.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A table region could not be structurally analyzed.
    ///
    /// Raised inside the table post-processor and caught per element;
    /// the detection is passed through unprocessed.
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// Error during rendering (text flatten, JSON export).
    #[error("rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a backend failure with the file identifier it occurred on.
    pub fn backend(
        file: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Backend {
            file: file.into(),
            source: source.into(),
        }
    }
}
