//! Pipeline error types

use thiserror::Error;

/// Opaque underlying cause carried by a processing error
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for pipeline runs
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// The two ways a file run can fail
///
/// `NotFound` means the input could not be identified: the object store had
/// nothing for the name (or could not be reached at all). `Processing` means
/// the input was found but its content, or a downstream dependency, failed.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("File not found in object store: {file_name}")]
    NotFound { file_name: String },

    #[error("{message}")]
    Processing {
        message: String,
        #[source]
        source: BoxError,
    },
}

/// Exit code for a configuration failure at startup (EX_CONFIG)
pub const EXIT_CONFIG: u8 = 78;

impl ProcessError {
    pub fn not_found(file_name: impl Into<String>) -> Self {
        ProcessError::NotFound {
            file_name: file_name.into(),
        }
    }

    pub fn processing(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ProcessError::Processing {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcessError::NotFound { .. })
    }

    /// Process exit code reported by the binary
    pub fn exit_code(&self) -> u8 {
        match self {
            ProcessError::NotFound { .. } => 2,
            ProcessError::Processing { .. } => 1,
        }
    }
}
