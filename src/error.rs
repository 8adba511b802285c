//! Error taxonomy for artifact transfers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while planning or applying an artifact transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A caller-supplied include/exclude pattern was rejected before any
    /// rules were built.
    #[error("artifact '{artifact}': invalid path pattern '{pattern}': {reason}")]
    InvalidPattern {
        artifact: String,
        pattern: String,
        reason: &'static str,
    },

    /// Working directory or destination is not an absolute path.
    #[error("artifact '{artifact}': {field} '{}' must be an absolute path", .path.display())]
    InvalidPath {
        artifact: String,
        field: &'static str,
        path: PathBuf,
    },

    /// The copy tool (or whatever runs it) exited unsuccessfully. Never retried.
    #[error("transfer in build unit '{unit}' failed with {status}: {output}")]
    ExecutionFailure {
        unit: String,
        status: String,
        output: String,
    },

    /// Hop 2 was about to be appended without its staging volume registered.
    #[error(
        "artifact '{name}': staging mount for '{}' is not registered on the destination step",
        .container_path.display()
    )]
    MissingStagingMount {
        name: String,
        container_path: PathBuf,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransferError>;
