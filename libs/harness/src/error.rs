//! Error types for the benchmark harness.
//!
//! Fatal conditions (malformed vector files, schema rejection, dataset
//! pairing corruption) abort a run. Per-row conditions are recoverable: the
//! driver counts them and surfaces the totals in the final summary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading workloads and driving a backend.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Vector file cannot be decoded: unreadable, dimension header outside
    /// the sane bound, or a size that is not an exact multiple of the
    /// per-record stride. Fatal.
    #[error("malformed vector file {}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    /// The backend rejected collection or index creation. Fatal; no
    /// benchmark is meaningful without a valid schema.
    #[error("schema setup failed at {stage}: {reason}")]
    Schema { stage: &'static str, reason: String },

    /// A single insert or query command was rejected, or a result row could
    /// not be parsed as an identifier. Recoverable.
    #[error("row operation failed: {0}")]
    Row(String),

    /// Loaded data does not match the configured shape, or ground truth
    /// does not pair with the query set. Fatal; a mismatch here would
    /// silently invalidate every metric.
    #[error("{subject}: expected {expected}, got {actual}")]
    DimensionMismatch {
        subject: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Build a `Format` error for `path`.
    pub fn format(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
