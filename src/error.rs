//! Error taxonomy for record editing
//!
//! Every fallible core operation returns [`RecordError`]. Persistence back-ends
//! speak `io::Result` and are folded into [`RecordError::Io`].

use crate::model::session::SurfaceId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the record editor core
#[derive(Debug, Error)]
pub enum RecordError {
    /// The source file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A line (on open) or an edited surface (on save) is not valid JSON
    #[error("Line {line} does not contain valid JSON: {reason}")]
    InvalidRecord { line: usize, reason: String },

    /// The target line is invalid relative to the file's effective line count
    #[error("Line index {requested} is out of bounds for a file with {effective} effective lines")]
    OutOfBounds { requested: usize, effective: usize },

    /// No session is bound to the given surface
    #[error("Not a tracked record surface: {0}")]
    UnknownSurface(SurfaceId),

    /// Generic filesystem or store failure
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RecordError {
    /// Build an `InvalidRecord` from a JSON parse failure
    pub(crate) fn invalid_record(line: usize, err: &serde_json::Error) -> Self {
        RecordError::InvalidRecord {
            line,
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecordError>;
