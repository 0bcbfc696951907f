//! Error types for compare-view
//!
//! Every failure is local to one file or one candidate. Nothing here is
//! fatal to the session: callers log, flag, or skip and carry on.

use std::path::PathBuf;

use thiserror::Error;

use crate::state::data::{CandidateId, SensitivityMode};

/// compare-view error type
#[derive(Error, Debug)]
pub enum CompareError {
    /// An input file could not be interpreted as an image
    #[error("cannot decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// Reading an input or settings file failed
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The diff primitive failed for one (candidate, mode) pair
    #[error("diff failed for candidate {candidate} in {mode} mode: {reason}")]
    DiffComputation {
        candidate: CandidateId,
        mode: SensitivityMode,
        reason: String,
    },

    /// An operation referenced a candidate that is no longer present
    #[error("candidate {0} is no longer in the list")]
    InvalidSelection(CandidateId),

    /// Settings file exists but is not valid JSON for [`crate::config::Settings`]
    #[error("invalid settings: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for compare-view operations
pub type Result<T> = std::result::Result<T, CompareError>;
