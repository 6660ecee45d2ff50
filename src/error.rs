use thiserror::Error;

use crate::models::ProjectId;

/// Errors raised by the tracker core, the store and the exporters
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The stored collection could not be parsed
    #[error("stored value under key `{key}` is corrupt: {source}")]
    CorruptStore {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record or user input failed validation
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A display position past the end of the collection
    #[error("index {index} is out of range (collection has {len} projects)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no project with id {0}")]
    UnknownProject(ProjectId),

    /// An external helper needed for an export is missing or failed
    #[error("{name} is unavailable: {reason}")]
    DependencyUnavailable { name: String, reason: String },

    #[error("store I/O failed: {0}")]
    Store(#[from] std::io::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
