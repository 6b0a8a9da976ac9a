use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by the collection stores.
///
/// Lookups of absent records are *not* errors — `get_by_id` returns
/// `Option` — and duplicate ids are not actively detected (ids carry a
/// 128-bit random token).
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure while loading or persisting a collection document.
    /// Propagated to the caller without retry; the previously durable
    /// document is left unchanged.
    #[error("storage unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing document exists but is not a well-formed collection.
    #[error("malformed collection document at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The per-user aggregate update failed *after* the triggering dream
    /// entry was durably appended.  The dream entry stands; the caller
    /// learns the aggregate lagged behind it.
    #[error("stats aggregation failed for dream {dream_id}: {source}")]
    StatsAggregation {
        dream_id: String,
        #[source]
        source: Box<StoreError>,
    },
}
