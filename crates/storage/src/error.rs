use thiserror::Error;

use chronologicon_core::EventId;

/// Failures surfaced by an [`EventStore`](crate::EventStore).
///
/// Duplicate ids are not an error: inserts are insert-if-absent.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("event '{event_id}' rejected: {reason}")]
    Rejected { event_id: EventId, reason: String },

    #[error("{0}")]
    Other(String),
}
