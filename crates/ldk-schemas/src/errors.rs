//! Typed failures that callers are expected to branch on.
//!
//! Everything else (SQL, I/O) travels as plain `anyhow::Error` context
//! chains. These two types are wrapped inside `anyhow::Error` as well and
//! recovered with `downcast_ref` at the boundary (daemon / CLI).

use thiserror::Error;

/// Input rejected before any mutation happened. Never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field `{0}` is required")]
    MissingField(&'static str),

    #[error("field `{field}` is not a number: {input:?}")]
    Unparseable { field: &'static str, input: String },

    #[error("field `{0}` must be a finite number")]
    NonFinite(&'static str),

    #[error("unknown {kind} label: {label:?}")]
    UnknownLabel { kind: &'static str, label: String },

    #[error("snooze duration must be positive, got {minutes} minute(s)")]
    NonPositiveSnooze { minutes: i64 },

    #[error("snooze duration of {minutes} minute(s) is out of range")]
    SnoozeOutOfRange { minutes: i64 },

    #[error("trigger time must be HH:MM, got {0:?}")]
    BadTriggerTime(String),
}

/// A read or mutation addressed a row that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} {id} not found")]
pub struct NotFound {
    pub entity: &'static str,
    pub id: i64,
}

impl NotFound {
    pub fn new(entity: &'static str, id: i64) -> Self {
        Self { entity, id }
    }
}
