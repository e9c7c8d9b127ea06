//! ldk-reminder
//!
//! Reminder evaluation for the Meridian and MKL channels.
//!
//! Rules:
//! - A channel fires only on the exact configured `HH:MM` minute of the
//!   shop's wall clock (Meridian additionally on configured weekdays).
//!   A skipped minute is not caught up.
//! - It fires only when at least one order qualifies and no snooze marker
//!   covers `now`.
//! - Dismissal persists nothing; the next matching tick fires again.
//! - A missing or malformed snooze marker means "not snoozed".
//!
//! Pure deterministic logic. No store access, no wall-clock reads: the
//! runtime supplies `now`, the wall clock and the candidate rows.

mod cue;
mod engine;
mod types;

pub use cue::notification_cue;
pub use engine::{
    active_snooze, evaluate_channel, is_stale, mkl_cutoff, qualifying_rows, snooze_until,
    trigger_matches,
};
pub use types::*;
