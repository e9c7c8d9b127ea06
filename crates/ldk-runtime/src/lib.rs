//! ldk-runtime
//!
//! The `Desk`: the single entry point the UI collaborator, the daemon tick
//! and the CLI go through. Every store access and every reminder evaluation
//! runs under one async gate, so a reminder can never be computed from
//! state that a concurrent mutation is halfway through changing.

mod clock;
mod desk;
mod reminders;

pub use clock::{Clock, ManualClock, SystemClock};
pub use desk::{ClientView, Desk};
pub use reminders::{ChannelCheck, ResponseOutcome};
