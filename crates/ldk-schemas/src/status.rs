//! Order status state machines.
//!
//! # Invariants
//!
//! - Every pair of states inside one status set is a legal transition,
//!   including self-transitions and moving "backwards" (Delivered ->
//!   NotOrdered). There is no guard graph.
//! - A transition always stamps the call-time `now`. The stamp is the only
//!   thing the reminder staleness rule reads.
//! - Creation is the initial transition: status = `INITIAL`, stamp = now.
//!
//! Pure logic. No IO, no wall-clock; callers pass `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Shared behaviour of the MKL and Meridian status sets.
pub trait LifecycleStatus: Copy + Eq + std::fmt::Debug + 'static {
    /// Status assigned on creation.
    const INITIAL: Self;

    /// Every member of the set, in display order.
    fn all() -> &'static [Self];

    /// Stable storage code.
    fn as_str(&self) -> &'static str;

    /// Human label as shown to shop staff.
    fn label(&self) -> &'static str;

    fn parse(s: &str) -> Result<Self, ValidationError> {
        let t = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(t) || st.label() == t)
            .ok_or_else(|| ValidationError::UnknownLabel {
                kind: "status",
                label: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MKL
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MklStatus {
    NotOrdered,
    Ordered,
    Called,
    Delivered,
}

impl LifecycleStatus for MklStatus {
    const INITIAL: Self = MklStatus::NotOrdered;

    fn all() -> &'static [Self] {
        &[
            MklStatus::NotOrdered,
            MklStatus::Ordered,
            MklStatus::Called,
            MklStatus::Delivered,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            MklStatus::NotOrdered => "NOT_ORDERED",
            MklStatus::Ordered => "ORDERED",
            MklStatus::Called => "CALLED",
            MklStatus::Delivered => "DELIVERED",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MklStatus::NotOrdered => "Не заказан",
            MklStatus::Ordered => "Заказан",
            MklStatus::Called => "Прозвонен",
            MklStatus::Delivered => "Вручен",
        }
    }
}

// ---------------------------------------------------------------------------
// Meridian
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeridianStatus {
    NotOrdered,
    Ordered,
}

impl LifecycleStatus for MeridianStatus {
    const INITIAL: Self = MeridianStatus::NotOrdered;

    fn all() -> &'static [Self] {
        &[MeridianStatus::NotOrdered, MeridianStatus::Ordered]
    }

    fn as_str(&self) -> &'static str {
        match self {
            MeridianStatus::NotOrdered => "NOT_ORDERED",
            MeridianStatus::Ordered => "ORDERED",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MeridianStatus::NotOrdered => "Не заказан",
            MeridianStatus::Ordered => "Заказан",
        }
    }
}

// ---------------------------------------------------------------------------
// Stamp
// ---------------------------------------------------------------------------

/// A status together with the instant it was last assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStamp<S> {
    pub status: S,
    pub changed_at: DateTime<Utc>,
}

impl<S: LifecycleStatus> StatusStamp<S> {
    /// Creation stamp: initial status at `now`.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            status: S::INITIAL,
            changed_at: now,
        }
    }

    /// Total transition function. Never refuses; always re-stamps.
    pub fn transition(&self, to: S, now: DateTime<Utc>) -> Self {
        Self {
            status: to,
            changed_at: now,
        }
    }
}
