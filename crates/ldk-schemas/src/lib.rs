//! ldk-schemas
//!
//! Domain types shared by every LensDesk crate: catalogs, orders, items,
//! clients, product suggestions, reminder channels and the typed errors
//! callers branch on. No IO.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod errors;
mod status;

pub use errors::{NotFound, ValidationError};
pub use status::{LifecycleStatus, MeridianStatus, MklStatus, StatusStamp};

/// Label used wherever a product name is blank.
pub const UNNAMED_PRODUCT: &str = "(Без названия)";

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The two independent order books.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Catalog {
    Mkl,
    Meridian,
}

impl Catalog {
    pub fn as_str(&self) -> &'static str {
        match self {
            Catalog::Mkl => "MKL",
            Catalog::Meridian => "MERIDIAN",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_uppercase().as_str() {
            "MKL" => Ok(Catalog::Mkl),
            "MERIDIAN" => Ok(Catalog::Meridian),
            _ => Err(ValidationError::UnknownLabel {
                kind: "catalog",
                label: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Clients / products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub full_name: String,
    /// Canonical digits only.
    pub phone_digits: String,
}

/// Raw client form as typed by staff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInput {
    pub full_name: String,
    pub phone: String,
}

/// Validated client ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
    pub full_name: String,
    pub phone_digits: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    pub id: i64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// MKL orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MklOrder {
    pub id: i64,
    pub fio: String,
    pub phone_digits: String,
    pub product_name: String,
    pub sph: f64,
    pub cyl: Option<f64>,
    pub ax: Option<i32>,
    pub bc: Option<f64>,
    pub qty: i32,
    pub status: MklStatus,
    pub status_changed_at: DateTime<Utc>,
    pub comment: String,
}

impl MklOrder {
    pub fn stamp(&self) -> StatusStamp<MklStatus> {
        StatusStamp {
            status: self.status,
            changed_at: self.status_changed_at,
        }
    }
}

/// Raw MKL order form. Numeric fields are already numbers but not yet
/// clamped or snapped; `None` means the field was left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MklOrderInput {
    pub fio: String,
    pub phone: String,
    pub product_name: String,
    pub sph: Option<f64>,
    #[serde(default)]
    pub cyl: Option<f64>,
    #[serde(default)]
    pub ax: Option<i64>,
    #[serde(default)]
    pub bc: Option<f64>,
    pub qty: i64,
    #[serde(default)]
    pub comment: String,
}

/// Validated, normalized MKL order fields. Never carries status.
#[derive(Debug, Clone, PartialEq)]
pub struct MklOrderDraft {
    pub fio: String,
    pub phone_digits: String,
    pub product_name: String,
    pub sph: f64,
    pub cyl: Option<f64>,
    pub ax: Option<i32>,
    pub bc: Option<f64>,
    pub qty: i32,
    pub comment: String,
}

// ---------------------------------------------------------------------------
// Meridian orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeridianOrder {
    pub id: i64,
    pub title: String,
    pub status: MeridianStatus,
    pub status_changed_at: DateTime<Utc>,
}

impl MeridianOrder {
    pub fn stamp(&self) -> StatusStamp<MeridianStatus> {
        StatusStamp {
            status: self.status,
            changed_at: self.status_changed_at,
        }
    }
}

/// Header row as listed to staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeridianOrderSummary {
    #[serde(flatten)]
    pub order: MeridianOrder,
    pub item_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeridianItem {
    pub id: i64,
    pub order_id: i64,
    pub product_name: String,
    pub sph: Option<f64>,
    pub cyl: Option<f64>,
    pub ax: Option<i32>,
    pub diameter: Option<i32>,
    pub qty: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeridianItemInput {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub sph: Option<f64>,
    #[serde(default)]
    pub cyl: Option<f64>,
    #[serde(default)]
    pub ax: Option<i64>,
    #[serde(default)]
    pub diameter: Option<i64>,
    pub qty: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeridianItemDraft {
    pub product_name: String,
    pub sph: Option<f64>,
    pub cyl: Option<f64>,
    pub ax: Option<i32>,
    pub diameter: Option<i32>,
    pub qty: i32,
}

// ---------------------------------------------------------------------------
// Listing filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MklFilter {
    pub status: Option<MklStatus>,
    /// Case-insensitive substring over fio, phone digits and product.
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeridianFilter {
    pub status: Option<MeridianStatus>,
}

// ---------------------------------------------------------------------------
// Export rows
// ---------------------------------------------------------------------------

/// Catalog-specific trailing optical field of an export line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExportExtra {
    BaseCurve(f64),
    Diameter(i32),
}

/// One unfulfilled order (MKL) or item (Meridian) selected for export,
/// in selection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub product_name: String,
    pub sph: Option<f64>,
    pub cyl: Option<f64>,
    pub ax: Option<i32>,
    pub extra: Option<ExportExtra>,
    pub qty: i32,
}

// ---------------------------------------------------------------------------
// Reminder channels
// ---------------------------------------------------------------------------

/// One of the two independent reminder pipelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReminderChannel {
    Meridian,
    Mkl,
}

impl ReminderChannel {
    pub const ALL: [ReminderChannel; 2] = [ReminderChannel::Meridian, ReminderChannel::Mkl];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderChannel::Meridian => "MERIDIAN",
            ReminderChannel::Mkl => "MKL",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_uppercase().as_str() {
            "MERIDIAN" => Ok(ReminderChannel::Meridian),
            "MKL" => Ok(ReminderChannel::Mkl),
            _ => Err(ValidationError::UnknownLabel {
                kind: "channel",
                label: s.to_string(),
            }),
        }
    }

    /// Fixed key of the persisted snooze marker.
    pub fn snooze_key(&self) -> &'static str {
        match self {
            ReminderChannel::Meridian => "meridian_snooze_until",
            ReminderChannel::Mkl => "mkl_snooze_until",
        }
    }

    pub fn catalog(&self) -> Catalog {
        match self {
            ReminderChannel::Meridian => Catalog::Meridian,
            ReminderChannel::Mkl => Catalog::Mkl,
        }
    }

    /// Snooze durations offered in the reminder dialog.
    pub fn snooze_options(&self) -> &'static [SnoozeOption] {
        match self {
            ReminderChannel::Meridian => &[
                SnoozeOption { label: "15 min", minutes: 15 },
                SnoozeOption { label: "30 min", minutes: 30 },
            ],
            ReminderChannel::Mkl => &[
                SnoozeOption { label: "1 day", minutes: 60 * 24 },
                SnoozeOption { label: "3 days", minutes: 60 * 24 * 3 },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnoozeOption {
    pub label: &'static str,
    pub minutes: i64,
}

/// A qualifying order as surfaced in a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRow {
    pub order_id: i64,
    /// Meridian: order title. MKL: customer name.
    pub label: String,
    /// MKL: product name. Meridian: none.
    pub detail: Option<String>,
    /// Storage code of the status (always NOT_ORDERED today).
    pub status: String,
    pub status_changed_at: DateTime<Utc>,
}
