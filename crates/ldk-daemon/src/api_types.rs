//! Request and response bodies for the HTTP API that are not domain types
//! themselves. No business logic lives here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// "validation" | "not_found" | "internal"
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    /// Storage code (`ORDERED`) or the staff-facing label.
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}
