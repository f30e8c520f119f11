//! Request bodies sent to the admin and public APIs.

use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Create/update body for `/admin/cnc/machines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachinePayload {
    pub name: String,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpindlePayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPayload {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitPayload {
    pub name: String,
    pub bit_dia_for_calc: f64,
    pub stepover_ratio: f64,
}

/// Full setting record as sent on create and on full replace.
/// `warning` is serialized as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingPayload {
    pub spindle_id: EntityId,
    pub bit_id: EntityId,
    pub material_id: EntityId,
    pub rpm: f64,
    pub feed: f64,
    pub doc: f64,
    pub stepover: f64,
    pub plunge: f64,
    pub warning: Option<String>,
}

/// Grant the admin role to the account with this email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAdminRequest {
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Revoke the admin role; identity is the email, not the row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveAdminRequest {
    pub email: String,
}

// Public site

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsletterSignup {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Machine/spindle/bit/material picked on the calculator, plus the user's multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSettingsRequest {
    pub machine: String,
    pub spindle: String,
    pub bit: String,
    pub material: String,
    pub multiplier: f64,
}
