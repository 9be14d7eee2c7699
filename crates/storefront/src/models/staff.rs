//! Staff accounts (dashboard admins and couriers).

use chrono::{DateTime, Utc};
use serde::Serialize;

use samara_core::{StaffRole, StaffUserId};

/// A staff account (domain type). The password hash never leaves the
/// repository layer except for verification.
#[derive(Debug, Clone, Serialize)]
pub struct StaffUser {
    pub id: StaffUserId,
    pub username: String,
    pub role: StaffRole,
    pub created_at: DateTime<Utc>,
}
