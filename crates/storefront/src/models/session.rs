//! Session-related types.
//!
//! Types stored in the session for staff authentication state.

use serde::{Deserialize, Serialize};

use samara_core::{StaffRole, StaffUserId};

use super::StaffUser;

/// Session-stored staff identity.
///
/// Minimal data stored in the session to identify the logged-in staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStaff {
    pub id: StaffUserId,
    pub username: String,
    pub role: StaffRole,
}

impl From<&StaffUser> for CurrentStaff {
    fn from(user: &StaffUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";
}
