//! Authenticated caller identity.
//!
//! Produced by the (out-of-scope) authentication layer and consumed as-is:
//! an account id plus role flags. The engine never re-derives roles from the
//! user store.

use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// The identity attached to every inbound operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub id: UserId,
    pub is_admin: bool,
    pub is_driver: bool,
    pub is_rider: bool,
}

impl Caller {
    /// A caller holding only the rider role.
    pub const fn rider(id: UserId) -> Self {
        Self {
            id,
            is_admin: false,
            is_driver: false,
            is_rider: true,
        }
    }

    /// A caller holding only the driver role.
    pub const fn driver(id: UserId) -> Self {
        Self {
            id,
            is_admin: false,
            is_driver: true,
            is_rider: false,
        }
    }

    /// A caller holding only the admin role.
    pub const fn admin(id: UserId) -> Self {
        Self {
            id,
            is_admin: true,
            is_driver: false,
            is_rider: false,
        }
    }
}
