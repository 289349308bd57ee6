//! Driver record.
//!
//! The engine only inspects this record; driver CRUD is an external
//! collaborator. The load-bearing field is `is_license_number_verified`: a
//! ride may only be created against a verified driver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DriverId, UserId, VehicleId};

/// A registered driver and the vehicle assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: DriverId,
    pub user_id: UserId,
    pub license_number: String,
    pub vehicle_id: VehicleId,
    pub rating: f64,
    pub rides_completed: i64,
    pub is_license_number_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
