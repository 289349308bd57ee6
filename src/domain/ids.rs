//! Typed identifiers for the engine's aggregates.
//!
//! Each aggregate gets its own UUID newtype so a booking id cannot be handed
//! to a ride lookup by accident. Serialisation is transparent: the wire
//! carries the bare UUID string.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identifies a ride.
    RideId
);
define_id!(
    /// Identifies a booking.
    BookingId
);
define_id!(
    /// Identifies a payment.
    PaymentId
);
define_id!(
    /// Identifies a driver record.
    DriverId
);
define_id!(
    /// Identifies a user (rider, driver, or admin account).
    UserId
);
define_id!(
    /// Identifies a vehicle; the engine only carries the reference.
    VehicleId
);
define_id!(
    /// Identifies a payment method; the engine only carries the reference.
    PaymentMethodId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialise_as_bare_uuid_strings() {
        let id = RideId::from_uuid(Uuid::nil());
        let encoded = serde_json::to_string(&id).expect("id serialises");
        assert_eq!(encoded, "\"00000000-0000-0000-0000-000000000000\"");

        let decoded: RideId = serde_json::from_str(&encoded).expect("id deserialises");
        assert_eq!(decoded, id);
    }

    #[test]
    fn random_ids_are_distinct() {
        assert_ne!(BookingId::random(), BookingId::random());
    }
}
