//! Domain entities, ports, and workflow services.
//!
//! Entities are immutable outside their validated constructors; the services
//! are the only writers. Ports describe the store, cache, and publish
//! contracts the engine consumes; adapters live under `crate::outbound`.

pub mod booking;
pub mod booking_coordinator;
pub mod cache_coordinator;
pub mod caller;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod notifications;
pub mod payment;
pub mod payment_settlement;
pub mod ports;
pub mod ride;
pub mod ride_lifecycle;
pub mod user;
pub mod user_directory;

pub use self::booking::{Booking, BookingDraft, BookingPatch, BookingStatus, PaymentState};
pub use self::booking_coordinator::{BookingCoordinator, CreateBookingOutcome, CreateBookingRequest};
pub use self::cache_coordinator::{CacheCoordinator, DEFAULT_CACHE_TTL};
pub use self::caller::Caller;
pub use self::driver::Driver;
pub use self::envelope::Envelope;
pub use self::error::{DomainError, ErrorCode};
pub use self::ids::{BookingId, DriverId, PaymentId, PaymentMethodId, RideId, UserId, VehicleId};
pub use self::notifications::NotificationDispatcher;
pub use self::payment::{Payment, PaymentDraft, PaymentPatch};
pub use self::payment_settlement::{CreatePaymentRequest, PaymentSettlement, SettlementReceipt};
pub use self::ride::{GeoPoint, Ride, RideDraft, RidePatch, RideStatus};
pub use self::ride_lifecycle::{CreateRideRequest, RideLifecycle};
pub use self::user::{User, UserPatch};
pub use self::user_directory::UserDirectory;
