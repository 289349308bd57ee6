//! Driven ports: the store, cache, and publish contracts the engine
//! consumes. Adapters live under `crate::outbound`.
//!
//! Each port carries its own error enum so adapters never leak their
//! transport types into the domain; services fold port errors into
//! [`crate::domain::DomainError`].

pub mod booking_repository;
pub mod cache;
pub mod driver_repository;
pub mod notifier;
pub mod payment_repository;
pub mod ride_repository;
pub mod user_repository;

pub use self::booking_repository::{BookingRepository, BookingRepositoryError};
pub use self::cache::{Cache, CacheError, CacheKey, CacheKeyValidationError, NoopCache};
pub use self::driver_repository::{DriverRepository, DriverRepositoryError};
pub use self::notifier::{
    EVENT_BOOKING_ACCEPTED, EVENT_PAYMENT_SETTLED, EVENT_RIDE_STATUS, Notifier, NotifierError,
    NullNotifier, ride_room,
};
pub use self::payment_repository::{PaymentRepository, PaymentRepositoryError};
pub use self::ride_repository::{RideRepository, RideRepositoryError};
pub use self::user_repository::{UserRepository, UserRepositoryError};

#[cfg(test)]
pub use self::booking_repository::MockBookingRepository;
#[cfg(test)]
pub use self::cache::MockCache;
#[cfg(test)]
pub use self::driver_repository::MockDriverRepository;
#[cfg(test)]
pub use self::notifier::MockNotifier;
#[cfg(test)]
pub use self::payment_repository::MockPaymentRepository;
#[cfg(test)]
pub use self::ride_repository::MockRideRepository;
#[cfg(test)]
pub use self::user_repository::MockUserRepository;
