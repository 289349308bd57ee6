//! In-memory adapters for every port.
//!
//! Used by the integration tests and for wiring the engine without external
//! services. Mutations take one lock per store, so the conditional writes
//! (ride transitions, the payments-per-booking constraint) are genuinely
//! atomic here, just like their SQL counterparts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, Cache, CacheError, CacheKey, DriverRepository,
    DriverRepositoryError, PaymentRepository, PaymentRepositoryError, RideRepository,
    RideRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Booking, BookingId, BookingPatch, Driver, DriverId, Payment, PaymentId, PaymentPatch,
    PaymentState, Ride, RideId, RidePatch, RideStatus, User, UserId, UserPatch,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory ride store with an atomic conditional status write.
#[derive(Clone, Default)]
pub struct MemoryRideRepository {
    rides: Arc<Mutex<HashMap<RideId, Ride>>>,
}

impl MemoryRideRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a ride, replacing any ride with the same id.
    pub fn seed(&self, ride: Ride) {
        lock(&self.rides).insert(*ride.id(), ride);
    }
}

#[async_trait]
impl RideRepository for MemoryRideRepository {
    async fn find_by_id(&self, id: &RideId) -> Result<Option<Ride>, RideRepositoryError> {
        Ok(lock(&self.rides).get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Ride>, RideRepositoryError> {
        let mut rides: Vec<Ride> = lock(&self.rides).values().cloned().collect();
        rides.sort_by_key(|ride| std::cmp::Reverse(ride.created_at()));
        Ok(rides)
    }

    async fn insert(&self, ride: &Ride) -> Result<(), RideRepositoryError> {
        let mut rides = lock(&self.rides);
        if rides.contains_key(ride.id()) {
            return Err(RideRepositoryError::query("ride id already exists"));
        }
        rides.insert(*ride.id(), ride.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &RideId,
        patch: &RidePatch,
    ) -> Result<Option<Ride>, RideRepositoryError> {
        let mut rides = lock(&self.rides);
        Ok(rides.get_mut(id).map(|ride| {
            ride.apply_patch(patch, Utc::now());
            ride.clone()
        }))
    }

    async fn delete(&self, id: &RideId) -> Result<bool, RideRepositoryError> {
        Ok(lock(&self.rides).remove(id).is_some())
    }

    async fn transition_status(
        &self,
        id: &RideId,
        expected: RideStatus,
        target: RideStatus,
    ) -> Result<Option<Ride>, RideRepositoryError> {
        let mut rides = lock(&self.rides);
        // Compare-and-set under the lock: the second of two racing
        // transitions observes the new status and gets None.
        match rides.get_mut(id) {
            Some(ride) if ride.status() == expected => {
                ride.set_status(target, Utc::now());
                Ok(Some(ride.clone()))
            }
            _ => Ok(None),
        }
    }
}

/// In-memory booking store.
#[derive(Clone, Default)]
pub struct MemoryBookingRepository {
    bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a booking, replacing any booking with the same id.
    pub fn seed(&self, booking: Booking) {
        lock(&self.bookings).insert(*booking.id(), booking);
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, BookingRepositoryError> {
        Ok(lock(&self.bookings).get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut bookings: Vec<Booking> = lock(&self.bookings).values().cloned().collect();
        bookings.sort_by_key(|booking| std::cmp::Reverse(booking.created_at()));
        Ok(bookings)
    }

    async fn insert(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut bookings = lock(&self.bookings);
        if bookings.contains_key(booking.id()) {
            return Err(BookingRepositoryError::query("booking id already exists"));
        }
        bookings.insert(*booking.id(), booking.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &BookingId,
        patch: &BookingPatch,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut bookings = lock(&self.bookings);
        Ok(bookings.get_mut(id).map(|booking| {
            booking.apply_patch(patch, Utc::now());
            booking.clone()
        }))
    }

    async fn delete(&self, id: &BookingId) -> Result<bool, BookingRepositoryError> {
        Ok(lock(&self.bookings).remove(id).is_some())
    }

    async fn set_payment_status(
        &self,
        id: &BookingId,
        state: PaymentState,
    ) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut bookings = lock(&self.bookings);
        Ok(bookings.get_mut(id).map(|booking| {
            booking.set_payment_status(state, Utc::now());
            booking.clone()
        }))
    }
}

/// In-memory payment store enforcing one payment per booking.
#[derive(Clone, Default)]
pub struct MemoryPaymentRepository {
    payments: Arc<Mutex<HashMap<PaymentId, Payment>>>,
}

impl MemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for MemoryPaymentRepository {
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, PaymentRepositoryError> {
        Ok(lock(&self.payments).get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Payment>, PaymentRepositoryError> {
        let mut payments: Vec<Payment> = lock(&self.payments).values().cloned().collect();
        payments.sort_by_key(|payment| std::cmp::Reverse(payment.created_at()));
        Ok(payments)
    }

    async fn find_by_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        Ok(lock(&self.payments)
            .values()
            .find(|payment| payment.booking_id() == booking_id)
            .cloned())
    }

    async fn insert(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        let mut payments = lock(&self.payments);
        // Same uniqueness the SQL constraint provides, checked under the
        // store lock so racing inserts cannot both pass.
        if payments
            .values()
            .any(|existing| existing.booking_id() == payment.booking_id())
        {
            return Err(PaymentRepositoryError::DuplicateBooking {
                booking_id: *payment.booking_id(),
            });
        }
        if payments.contains_key(payment.id()) {
            return Err(PaymentRepositoryError::query("payment id already exists"));
        }
        payments.insert(*payment.id(), payment.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &PaymentId,
        patch: &PaymentPatch,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut payments = lock(&self.payments);
        Ok(payments.get_mut(id).map(|payment| {
            payment.apply_patch(patch, Utc::now());
            payment.clone()
        }))
    }

    async fn delete(&self, id: &PaymentId) -> Result<bool, PaymentRepositoryError> {
        Ok(lock(&self.payments).remove(id).is_some())
    }
}

/// In-memory driver store.
#[derive(Clone, Default)]
pub struct MemoryDriverRepository {
    drivers: Arc<Mutex<HashMap<DriverId, Driver>>>,
}

impl MemoryDriverRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a driver, replacing any driver with the same id.
    pub fn seed(&self, driver: Driver) {
        lock(&self.drivers).insert(driver.id, driver);
    }
}

#[async_trait]
impl DriverRepository for MemoryDriverRepository {
    async fn find_by_id(&self, id: &DriverId) -> Result<Option<Driver>, DriverRepositoryError> {
        Ok(lock(&self.drivers).get(id).cloned())
    }
}

/// In-memory user store.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a user, replacing any user with the same id.
    pub fn seed(&self, user: User) {
        lock(&self.users).insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(lock(&self.users).get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut users: Vec<User> = lock(&self.users).values().cloned().collect();
        users.sort_by_key(|user| std::cmp::Reverse(user.created_at));
        Ok(users)
    }

    async fn update(
        &self,
        id: &UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut users = lock(&self.users);
        Ok(users.get_mut(id).map(|user| {
            user.apply_patch(patch, Utc::now());
            user.clone()
        }))
    }
}

/// In-memory cache that honours deletion but not expiry; the stored TTL is
/// irrelevant for test runs.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw view of a stored value, for assertions.
    pub fn peek(&self, key: &CacheKey) -> Option<String> {
        lock(&self.entries).get(key.as_str()).cloned()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        Ok(lock(&self.entries).get(key.as_str()).cloned())
    }

    async fn set(&self, key: &CacheKey, value: &str, _ttl: Duration) -> Result<(), CacheError> {
        lock(&self.entries).insert(key.as_str().to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        lock(&self.entries).remove(key.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::{GeoPoint, RideDraft, VehicleId};

    fn pending_ride() -> Ride {
        let now = Utc::now();
        Ride::new(RideDraft {
            id: RideId::random(),
            driver_id: DriverId::random(),
            vehicle_id: VehicleId::random(),
            rider_id: UserId::random(),
            origin: GeoPoint {
                longitude: 0.0,
                latitude: 0.0,
            },
            destination: GeoPoint {
                longitude: 1.0,
                latitude: 1.0,
            },
            distance: 5.0,
            estimated_time: 10.0,
            price: 20.0,
            status: RideStatus::Pending,
            created_at: now,
            updated_at: now,
        })
        .expect("valid ride")
    }

    #[rstest]
    #[tokio::test]
    async fn conditional_transition_applies_only_on_the_expected_status() {
        let store = MemoryRideRepository::new();
        let ride = pending_ride();
        let id = *ride.id();
        store.seed(ride);

        let first = store
            .transition_status(&id, RideStatus::Pending, RideStatus::InProgress)
            .await
            .expect("store ok");
        assert_eq!(first.map(|r| r.status()), Some(RideStatus::InProgress));

        let second = store
            .transition_status(&id, RideStatus::Pending, RideStatus::InProgress)
            .await
            .expect("store ok");
        assert!(second.is_none(), "stale expectation must not apply");
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_booking_payments_are_refused() {
        use crate::domain::{PaymentDraft, PaymentMethodId};

        let store = MemoryPaymentRepository::new();
        let booking_id = BookingId::random();
        let draft = |id| PaymentDraft {
            id,
            rider_id: UserId::random(),
            booking_id,
            amount: 25.0,
            currency: "GBP".to_owned(),
            payment_method_id: PaymentMethodId::random(),
            status: PaymentState::Paid,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let first = Payment::new(draft(PaymentId::random())).expect("valid payment");
        let second = Payment::new(draft(PaymentId::random())).expect("valid payment");

        store.insert(&first).await.expect("first payment lands");
        let err = store.insert(&second).await.expect_err("duplicate refused");
        assert_eq!(
            err,
            PaymentRepositoryError::DuplicateBooking { booking_id }
        );
    }
}
