//! End-to-end orchestration flows over the in-memory adapters.
//!
//! Each test wires the full engine (services, cache, room bus) exactly as a
//! deployment would, then drives it through the facade and asserts on the
//! envelopes and the observable store state.

use std::sync::Arc;

use chrono::Utc;
use rstest::{fixture, rstest};
use serde_json::json;

use ridehail::OrchestrationFacade;
use ridehail::domain::ports::{
    BookingRepository as _, PaymentRepository as _, RideRepository as _,
};
use ridehail::domain::{
    Booking, BookingCoordinator, BookingStatus, CacheCoordinator, Caller, CreateBookingRequest,
    CreatePaymentRequest, CreateRideRequest, Driver, DriverId, GeoPoint, NotificationDispatcher,
    PaymentMethodId, PaymentSettlement, PaymentState, Ride, RideId, RideLifecycle, RideStatus,
    User, UserDirectory, UserId, VehicleId,
};
use ridehail::outbound::memory::{
    MemoryBookingRepository, MemoryCache, MemoryDriverRepository, MemoryPaymentRepository,
    MemoryRideRepository, MemoryUserRepository,
};
use ridehail::outbound::notify::RoomBus;

/// Fully wired engine plus handles to its stores for seeding and assertions.
struct Engine {
    facade: OrchestrationFacade,
    rides: MemoryRideRepository,
    bookings: MemoryBookingRepository,
    payments: MemoryPaymentRepository,
    drivers: MemoryDriverRepository,
    users: MemoryUserRepository,
    bus: RoomBus,
}

impl Engine {
    fn new() -> Self {
        let rides = MemoryRideRepository::new();
        let bookings = MemoryBookingRepository::new();
        let payments = MemoryPaymentRepository::new();
        let drivers = MemoryDriverRepository::new();
        let users = MemoryUserRepository::new();
        let bus = RoomBus::new();

        let cache = CacheCoordinator::new(Arc::new(MemoryCache::new()));
        let dispatcher = NotificationDispatcher::new(Arc::new(bus.clone()));
        let lifecycle = RideLifecycle::new(
            Arc::new(rides.clone()),
            Arc::new(drivers.clone()),
            cache.clone(),
            dispatcher.clone(),
        );
        let coordinator = BookingCoordinator::new(
            Arc::new(bookings.clone()),
            Arc::new(users.clone()),
            lifecycle.clone(),
            cache.clone(),
            dispatcher.clone(),
        );
        let settlement = PaymentSettlement::new(
            Arc::new(payments.clone()),
            Arc::new(bookings.clone()),
            cache.clone(),
            dispatcher,
        );
        let directory = UserDirectory::new(Arc::new(users.clone()), cache);

        Self {
            facade: OrchestrationFacade::new(lifecycle, coordinator, settlement, directory),
            rides,
            bookings,
            payments,
            drivers,
            users,
            bus,
        }
    }

    fn seed_user(&self, is_driver: bool) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::random(),
            name: "Asha".to_owned(),
            email: "asha@example.com".to_owned(),
            is_admin: false,
            is_driver,
            is_rider: !is_driver,
            created_at: now,
            updated_at: now,
        };
        self.users.seed(user.clone());
        user
    }

    fn seed_driver(&self, verified: bool) -> Driver {
        let now = Utc::now();
        let driver = Driver {
            id: DriverId::random(),
            user_id: self.seed_user(true).id,
            license_number: "DL-98765".to_owned(),
            vehicle_id: VehicleId::random(),
            rating: 4.9,
            rides_completed: 58,
            is_license_number_verified: verified,
            created_at: now,
            updated_at: now,
        };
        self.drivers.seed(driver.clone());
        driver
    }

    /// Create a pending ride through the facade and read it back from the
    /// store.
    async fn seed_pending_ride(&self) -> Ride {
        let driver = self.seed_driver(true);
        let rider = Caller::rider(self.seed_user(false).id);
        let envelope = self
            .facade
            .create_ride(&rider, ride_request(driver.id))
            .await;
        assert_eq!(envelope.status_code(), 201, "{}", envelope.message());

        let id = ride_id_from(&envelope);
        self.rides
            .find_by_id(&id)
            .await
            .expect("store ok")
            .expect("ride stored")
    }
}

fn ride_request(driver: DriverId) -> CreateRideRequest {
    CreateRideRequest {
        driver,
        origin: GeoPoint {
            longitude: -0.1276,
            latitude: 51.5074,
        },
        destination: GeoPoint {
            longitude: -0.0877,
            latitude: 51.5080,
        },
        distance: 3.4,
        estimated_time: 14.0,
        price: 12.5,
    }
}

fn booking_request(ride: RideId, status: BookingStatus, fare: f64) -> CreateBookingRequest {
    CreateBookingRequest {
        ride,
        status,
        fare,
        payment_status: PaymentState::Unpaid,
    }
}

fn payment_request(booking: &Booking) -> CreatePaymentRequest {
    CreatePaymentRequest {
        booking: *booking.id(),
        amount: booking.fare(),
        currency: "GBP".to_owned(),
        payment_method: PaymentMethodId::random(),
        status: PaymentState::Paid,
    }
}

fn ride_id_from(envelope: &ridehail::domain::Envelope) -> RideId {
    let data = envelope.data().expect("ride payload");
    let id = data.get("id").and_then(|v| v.as_str()).expect("ride id");
    RideId::from_uuid(id.parse().expect("uuid"))
}

#[fixture]
fn engine() -> Engine {
    Engine::new()
}

#[rstest]
#[tokio::test]
async fn a_ride_runs_from_request_to_settled_completion(engine: Engine) {
    let ride = engine.seed_pending_ride().await;
    let driver_caller = Caller::driver(engine.seed_user(true).id);
    let mut room = engine.bus.subscribe(&format!("ride:{}", ride.id()));

    // Driver accepts: booking created, ride moves to in-progress.
    let envelope = engine
        .facade
        .create_booking(
            &driver_caller,
            booking_request(*ride.id(), BookingStatus::Accepted, 18.0),
        )
        .await;
    assert_eq!(envelope.status_code(), 201, "{}", envelope.message());
    let data = envelope.data().expect("booking payload");
    assert_eq!(
        data.pointer("/ride/status").and_then(|v| v.as_str()),
        Some("in-progress")
    );
    // The booking belongs to the ride's rider.
    assert_eq!(
        data.pointer("/booking/riderId").and_then(|v| v.as_str()),
        Some(ride.rider_id().to_string().as_str())
    );

    let booking = engine
        .bookings
        .list_all()
        .await
        .expect("store ok")
        .pop()
        .expect("booking stored");

    // Rider settles the fare.
    let rider_caller = Caller::rider(*ride.rider_id());
    let envelope = engine
        .facade
        .create_payment(&rider_caller, payment_request(&booking))
        .await;
    assert_eq!(envelope.status_code(), 201, "{}", envelope.message());
    assert_eq!(
        envelope
            .data()
            .and_then(|d| d.pointer("/booking/paymentStatus"))
            .and_then(|v| v.as_str()),
        Some("paid")
    );

    // The ride completes.
    let envelope = engine
        .facade
        .transition_ride(ride.id(), RideStatus::Completed)
        .await;
    assert_eq!(envelope.status_code(), 200, "{}", envelope.message());

    // And its terminal state refuses further movement.
    let envelope = engine
        .facade
        .transition_ride(ride.id(), RideStatus::InProgress)
        .await;
    assert_eq!(envelope.status_code(), 409);

    // The room saw the acceptance, the settlement, and both transitions.
    let mut events = Vec::new();
    while let Ok(event) = room.try_recv() {
        events.push(event.event);
    }
    assert!(events.contains(&"booking.accepted".to_owned()));
    assert!(events.contains(&"payment.settled".to_owned()));
    assert_eq!(
        events
            .iter()
            .filter(|name| name.as_str() == "ride.status")
            .count(),
        2
    );
}

#[rstest]
#[tokio::test]
async fn a_cancelling_answer_ends_the_ride_without_a_booking(engine: Engine) {
    let ride = engine.seed_pending_ride().await;
    let driver_caller = Caller::driver(engine.seed_user(true).id);

    let envelope = engine
        .facade
        .create_booking(
            &driver_caller,
            booking_request(*ride.id(), BookingStatus::Cancelled, 18.0),
        )
        .await;
    assert_eq!(envelope.status_code(), 200, "{}", envelope.message());
    assert_eq!(
        envelope
            .data()
            .and_then(|d| d.pointer("/ride/status"))
            .and_then(|v| v.as_str()),
        Some("cancelled")
    );

    assert!(
        engine
            .bookings
            .list_all()
            .await
            .expect("store ok")
            .is_empty(),
        "cancellation must not record a booking"
    );

    // The cancelled ride can no longer be answered.
    let envelope = engine
        .facade
        .create_booking(
            &driver_caller,
            booking_request(*ride.id(), BookingStatus::Accepted, 18.0),
        )
        .await;
    assert_eq!(envelope.status_code(), 409);
}

#[rstest]
#[tokio::test]
async fn a_second_acceptance_of_a_booked_ride_is_refused(engine: Engine) {
    let ride = engine.seed_pending_ride().await;
    let first_driver = Caller::driver(engine.seed_user(true).id);
    let second_driver = Caller::driver(engine.seed_user(true).id);

    let envelope = engine
        .facade
        .create_booking(
            &first_driver,
            booking_request(*ride.id(), BookingStatus::Accepted, 18.0),
        )
        .await;
    assert_eq!(envelope.status_code(), 201, "{}", envelope.message());
    assert_eq!(
        envelope
            .data()
            .and_then(|d| d.pointer("/ride/status"))
            .and_then(|v| v.as_str()),
        Some("in-progress")
    );

    let envelope = engine
        .facade
        .create_booking(
            &second_driver,
            booking_request(*ride.id(), BookingStatus::Accepted, 19.0),
        )
        .await;
    assert_eq!(envelope.status_code(), 409);
    assert!(envelope.message().contains("not available for booking"));
    assert_eq!(
        engine.bookings.list_all().await.expect("store ok").len(),
        1,
        "the refused acceptance must not record a booking"
    );
}

#[rstest]
#[tokio::test]
async fn concurrent_acceptances_admit_exactly_one_booking(engine: Engine) {
    let ride = engine.seed_pending_ride().await;
    let first_driver = Caller::driver(engine.seed_user(true).id);
    let second_driver = Caller::driver(engine.seed_user(true).id);

    let (first, second) = futures::join!(
        engine.facade.create_booking(
            &first_driver,
            booking_request(*ride.id(), BookingStatus::Accepted, 18.0),
        ),
        engine.facade.create_booking(
            &second_driver,
            booking_request(*ride.id(), BookingStatus::Accepted, 19.0),
        ),
    );

    let mut codes = [first.status_code(), second.status_code()];
    codes.sort_unstable();
    assert_eq!(codes, [201, 409], "exactly one acceptance may win");
    assert_eq!(
        engine.bookings.list_all().await.expect("store ok").len(),
        1,
        "the losing acceptance must not leave a booking behind"
    );
}

#[rstest]
#[case(0.0)]
#[case(-12.0)]
#[tokio::test]
async fn non_positive_fares_produce_a_400_naming_the_fare(engine: Engine, #[case] fare: f64) {
    let ride = engine.seed_pending_ride().await;
    let driver_caller = Caller::driver(engine.seed_user(true).id);

    let envelope = engine
        .facade
        .create_booking(
            &driver_caller,
            booking_request(*ride.id(), BookingStatus::Accepted, fare),
        )
        .await;
    assert_eq!(envelope.status_code(), 400);
    assert_eq!(
        envelope
            .data()
            .and_then(|d| d.get("field"))
            .and_then(|v| v.as_str()),
        Some("fare")
    );
    assert!(engine.bookings.list_all().await.expect("store ok").is_empty());
}

#[rstest]
#[tokio::test]
async fn an_unverified_licence_stops_ride_creation_before_the_store(engine: Engine) {
    let driver = engine.seed_driver(false);
    let rider = Caller::rider(engine.seed_user(false).id);

    let envelope = engine.facade.create_ride(&rider, ride_request(driver.id)).await;
    assert_eq!(envelope.status_code(), 400);
    assert!(envelope.message().contains("licence"));
    assert!(engine.rides.list_all().await.expect("store ok").is_empty());
}

#[rstest]
#[tokio::test]
async fn a_booking_settles_once_and_only_once(engine: Engine) {
    let ride = engine.seed_pending_ride().await;
    let driver_caller = Caller::driver(engine.seed_user(true).id);
    engine
        .facade
        .create_booking(
            &driver_caller,
            booking_request(*ride.id(), BookingStatus::Accepted, 18.0),
        )
        .await;
    let booking = engine
        .bookings
        .list_all()
        .await
        .expect("store ok")
        .pop()
        .expect("booking stored");
    let rider_caller = Caller::rider(*ride.rider_id());

    let envelope = engine
        .facade
        .create_payment(&rider_caller, payment_request(&booking))
        .await;
    assert_eq!(envelope.status_code(), 201, "{}", envelope.message());

    let envelope = engine
        .facade
        .create_payment(&rider_caller, payment_request(&booking))
        .await;
    assert_eq!(envelope.status_code(), 409);
    assert_eq!(
        engine.payments.list_all().await.expect("store ok").len(),
        1,
        "the duplicate attempt must not add a record"
    );
}

#[rstest]
#[tokio::test]
async fn settlement_touches_only_the_payment_status(engine: Engine) {
    let ride = engine.seed_pending_ride().await;
    let driver_caller = Caller::driver(engine.seed_user(true).id);
    engine
        .facade
        .create_booking(
            &driver_caller,
            booking_request(*ride.id(), BookingStatus::Accepted, 18.0),
        )
        .await;
    let before = engine
        .bookings
        .list_all()
        .await
        .expect("store ok")
        .pop()
        .expect("booking stored");

    engine
        .facade
        .create_payment(&Caller::rider(*ride.rider_id()), payment_request(&before))
        .await;

    let after = engine
        .bookings
        .find_by_id(before.id())
        .await
        .expect("store ok")
        .expect("booking still there");
    assert_eq!(after.payment_status(), PaymentState::Paid);
    assert_eq!(after.status(), before.status());
    assert_eq!(after.fare(), before.fare());
    assert_eq!(after.ride_id(), before.ride_id());
    assert_eq!(after.rider_id(), before.rider_id());
}

#[rstest]
#[tokio::test]
async fn settling_a_nonexistent_booking_is_an_input_error(engine: Engine) {
    let rider = Caller::rider(engine.seed_user(false).id);
    let envelope = engine
        .facade
        .create_payment(
            &rider,
            CreatePaymentRequest {
                booking: ridehail::domain::BookingId::random(),
                amount: 10.0,
                currency: "GBP".to_owned(),
                payment_method: PaymentMethodId::random(),
                status: PaymentState::Paid,
            },
        )
        .await;
    assert_eq!(envelope.status_code(), 400);
    assert_eq!(
        envelope
            .data()
            .and_then(|d| d.get("field"))
            .and_then(|v| v.as_str()),
        Some("booking")
    );
}

#[rstest]
#[tokio::test]
async fn listing_surfaces_are_admin_only(engine: Engine) {
    let rider = Caller::rider(engine.seed_user(false).id);
    for envelope in [
        engine.facade.list_rides(&rider).await,
        engine.facade.list_bookings(&rider).await,
        engine.facade.list_payments(&rider).await,
        engine.facade.list_users(&rider).await,
    ] {
        assert_eq!(envelope.status_code(), 403);
    }

    let admin = Caller::admin(UserId::random());
    let envelope = engine.facade.list_rides(&admin).await;
    assert_eq!(envelope.status_code(), 200);
    assert_eq!(envelope.data(), Some(&json!([])));
}

