//! The single entry surface: every operation returns an [`Envelope`].
//!
//! Domain errors never escape this layer. Each method runs the relevant
//! service, wraps the outcome in an envelope with the status the operation
//! warrants (201 for creations, 200 otherwise), and folds any
//! [`DomainError`] into an error envelope instead of returning `Err`.

use serde_json::json;

use crate::domain::{
    BookingCoordinator, BookingId, BookingPatch, Caller, CreateBookingOutcome,
    CreateBookingRequest, CreatePaymentRequest, CreateRideRequest, DomainError, Envelope,
    PaymentId, PaymentPatch, PaymentSettlement, RideId, RideLifecycle, RidePatch, RideStatus,
    UserDirectory, UserId, UserPatch,
};

const CREATED: u16 = 201;
const OK: u16 = 200;

/// Aggregates the domain services behind one envelope-returning surface.
#[derive(Clone)]
pub struct OrchestrationFacade {
    rides: RideLifecycle,
    bookings: BookingCoordinator,
    payments: PaymentSettlement,
    users: UserDirectory,
}

fn envelope(result: Result<Envelope, DomainError>) -> Envelope {
    result.unwrap_or_else(|err| Envelope::from_error(&err))
}

impl OrchestrationFacade {
    pub fn new(
        rides: RideLifecycle,
        bookings: BookingCoordinator,
        payments: PaymentSettlement,
        users: UserDirectory,
    ) -> Self {
        Self {
            rides,
            bookings,
            payments,
            users,
        }
    }

    // --- rides ---

    pub async fn create_ride(&self, caller: &Caller, request: CreateRideRequest) -> Envelope {
        envelope(
            self.rides
                .create_ride(caller, request)
                .await
                .map(|ride| Envelope::success(CREATED, "ride created", &ride)),
        )
    }

    pub async fn get_ride(&self, id: &RideId) -> Envelope {
        envelope(
            self.rides
                .get_ride(id)
                .await
                .map(|ride| Envelope::success(OK, "ride fetched", &ride)),
        )
    }

    pub async fn list_rides(&self, caller: &Caller) -> Envelope {
        envelope(
            self.rides
                .list_rides(caller)
                .await
                .map(|rides| Envelope::success(OK, "rides fetched", &rides)),
        )
    }

    pub async fn update_ride(&self, id: &RideId, patch: &RidePatch) -> Envelope {
        envelope(
            self.rides
                .update_ride(id, patch)
                .await
                .map(|ride| Envelope::success(OK, "ride updated", &ride)),
        )
    }

    pub async fn transition_ride(&self, id: &RideId, target: RideStatus) -> Envelope {
        envelope(
            self.rides
                .transition(id, target)
                .await
                .map(|ride| Envelope::success(OK, "ride status updated", &ride)),
        )
    }

    pub async fn delete_ride(&self, id: &RideId) -> Envelope {
        envelope(
            self.rides
                .delete_ride(id)
                .await
                .map(|()| Envelope::success(OK, "ride deleted", &json!({ "id": id }))),
        )
    }

    // --- bookings ---

    pub async fn create_booking(&self, caller: &Caller, request: CreateBookingRequest) -> Envelope {
        envelope(
            self.bookings
                .create_booking(caller, request)
                .await
                .map(|outcome| match outcome {
                    CreateBookingOutcome::Booked { booking, ride } => Envelope::success(
                        CREATED,
                        "booking created",
                        &json!({ "booking": booking, "ride": ride }),
                    ),
                    CreateBookingOutcome::RideCancelled { ride } => Envelope::success(
                        OK,
                        "ride cancelled, no booking recorded",
                        &json!({ "ride": ride }),
                    ),
                }),
        )
    }

    pub async fn get_booking(&self, id: &BookingId) -> Envelope {
        envelope(
            self.bookings
                .get_booking(id)
                .await
                .map(|booking| Envelope::success(OK, "booking fetched", &booking)),
        )
    }

    pub async fn list_bookings(&self, caller: &Caller) -> Envelope {
        envelope(
            self.bookings
                .list_bookings(caller)
                .await
                .map(|bookings| Envelope::success(OK, "bookings fetched", &bookings)),
        )
    }

    pub async fn update_booking(&self, id: &BookingId, patch: &BookingPatch) -> Envelope {
        envelope(
            self.bookings
                .update_booking(id, patch)
                .await
                .map(|booking| Envelope::success(OK, "booking updated", &booking)),
        )
    }

    pub async fn delete_booking(&self, id: &BookingId) -> Envelope {
        envelope(
            self.bookings
                .delete_booking(id)
                .await
                .map(|()| Envelope::success(OK, "booking deleted", &json!({ "id": id }))),
        )
    }

    // --- payments ---

    pub async fn create_payment(&self, caller: &Caller, request: CreatePaymentRequest) -> Envelope {
        envelope(self.payments.create_payment(caller, request).await.map(
            |receipt| {
                Envelope::success(
                    CREATED,
                    "payment created",
                    &json!({ "payment": receipt.payment, "booking": receipt.booking }),
                )
            },
        ))
    }

    pub async fn get_payment(&self, id: &PaymentId) -> Envelope {
        envelope(
            self.payments
                .get_payment(id)
                .await
                .map(|payment| Envelope::success(OK, "payment fetched", &payment)),
        )
    }

    pub async fn list_payments(&self, caller: &Caller) -> Envelope {
        envelope(
            self.payments
                .list_payments(caller)
                .await
                .map(|payments| Envelope::success(OK, "payments fetched", &payments)),
        )
    }

    pub async fn update_payment(&self, id: &PaymentId, patch: &PaymentPatch) -> Envelope {
        envelope(
            self.payments
                .update_payment(id, patch)
                .await
                .map(|payment| Envelope::success(OK, "payment updated", &payment)),
        )
    }

    pub async fn delete_payment(&self, id: &PaymentId) -> Envelope {
        envelope(
            self.payments
                .delete_payment(id)
                .await
                .map(|()| Envelope::success(OK, "payment deleted", &json!({ "id": id }))),
        )
    }

    // --- users ---

    pub async fn get_user(&self, id: &UserId) -> Envelope {
        envelope(
            self.users
                .get_user(id)
                .await
                .map(|user| Envelope::success(OK, "user fetched", &user)),
        )
    }

    pub async fn list_users(&self, caller: &Caller) -> Envelope {
        envelope(
            self.users
                .list_users(caller)
                .await
                .map(|users| Envelope::success(OK, "users fetched", &users)),
        )
    }

    pub async fn update_user(&self, id: &UserId, patch: &UserPatch) -> Envelope {
        envelope(
            self.users
                .update_user(id, patch)
                .await
                .map(|user| Envelope::success(OK, "user updated", &user)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{
        MockBookingRepository, MockDriverRepository, MockPaymentRepository, MockRideRepository,
        MockUserRepository, NoopCache, NullNotifier,
    };
    use crate::domain::{CacheCoordinator, NotificationDispatcher};

    fn facade_with_ride_store(rides: MockRideRepository) -> OrchestrationFacade {
        let cache = CacheCoordinator::new(Arc::new(NoopCache));
        let dispatcher = NotificationDispatcher::new(Arc::new(NullNotifier));
        let lifecycle = RideLifecycle::new(
            Arc::new(rides),
            Arc::new(MockDriverRepository::new()),
            cache.clone(),
            dispatcher.clone(),
        );
        let bookings = BookingCoordinator::new(
            Arc::new(MockBookingRepository::new()),
            Arc::new(MockUserRepository::new()),
            lifecycle.clone(),
            cache.clone(),
            dispatcher.clone(),
        );
        let payments = PaymentSettlement::new(
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockBookingRepository::new()),
            cache.clone(),
            dispatcher,
        );
        let users = UserDirectory::new(Arc::new(MockUserRepository::new()), cache);
        OrchestrationFacade::new(lifecycle, bookings, payments, users)
    }

    #[rstest]
    #[tokio::test]
    async fn absent_rides_surface_as_a_404_envelope_not_an_err() {
        let mut rides = MockRideRepository::new();
        rides.expect_find_by_id().returning(|_| Ok(None));

        let envelope = facade_with_ride_store(rides)
            .get_ride(&RideId::random())
            .await;
        assert_eq!(envelope.status_code(), 404);
        assert!(!envelope.is_success());
        assert!(envelope.message().contains("not found"));
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_surface_as_a_500_envelope() {
        use crate::domain::ports::RideRepositoryError;
        let mut rides = MockRideRepository::new();
        rides
            .expect_find_by_id()
            .returning(|_| Err(RideRepositoryError::connection("pool exhausted")));

        let envelope = facade_with_ride_store(rides)
            .get_ride(&RideId::random())
            .await;
        assert_eq!(envelope.status_code(), 500);
    }
}
