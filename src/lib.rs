//! Ride-booking-payment orchestration engine.
//!
//! The engine coordinates the cross-entity ride-hailing workflow: a rider
//! requests a ride, a driver accepts or rejects the booking, a payment is
//! settled against the booking, and participants are notified through a
//! real-time room channel. Four loosely coupled records (ride, booking,
//! payment, driver) move through coupled state transitions without a single
//! multi-record transaction; every read-then-act check is closed with a
//! conditional write at the store.
//!
//! Layout follows a ports-and-adapters split:
//! - [`domain`] holds the entities, the status state machines, the driven
//!   ports, and the services that own the workflow rules.
//! - [`outbound`] holds the adapters: diesel/PostgreSQL stores, the Redis
//!   cache, the broadcast room bus, and in-memory stores for tests.
//! - [`facade`] is the single entry point consumed by the (out-of-scope)
//!   API transport; it maps every outcome into a uniform response envelope.

pub mod domain;
pub mod facade;
pub mod outbound;

pub use facade::OrchestrationFacade;
