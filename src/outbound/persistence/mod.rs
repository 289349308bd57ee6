//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Thin adapters only: each repository translates between Diesel row structs
//! and domain types, maps database errors onto the port's error enum, and
//! holds no business logic. Connections come from a `bb8` pool driven by
//! `diesel-async`.

mod diesel_booking_repository;
mod diesel_driver_repository;
mod diesel_payment_repository;
mod diesel_ride_repository;
mod diesel_user_repository;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_driver_repository::DieselDriverRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_ride_repository::DieselRideRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
