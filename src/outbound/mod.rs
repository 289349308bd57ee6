//! Outbound adapters implementing the domain's ports.
//!
//! - [`persistence`] stores rides, bookings, payments, drivers, and users in
//!   PostgreSQL via Diesel with async pooling.
//! - [`cache`] is the Redis-backed read cache.
//! - [`notify`] fans events out to in-process room subscribers.
//! - [`memory`] offers in-memory adapters for tests and local runs.

pub mod cache;
pub mod memory;
pub mod notify;
pub mod persistence;
