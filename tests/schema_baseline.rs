//! Static contract checks for the baseline migration SQL.

use rstest::rstest;

const MIGRATION_UP: &str =
    include_str!("../migrations/2026-08-20-000000_schema_baseline_ridehail/up.sql");
const MIGRATION_DOWN: &str =
    include_str!("../migrations/2026-08-20-000000_schema_baseline_ridehail/down.sql");

#[rstest]
fn enables_required_extensions() {
    assert!(MIGRATION_UP.contains("CREATE EXTENSION IF NOT EXISTS pgcrypto;"));
}

#[rstest]
#[case("CREATE TABLE IF NOT EXISTS users")]
#[case("CREATE TABLE IF NOT EXISTS drivers")]
#[case("CREATE TABLE IF NOT EXISTS rides")]
#[case("CREATE TABLE IF NOT EXISTS bookings")]
#[case("CREATE TABLE IF NOT EXISTS payments")]
fn creates_every_table(#[case] statement: &str) {
    assert!(MIGRATION_UP.contains(statement), "missing: {statement}");
}

#[rstest]
fn payments_booking_reference_is_unique() {
    assert!(
        MIGRATION_UP.contains("booking_id UUID NOT NULL UNIQUE REFERENCES bookings (id)"),
        "the one-payment-per-booking constraint must live in the schema"
    );
}

#[rstest]
fn ride_status_check_matches_the_state_machine() {
    assert!(
        MIGRATION_UP
            .contains("CHECK (status IN ('pending', 'in-progress', 'completed', 'cancelled'))")
    );
}

#[rstest]
#[case("DROP TABLE IF EXISTS payments;")]
#[case("DROP TABLE IF EXISTS bookings;")]
#[case("DROP TABLE IF EXISTS rides;")]
#[case("DROP TABLE IF EXISTS drivers;")]
#[case("DROP TABLE IF EXISTS users;")]
fn down_reverses_every_table(#[case] statement: &str) {
    assert!(MIGRATION_DOWN.contains(statement), "missing: {statement}");
}

#[rstest]
fn down_drops_children_before_parents() {
    let payments = MIGRATION_DOWN.find("payments").expect("payments dropped");
    let bookings = MIGRATION_DOWN.find("bookings").expect("bookings dropped");
    let users = MIGRATION_DOWN.find("users").expect("users dropped");
    assert!(payments < bookings && bookings < users);
}
