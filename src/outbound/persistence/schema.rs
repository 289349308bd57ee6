//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. Regenerate
//! with `diesel print-schema` when migrations change.

diesel::table! {
    /// Registered users with their role flags.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        is_admin -> Bool,
        is_driver -> Bool,
        is_rider -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Driver profiles, one per driving user.
    drivers (id) {
        id -> Uuid,
        user_id -> Uuid,
        license_number -> Varchar,
        vehicle_id -> Uuid,
        rating -> Float8,
        rides_completed -> Int8,
        is_license_number_verified -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rides and their lifecycle status. Coordinates are stored as JSONB
    /// `{longitude, latitude}` objects.
    rides (id) {
        id -> Uuid,
        driver_id -> Uuid,
        vehicle_id -> Uuid,
        rider_id -> Uuid,
        origin -> Jsonb,
        destination -> Jsonb,
        distance -> Float8,
        estimated_time -> Float8,
        price -> Float8,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Driver answers recorded against rides.
    bookings (id) {
        id -> Uuid,
        rider_id -> Uuid,
        ride_id -> Uuid,
        status -> Varchar,
        fare -> Float8,
        payment_status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Settled payments. `booking_id` carries a unique constraint so a
    /// booking can never settle twice.
    payments (id) {
        id -> Uuid,
        rider_id -> Uuid,
        booking_id -> Uuid,
        amount -> Float8,
        currency -> Varchar,
        payment_method_id -> Uuid,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(drivers -> users (user_id));
diesel::joinable!(bookings -> rides (ride_id));
diesel::joinable!(payments -> bookings (booking_id));

diesel::allow_tables_to_appear_in_same_query!(users, drivers, rides, bookings, payments);
