//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When the
//! migrations change, regenerate with `diesel print-schema` or edit by hand.

diesel::table! {
    /// Coffee roasting companies.
    roasters (id) {
        id -> Int8,
        created_at -> Timestamptz,
        name -> Text,
        description -> Text,
        website -> Text,
        location -> Text,
        /// Optimistic-concurrency token, starting at 1.
        version -> Int4,
    }
}

diesel::table! {
    /// Coffee products; each row belongs to one roaster.
    beans (id) {
        id -> Int8,
        created_at -> Timestamptz,
        name -> Text,
        /// One of the five roast levels, guarded by a CHECK constraint.
        roast_level -> Text,
        roaster_id -> Int8,
        version -> Int4,
    }
}

diesel::table! {
    /// Registered accounts. `email` is unique via `users_email_key`.
    users (id) {
        id -> Int8,
        created_at -> Timestamptz,
        name -> Text,
        email -> Text,
        password_hash -> Text,
        activated -> Bool,
        version -> Int4,
        session_epoch -> Int4,
    }
}

diesel::table! {
    /// Seeded `resource:action` permission codes.
    permissions (id) {
        id -> Int8,
        code -> Text,
    }
}

diesel::table! {
    /// Grants joining users to permissions.
    users_permissions (user_id, permission_id) {
        user_id -> Int8,
        permission_id -> Int8,
    }
}

diesel::joinable!(beans -> roasters (roaster_id));
diesel::joinable!(users_permissions -> permissions (permission_id));
diesel::joinable!(users_permissions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(beans, permissions, roasters, users, users_permissions);
