//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. When
//! migrations change, regenerate with `diesel print-schema` or update by hand.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique, case-sensitive login name.
        username -> Varchar,
        /// Unique contact address.
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        /// Number of live posts; never negative (CHECK constraint).
        post_count -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Posts, soft-deleted by setting `deleted_at`.
    posts (id) {
        id -> Uuid,
        /// Owning user; immutable after insert.
        user_id -> Uuid,
        title -> Varchar,
        content -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Comments attached to posts.
    comments (id) {
        id -> Uuid,
        post_id -> Uuid,
        commenter_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> users (user_id));
diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(comments -> users (commenter_id));

diesel::allow_tables_to_appear_in_same_query!(users, posts, comments);
