//! PostgreSQL-backed `UserRepository` implementation using Diesel.
//!
//! Username and email uniqueness is enforced by the `users_username_key` and
//! `users_email_key` indexes; violations surface as
//! [`UserPersistenceError::Duplicate`] naming the offending field.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, PasswordHash, User, UserId, Username};

use super::diesel_basic_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

pub(crate) const USERNAME_CONSTRAINT: &str = "users_username_key";
pub(crate) const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(_) => {
            UserPersistenceError::connection("database connection error")
        }
        DieselFailure::UniqueViolation(constraint) => {
            UserPersistenceError::duplicate(duplicate_field(constraint.as_deref()))
        }
        DieselFailure::ForeignKeyViolation
        | DieselFailure::CheckViolation
        | DieselFailure::Query(_) => UserPersistenceError::query("database error"),
    }
}

/// Name the user-facing field behind a unique constraint.
pub(crate) fn duplicate_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(EMAIL_CONSTRAINT) => "email",
        Some(USERNAME_CONSTRAINT) => "username",
        // Username is checked first everywhere else, so an unnamed
        // violation is reported the same way.
        _ => "username",
    }
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let UserRow {
        id,
        username,
        email,
        password_hash,
        post_count,
    } = row;

    let username = Username::new(username).map_err(|err| corrupt_row(id, "username", &err))?;
    let email = Email::new(email).map_err(|err| corrupt_row(id, "email", &err))?;
    let post_count = u64::try_from(post_count).map_err(|_| {
        warn!(user_id = %id, post_count, "negative post count in storage");
        UserPersistenceError::query("stored post count is negative")
    })?;

    Ok(User::new(
        UserId::from_uuid(id),
        username,
        email,
        PasswordHash::from_stored(password_hash),
        post_count,
    ))
}

fn corrupt_row(id: Uuid, column: &'static str, err: &dyn std::fmt::Display) -> UserPersistenceError {
    warn!(user_id = %id, column, error = %err, "stored user row failed validation");
    UserPersistenceError::query(format!("stored {column} is invalid"))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post_count = i64::try_from(user.post_count())
            .map_err(|_| UserPersistenceError::query("post count out of range"))?;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            email: user.email().as_ref(),
            password_hash: user.password_hash().as_str(),
            post_count,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn list_ids(&self) -> Result<Vec<UserId>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = users::table
            .select(users::id)
            .order(users::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }
}
