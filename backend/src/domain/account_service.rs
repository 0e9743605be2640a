//! Registration and login use-cases.
//!
//! Password hashing runs on the blocking pool so the async executor is never
//! stalled by the deliberately expensive key derivation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{LoginService, RegistrationService, UserPersistenceError, UserRepository};
use crate::domain::{
    AuthenticatedUser, CredentialError, CredentialManager, Error, LoginCredentials, PasswordHash,
    Registration, TokenService, User, UserId, Username,
};

const INVALID_LOGIN: &str = "invalid username or password";

/// Account service implementing the registration and login driving ports.
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    credentials: CredentialManager,
    tokens: Arc<TokenService>,
}

impl<U> AccountService<U> {
    /// Build the service, deriving the decoy credential up front.
    pub fn new(users: Arc<U>, credentials: CredentialManager, tokens: Arc<TokenService>) -> Self {
        credentials.prime_decoy();
        Self {
            users,
            credentials,
            tokens,
        }
    }
}

pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::Duplicate { field } => duplicate(&field),
    }
}

fn duplicate(field: &str) -> Error {
    Error::conflict(format!("{field} already exists")).with_details(json!({ "field": field }))
}

fn weak_credential(error: &CredentialError) -> Error {
    match error {
        CredentialError::WeakCredential { .. } => {
            Error::invalid_request(error.to_string()).with_details(json!({ "field": "password" }))
        }
        CredentialError::Hashing { .. } => Error::internal(error.to_string()),
    }
}

impl<U> AccountService<U>
where
    U: UserRepository,
{
    async fn hash_password(&self, password: &str) -> Result<PasswordHash, Error> {
        let manager = self.credentials.clone();
        let password = zeroize::Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || manager.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(|err| weak_credential(&err))
    }

    async fn verify_password(&self, hash: PasswordHash, password: &str) -> Result<bool, Error> {
        let manager = self.credentials.clone();
        let password = zeroize::Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || manager.verify(&hash, &password))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))
    }

    /// Spend a real verification's worth of work, then reject the login.
    async fn reject_unknown(&self, password: &str, reason: &'static str) -> Error {
        let manager = self.credentials.clone();
        let password = zeroize::Zeroizing::new(password.to_owned());
        if let Err(err) = tokio::task::spawn_blocking(move || manager.verify_decoy(&password)).await
        {
            return Error::internal(format!("password verification task failed: {err}"));
        }
        warn!(reason, "login rejected");
        Error::unauthorized(INVALID_LOGIN)
    }

    fn issue(&self, user: &User) -> Result<AuthenticatedUser, Error> {
        let token = self
            .tokens
            .issue(user.id(), user.username().as_ref())
            .map_err(|err| Error::internal(format!("token issuance failed: {err}")))?;
        Ok(AuthenticatedUser {
            token,
            user: user.profile(),
        })
    }
}

#[async_trait]
impl<U> RegistrationService for AccountService<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: &Registration) -> Result<AuthenticatedUser, Error> {
        if self
            .users
            .find_by_username(registration.username())
            .await
            .map_err(map_user_persistence_error)?
            .is_some()
        {
            return Err(duplicate("username"));
        }
        if self
            .users
            .find_by_email(registration.email())
            .await
            .map_err(map_user_persistence_error)?
            .is_some()
        {
            return Err(duplicate("email"));
        }

        let password_hash = self.hash_password(registration.password()).await?;
        let user = User::register(
            UserId::random(),
            registration.username().clone(),
            registration.email().clone(),
            password_hash,
        );
        self.users
            .insert(&user)
            .await
            .map_err(map_user_persistence_error)?;

        info!(user_id = %user.id(), username = %user.username(), "user registered");
        self.issue(&user)
    }
}

#[async_trait]
impl<U> LoginService for AccountService<U>
where
    U: UserRepository,
{
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedUser, Error> {
        // A name that could never have registered is just another unknown user.
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(self
                .reject_unknown(credentials.password(), "invalid_username")
                .await);
        };
        let Some(user) = self
            .users
            .find_by_username(&username)
            .await
            .map_err(map_user_persistence_error)?
        else {
            return Err(self
                .reject_unknown(credentials.password(), "unknown_user")
                .await);
        };

        if !self
            .verify_password(user.password_hash().clone(), credentials.password())
            .await?
        {
            warn!(reason = "bad_credential", user_id = %user.id(), "login rejected");
            return Err(Error::unauthorized(INVALID_LOGIN));
        }

        info!(user_id = %user.id(), "user logged in");
        self.issue(&user)
    }
}
