//! Authenticated principal for the duration of one request.

use super::token::{Claims, TokenError};
use super::user::UserId;

/// Identity established from a validated token.
///
/// Lives only as long as the request that carried the token and is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    username: String,
}

impl Identity {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }

    /// Build the identity asserted by verified claims.
    ///
    /// A subject that is not a user identifier makes the token malformed.
    pub fn from_claims(claims: Claims) -> Result<Self, TokenError> {
        let user_id = UserId::new(&claims.sub).map_err(|_| TokenError::MalformedToken)?;
        Ok(Self::new(user_id, claims.username))
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }
}
