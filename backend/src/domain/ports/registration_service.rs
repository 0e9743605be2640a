//! Driving port for account registration.

use async_trait::async_trait;

use crate::domain::{AuthenticatedUser, Error, Registration};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Create an account and issue its first token.
    ///
    /// Duplicate usernames are reported before duplicate emails.
    async fn register(&self, registration: &Registration) -> Result<AuthenticatedUser, Error>;
}
