//! Stateless, signed identity tokens.
//!
//! Tokens are compact JWS values signed with HMAC-SHA256 over the claims
//! `{sub, username, iat, exp}`. Nothing is stored server side: a token is
//! valid while its signature verifies under the process secret and the clock
//! has not passed `exp`. Replacing the secret invalidates every token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use super::user::UserId;

/// Lifetime applied by [`TokenService::issue`] unless configured otherwise.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Failures raised while issuing or validating tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token is not a well-formed signed token with the expected claims.
    #[error("token is malformed")]
    MalformedToken,
    /// The signature does not verify under the configured secret.
    #[error("token signature does not verify")]
    BadSignature,
    /// The token verified but its expiry has passed.
    #[error("token has expired")]
    Expired,
    /// The requested lifetime cannot be represented.
    #[error("invalid token configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl TokenError {
    fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::MalformedToken,
        }
    }
}

/// Claims carried by an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user identifier.
    pub sub: String,
    /// Subject username at issue time.
    pub username: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Immutable signing configuration.
///
/// The secret is zeroized when the settings are dropped.
#[derive(Clone)]
pub struct TokenSettings {
    secret: Zeroizing<Vec<u8>>,
    default_ttl: Duration,
}

impl TokenSettings {
    pub fn new(secret: impl Into<Vec<u8>>, default_ttl: Duration) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

/// Issues and validates identity tokens.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use inkwell::domain::{TokenService, TokenSettings, UserId, DEFAULT_TOKEN_TTL};
///
/// let settings = TokenSettings::new(b"a secret of at least thirty-two bytes".to_vec(), DEFAULT_TOKEN_TTL);
/// let tokens = TokenService::new(settings, Arc::new(mockable::DefaultClock));
/// let id = UserId::random();
/// let token = tokens.issue(&id, "alice").unwrap();
/// let claims = tokens.validate(&token).unwrap();
/// assert_eq!(claims.sub, id.to_string());
/// assert_eq!(claims.username, "alice");
/// ```
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock after the signature.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(&settings.secret),
            decoding: DecodingKey::from_secret(&settings.secret),
            validation,
            default_ttl: settings.default_ttl,
            clock,
        }
    }

    /// Issue a token valid for the configured default lifetime.
    pub fn issue(&self, user_id: &UserId, username: &str) -> Result<String, TokenError> {
        self.issue_with_ttl(user_id, username, self.default_ttl)
    }

    /// Issue a token valid for `ttl` from now.
    pub fn issue_with_ttl(
        &self,
        user_id: &UserId,
        username: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        if ttl.is_zero() {
            return Err(TokenError::invalid_configuration("token lifetime must be positive"));
        }
        let delta = TimeDelta::from_std(ttl)
            .map_err(|_| TokenError::invalid_configuration("token lifetime is out of range"))?;
        let now = self.clock.utc();
        let expires_at = now
            .checked_add_signed(delta)
            .ok_or_else(|| TokenError::invalid_configuration("token expiry overflows"))?;

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_owned(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|error| {
            TokenError::invalid_configuration(format!("token signing failed: {error}"))
        })
    }

    /// Verify `token` and return its claims.
    ///
    /// The signature is verified before any claim is read; expiry is then
    /// compared with the clock (`now > exp` is expired).
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|error| {
            debug!(error = %error, "token rejected by verifier");
            TokenError::from(error)
        })?;
        let claims = data.claims;
        if self.clock.utc().timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
