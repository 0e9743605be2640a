//! Token signing configuration parsing and validation.
//!
//! Reads the signing secret and token lifetime from the environment so they
//! are validated the same way on every start and can be tested in isolation.

use std::path::PathBuf;
use std::time::Duration;

use mockable::Env;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::{DEFAULT_TOKEN_TTL, TokenSettings};

pub mod fingerprint;

use fingerprint::secret_fingerprint;

const TOKEN_SECRET_DEFAULT_PATH: &str = "/var/run/secrets/token_secret";
/// Minimum secret length accepted in release builds (HS256 key size).
pub const TOKEN_SECRET_MIN_LEN: usize = 32;
const SECRET_FILE_ENV: &str = "TOKEN_SECRET_FILE";
const ALLOW_EPHEMERAL_ENV: &str = "TOKEN_ALLOW_EPHEMERAL";
const TTL_HOURS_ENV: &str = "TOKEN_TTL_HOURS";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const HOURS_EXPECTED: &str = "a positive whole number of hours";

/// Build mode for configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings.
    Debug,
    /// Release builds reject anything that would weaken token signing.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use inkwell::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Token configuration resolved at startup.
#[derive(Debug)]
pub struct TokenConfig {
    /// Signing settings handed to the token service.
    pub settings: TokenSettings,
    /// Truncated SHA-256 fingerprint of the secret, safe to log.
    pub fingerprint: String,
    /// Whether the secret was generated for this process only.
    pub ephemeral: bool,
}

/// Errors raised while validating token configuration.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the secret file failed.
    #[error("failed to read token secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret file is too short for release builds.
    #[error("token secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not sign with a per-process secret.
    #[error("TOKEN_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build token configuration from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use inkwell::inbound::http::token_config::{BuildMode, token_config_from_env};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = tempfile::NamedTempFile::new()?;
/// std::fs::write(secret.path(), vec![b'k'; 32])?;
/// let secret_path = secret.path().to_str().expect("valid path").to_owned();
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(move |name| match name {
///     "TOKEN_SECRET_FILE" => Some(secret_path.clone()),
///     "TOKEN_TTL_HOURS" => Some("2".to_owned()),
///     _ => None,
/// });
///
/// let config = token_config_from_env(&env, BuildMode::Release)?;
/// assert_eq!(config.settings.default_ttl().as_secs(), 2 * 60 * 60);
/// assert!(!config.ephemeral);
/// # Ok(())
/// # }
/// ```
pub fn token_config_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenConfig, TokenConfigError> {
    let ttl = ttl_from_env(env, mode)?;
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let (secret, ephemeral) = secret_from_env(env, mode, allow_ephemeral)?;
    let fingerprint = secret_fingerprint(&secret);

    info!(
        fingerprint = %fingerprint,
        ephemeral,
        ttl_secs = ttl.as_secs(),
        "token signing configured"
    );

    Ok(TokenConfig {
        settings: TokenSettings::new(secret.to_vec(), ttl),
        fingerprint,
        ephemeral,
    })
}

fn ttl_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, TokenConfigError> {
    let Some(value) = env.string(TTL_HOURS_ENV) else {
        return Ok(DEFAULT_TOKEN_TTL);
    };
    match value.trim().parse::<u64>() {
        Ok(hours) if hours > 0 => hours
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| invalid_hours(value.clone())),
        _ if mode.is_debug() => {
            warn!(value = %value, "invalid TOKEN_TTL_HOURS; using default lifetime");
            Ok(DEFAULT_TOKEN_TTL)
        }
        _ => Err(invalid_hours(value)),
    }
}

fn invalid_hours(value: String) -> TokenConfigError {
    TokenConfigError::InvalidEnv {
        name: TTL_HOURS_ENV,
        value,
        expected: HOURS_EXPECTED,
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, TokenConfigError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return Ok(false);
    };
    match parse_bool(&value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(TokenConfigError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid TOKEN_ALLOW_EPHEMERAL; defaulting to disabled");
            Ok(false)
        }
        None => Err(TokenConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn secret_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<(Zeroizing<Vec<u8>>, bool), TokenConfigError> {
    let path = PathBuf::from(
        env.string(SECRET_FILE_ENV)
            .unwrap_or_else(|| TOKEN_SECRET_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(bytes) => {
            let mut secret = Zeroizing::new(bytes);
            // Secrets written with `echo` carry a trailing newline.
            while secret.last().is_some_and(|byte| matches!(byte, b'\n' | b'\r')) {
                secret.pop();
            }
            let length = secret.len();
            if mode == BuildMode::Release && length < TOKEN_SECRET_MIN_LEN {
                return Err(TokenConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: TOKEN_SECRET_MIN_LEN,
                });
            }
            if length < TOKEN_SECRET_MIN_LEN {
                warn!(length, "token secret shorter than recommended (dev only)");
            }
            Ok((secret, false))
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary token secret; tokens will not survive a restart"
            );
            Ok((ephemeral_secret(), true))
        }
        Err(error) => Err(TokenConfigError::SecretRead {
            path,
            source: error,
        }),
    }
}

fn ephemeral_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0_u8; TOKEN_SECRET_MIN_LEN * 2]);
    OsRng.fill_bytes(secret.as_mut_slice());
    secret
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
