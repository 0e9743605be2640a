//! Password hashing and verification.
//!
//! Credentials are stored as Argon2id PHC strings, which embed the algorithm,
//! work factor, and salt. The work factor is fixed for the lifetime of a
//! [`CredentialManager`]. Both operations are CPU-bound; async callers must run
//! them on the blocking pool.
//!
//! Logins for unknown accounts verify against a decoy credential derived with
//! the manager's own work factor, so a rejection costs the same whether or
//! not the username exists.

use std::fmt;
use std::sync::{Arc, OnceLock};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

/// Shortest accepted password, in UTF-8 bytes.
pub const PASSWORD_MIN_BYTES: usize = 8;
/// Longest accepted password, in UTF-8 bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;

const SALT_LEN: usize = 16;
const DECOY_PLAINTEXT: &str = "decoy credential, never issued";
const DECOY_SALT: [u8; SALT_LEN] = *b"inkwell-decoy-01";

/// Errors raised while producing a credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Plaintext length falls outside the accepted range.
    #[error("password must be between {min} and {max} bytes")]
    WeakCredential { min: usize, max: usize },
    /// The hasher rejected its input or could not obtain a salt.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

impl CredentialError {
    fn weak() -> Self {
        Self::WeakCredential {
            min: PASSWORD_MIN_BYTES,
            max: PASSWORD_MAX_BYTES,
        }
    }
}

/// Opaque, self-describing password hash.
///
/// The value is never serialised and its `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a PHC string loaded from storage.
    ///
    /// No parsing happens here; a malformed value simply never verifies.
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// PHC string suitable for persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

fn within_bounds(plaintext: &str) -> bool {
    (PASSWORD_MIN_BYTES..=PASSWORD_MAX_BYTES).contains(&plaintext.len())
}

/// Hashes and verifies passwords with a fixed Argon2id work factor.
///
/// # Examples
/// ```
/// use inkwell::domain::CredentialManager;
///
/// let manager = CredentialManager::default();
/// let hash = manager.hash("correct horse").unwrap();
/// assert!(manager.verify(&hash, "correct horse"));
/// assert!(!manager.verify(&hash, "wrong horse"));
/// ```
#[derive(Clone)]
pub struct CredentialManager {
    hasher: Argon2<'static>,
    decoy: Arc<OnceLock<PasswordHash>>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("params", self.hasher.params())
            .finish()
    }
}

impl CredentialManager {
    /// Build a manager using Argon2id with the supplied work factor.
    pub fn with_params(params: Params) -> Self {
        Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: Arc::new(OnceLock::new()),
            #[cfg(test)]
            verifications: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of Argon2 comparisons run by this manager and its clones.
    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }

    /// Derive the decoy credential now rather than on the first unknown login.
    ///
    /// Call this at startup; the derivation costs one full hash.
    pub fn prime_decoy(&self) {
        self.decoy();
    }

    /// Run a full comparison of `plaintext` against the decoy credential.
    ///
    /// The outcome is discarded: callers use this to reject a login for an
    /// account that does not exist after the same work a real check costs.
    pub fn verify_decoy(&self, plaintext: &str) {
        let _ = self.verify(self.decoy(), plaintext);
    }

    fn decoy(&self) -> &PasswordHash {
        self.decoy.get_or_init(|| {
            self.derive_decoy().unwrap_or_else(|message| {
                warn!(%message, "decoy credential unavailable; unknown logins fail fast");
                PasswordHash::from_stored(String::new())
            })
        })
    }

    fn derive_decoy(&self) -> Result<PasswordHash, String> {
        let salt = SaltString::encode_b64(&DECOY_SALT).map_err(|error| error.to_string())?;
        let phc = self
            .hasher
            .hash_password(DECOY_PLAINTEXT.as_bytes(), &salt)
            .map_err(|error| error.to_string())?;
        Ok(PasswordHash(phc.to_string()))
    }

    /// Cheap parameters so unit tests do not spend seconds hashing.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        match Params::new(Params::MIN_M_COST, 1, 1, None) {
            Ok(params) => Self::with_params(params),
            Err(error) => panic!("minimal argon2 parameters are valid: {error}"),
        }
    }

    /// Produce a salted hash of `plaintext`.
    ///
    /// Fails with [`CredentialError::WeakCredential`] when the password is
    /// shorter than [`PASSWORD_MIN_BYTES`] or longer than [`PASSWORD_MAX_BYTES`].
    pub fn hash(&self, plaintext: &str) -> Result<PasswordHash, CredentialError> {
        if !within_bounds(plaintext) {
            return Err(CredentialError::weak());
        }

        let mut salt_bytes = [0_u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|error| CredentialError::Hashing {
                message: error.to_string(),
            })?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|error| CredentialError::Hashing {
            message: error.to_string(),
        })?;

        let phc = self
            .hasher
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|error| CredentialError::Hashing {
                message: error.to_string(),
            })?;
        Ok(PasswordHash(phc.to_string()))
    }

    /// Check `plaintext` against a stored credential.
    ///
    /// Out-of-range plaintexts return `false` without running the comparison.
    /// A malformed credential also yields `false`. The work factor embedded in
    /// the credential governs verification, so hashes produced under older
    /// parameters keep verifying.
    pub fn verify(&self, credential: &PasswordHash, plaintext: &str) -> bool {
        if !within_bounds(plaintext) {
            return false;
        }
        let Ok(parsed) = PhcString::new(credential.as_str()) else {
            return false;
        };
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::SeqCst);
        self.hasher
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
