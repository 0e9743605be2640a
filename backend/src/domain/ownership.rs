//! Ownership-based authorization for mutating owned resources.

use super::error::Error;
use super::identity::Identity;
use super::user::UserId;

/// A resource with exactly one owning user.
pub trait Owned {
    fn owner_id(&self) -> &UserId;
}

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allow,
    Deny,
}

impl Authorization {
    /// Map a denial onto a forbidden domain error.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny => Err(Error::forbidden(
                "you do not have permission to modify this resource",
            )),
        }
    }
}

/// Allow iff the acting identity owns `resource`.
///
/// Callers confirm the resource exists before asking, so a missing resource
/// surfaces as not-found rather than forbidden.
///
/// # Examples
/// ```
/// use inkwell::domain::{authorize, Authorization, Identity, Owned, UserId};
///
/// struct Note(UserId);
/// impl Owned for Note {
///     fn owner_id(&self) -> &UserId { &self.0 }
/// }
///
/// let owner = UserId::random();
/// let note = Note(owner.clone());
/// assert_eq!(authorize(&Identity::new(owner, "alice"), &note), Authorization::Allow);
/// assert_eq!(authorize(&Identity::new(UserId::random(), "bob"), &note), Authorization::Deny);
/// ```
pub fn authorize<R: Owned + ?Sized>(identity: &Identity, resource: &R) -> Authorization {
    if identity.user_id() == resource.owner_id() {
        Authorization::Allow
    } else {
        Authorization::Deny
    }
}
