//! Client-supplied fields whose decoding is judged after the target resource.
//!
//! Mutations of an existing resource report a missing target (not found) or
//! a foreign owner (forbidden) before anything about the body. Inbound
//! adapters therefore decode the body eagerly but hand the outcome over as a
//! [`Submission`], and the service only inspects it once those checks pass.

use crate::domain::Error;

/// Decoded request fields, or the reason they could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    Decoded(T),
    Undecodable(String),
}

impl<T> Submission<T> {
    /// Wrap successfully decoded fields.
    pub fn decoded(value: T) -> Self {
        Self::Decoded(value)
    }

    /// Record a decoding failure with its client-facing reason.
    pub fn undecodable(reason: impl Into<String>) -> Self {
        Self::Undecodable(reason.into())
    }

    /// Transform decoded fields, keeping a decode failure as it is.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Submission<U> {
        match self {
            Self::Decoded(value) => Submission::Decoded(f(value)),
            Self::Undecodable(reason) => Submission::Undecodable(reason),
        }
    }

    /// Yield the fields, or an `invalid_request` error for undecodable input.
    ///
    /// # Examples
    /// ```
    /// use inkwell::domain::ErrorCode;
    /// use inkwell::domain::ports::Submission;
    ///
    /// assert_eq!(Submission::decoded(3).into_fields().ok(), Some(3));
    /// let err = Submission::<u8>::undecodable("bad body")
    ///     .into_fields()
    ///     .expect_err("undecodable");
    /// assert_eq!(err.code(), ErrorCode::InvalidRequest);
    /// ```
    pub fn into_fields(self) -> Result<T, Error> {
        match self {
            Self::Decoded(value) => Ok(value),
            Self::Undecodable(reason) => Err(Error::invalid_request(reason)),
        }
    }
}

impl<T> From<T> for Submission<T> {
    fn from(value: T) -> Self {
        Self::Decoded(value)
    }
}
