//! Authentication gate for protected routes.
//!
//! Handlers opt in by taking an [`Identity`] argument. The extractor reads the
//! `Authorization` header, validates the bearer token, and either hands the
//! handler a typed identity or short-circuits with `401 Unauthorized` before
//! the handler body runs.
//!
//! The header must be exactly `Bearer <token>`: the scheme, one space, and a
//! non-empty token without embedded whitespace.

use std::future::{Ready, ready};

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use tracing::warn;

use crate::domain::{Error, Identity, TokenError, TokenService};

const BEARER_PREFIX: &str = "Bearer ";

/// Message returned when no bearer credential is supplied.
pub const AUTHORIZATION_REQUIRED: &str = "authorization required";
/// Message returned for every rejected token, whatever the cause.
pub const INVALID_TOKEN: &str = "invalid token";

/// Result of running the gate over one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The token verified; the identity is attached to the request.
    PassThrough(Identity),
    /// No `Authorization` header, or not a bearer credential.
    RejectMissing,
    /// A bearer credential was supplied but failed validation.
    RejectInvalid(TokenError),
}

impl GateOutcome {
    /// Collapse the outcome into the handler-facing result.
    ///
    /// Every invalid-token cause maps to the same client message; the cause
    /// is only logged.
    pub fn into_result(self) -> Result<Identity, Error> {
        match self {
            Self::PassThrough(identity) => Ok(identity),
            Self::RejectMissing => {
                warn!(reason = "missing_credential", "request rejected by authentication gate");
                Err(Error::unauthorized(AUTHORIZATION_REQUIRED))
            }
            Self::RejectInvalid(cause) => {
                warn!(reason = "invalid_credential", cause = %cause, "request rejected by authentication gate");
                Err(Error::unauthorized(INVALID_TOKEN))
            }
        }
    }
}

/// Extract the token from an exact `Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let token = value.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Run the gate over request headers.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> GateOutcome {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return GateOutcome::RejectMissing;
    };
    let Ok(value) = header.to_str() else {
        return GateOutcome::RejectInvalid(TokenError::MalformedToken);
    };
    if !value.starts_with(BEARER_PREFIX.trim_end()) {
        return GateOutcome::RejectMissing;
    }
    let Some(token) = bearer_token(value) else {
        return GateOutcome::RejectInvalid(TokenError::MalformedToken);
    };

    match tokens.validate(token).and_then(Identity::from_claims) {
        Ok(identity) => GateOutcome::PassThrough(identity),
        Err(cause) => GateOutcome::RejectInvalid(cause),
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(identity) = req.extensions().get::<Identity>() {
            return ready(Ok(identity.clone()));
        }

        let Some(tokens) = req.app_data::<web::Data<TokenService>>() else {
            return ready(Err(Error::internal("token service is not configured")));
        };

        let result = authenticate(req.headers(), tokens).into_result();
        if let Ok(identity) = &result {
            req.extensions_mut().insert(identity.clone());
        }
        ready(result)
    }
}
