//! Deferred JSON decoding for handlers that mutate an existing resource.
//!
//! `web::Json` rejects a bad body before the handler runs, which would
//! report `400` for a post that does not exist or belongs to someone else.
//! These handlers take the raw bytes instead and let the service judge the
//! decoded [`Submission`] after its existence and ownership checks.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::ports::Submission;
use crate::inbound::http::error::UNDECODABLE_BODY;

pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Submission<T> {
    match serde_json::from_slice(body) {
        Ok(value) => Submission::decoded(value),
        Err(err) => {
            debug!(error = %err, "deferred rejection of request body");
            Submission::undecodable(UNDECODABLE_BODY)
        }
    }
}
