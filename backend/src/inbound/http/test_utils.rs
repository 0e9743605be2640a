//! Test helpers for inbound HTTP components.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use chrono::{TimeZone, Utc};

use crate::domain::ports::{
    MockCommentCommand, MockCommentQuery, MockLoginService, MockPostCommand, MockPostQuery,
    MockRegistrationService,
};
use crate::domain::{Identity, TokenService, TokenSettings, UserId};
use crate::test_support::MutableClock;

use super::state::{HttpState, HttpStatePorts};

pub(crate) const TEST_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

/// Mock ports with no expectations; tests set only what they exercise.
#[derive(Default)]
pub(crate) struct MockPorts {
    pub login: MockLoginService,
    pub registration: MockRegistrationService,
    pub posts: MockPostCommand,
    pub posts_query: MockPostQuery,
    pub comments: MockCommentCommand,
    pub comments_query: MockCommentQuery,
}

impl MockPorts {
    pub(crate) fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(HttpStatePorts {
            login: Arc::new(self.login),
            registration: Arc::new(self.registration),
            posts: Arc::new(self.posts),
            posts_query: Arc::new(self.posts_query),
            comments: Arc::new(self.comments),
            comments_query: Arc::new(self.comments_query),
        }))
    }
}

/// Token service on a fixed clock with a one hour lifetime.
pub(crate) fn test_tokens() -> web::Data<TokenService> {
    let start = Utc
        .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid fixture timestamp"));
    web::Data::new(TokenService::new(
        TokenSettings::new(TEST_SECRET.to_vec(), Duration::from_secs(3600)),
        Arc::new(MutableClock::new(start)),
    ))
}

/// An identity plus the `Authorization` header value that proves it.
pub(crate) fn bearer_for(tokens: &TokenService, username: &str) -> (Identity, String) {
    let user_id = UserId::random();
    let token = tokens
        .issue(&user_id, username)
        .unwrap_or_else(|error| panic!("issue test token: {error}"));
    (Identity::new(user_id, username), format!("Bearer {token}"))
}
