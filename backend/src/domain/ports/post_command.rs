//! Driving port for post mutations.
//!
//! Update requests carry their fields as a [`Submission`] so implementations
//! can confirm the post exists and the caller owns it before judging the
//! payload.

use async_trait::async_trait;

use super::Submission;
use crate::domain::{Error, Identity, Post, PostId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePostRequest {
    pub post_id: PostId,
    pub fields: Submission<PostFields>,
}

/// Replacement title and content, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub content: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostCommand: Send + Sync {
    /// Publish a post owned by `identity`.
    async fn create(&self, identity: &Identity, request: CreatePostRequest) -> Result<Post, Error>;

    /// Replace a post's title and content.
    ///
    /// Order of checks: existence (not found), ownership (forbidden), then
    /// payload validation (invalid request).
    async fn update(&self, identity: &Identity, request: UpdatePostRequest) -> Result<Post, Error>;

    /// Soft-delete a post after the same existence and ownership checks.
    async fn delete(&self, identity: &Identity, post_id: PostId) -> Result<(), Error>;
}
