//! Driving port for commenting.

use async_trait::async_trait;

use super::Submission;
use crate::domain::{Comment, Error, Identity, PostId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentRequest {
    pub post_id: PostId,
    pub content: Submission<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentCommand: Send + Sync {
    /// Attach a comment by `identity` to a live post.
    ///
    /// The post's existence is confirmed before the content is decoded or
    /// validated.
    async fn create(
        &self,
        identity: &Identity,
        request: CreateCommentRequest,
    ) -> Result<Comment, Error>;
}
