//! Driving port for reading comments.

use async_trait::async_trait;

use crate::domain::{Comment, Error, PostId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentQuery: Send + Sync {
    /// Comments on a live post, oldest first. A missing post is not found.
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, Error>;
}
