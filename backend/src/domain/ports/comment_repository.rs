//! Port for comment persistence.
use async_trait::async_trait;

use crate::domain::{Comment, PostId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by comment repository adapters.
    pub enum CommentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "comment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "comment repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError>;

    /// Comments on `post_id`, oldest first.
    async fn list_for_post(&self, post_id: &PostId)
    -> Result<Vec<Comment>, CommentRepositoryError>;
}
