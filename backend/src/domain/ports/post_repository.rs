//! Port for post persistence, including the owner's derived post counter.
//!
//! Writes that change the number of live posts adjust the owner's
//! `post_count` inside the same transaction. Adapters never let the two
//! diverge: if the counter cannot be adjusted the post write is rolled back
//! and [`PostRepositoryError::OwnerMissing`] or
//! [`PostRepositoryError::CounterRejected`] is returned. Nothing was committed
//! in either case. [`PostRepositoryError::ConsistencyFailure`] is reserved for
//! writes whose commit outcome is unknown.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Post, PostId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
        /// No live post has this identifier.
        NotFound { post_id: String } => "post {post_id} not found",
        /// The post's owner has no user row; the write was rolled back.
        OwnerMissing { owner_id: String } => "post owner {owner_id} does not exist",
        /// The owner's counter refused the adjustment; the write was rolled back.
        CounterRejected { owner_id: String, reason: String } =>
            "post count for {owner_id} rejected the write: {reason}",
        /// The write may or may not have committed alongside its counter change.
        ConsistencyFailure { owner_id: String, reason: String } =>
            "post count for {owner_id} is inconsistent: {reason}",
    }
}

/// Result of recomputing one user's post counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCountReconciliation {
    pub owner_id: UserId,
    pub previous: u64,
    pub actual: u64,
}

impl PostCountReconciliation {
    /// Whether the stored counter had drifted.
    pub fn corrected(&self) -> bool {
        self.previous != self.actual
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and increment its owner's counter atomically.
    async fn create(&self, post: &Post) -> Result<(), PostRepositoryError>;

    /// Fetch a post unless it has been soft-deleted.
    async fn find_live(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// All live posts, newest first.
    async fn list_live(&self) -> Result<Vec<Post>, PostRepositoryError>;

    /// Persist new title, content, and update time for a live post.
    async fn update(&self, post: &Post) -> Result<(), PostRepositoryError>;

    /// Soft-delete a live post and decrement its owner's counter atomically.
    async fn soft_delete(
        &self,
        id: &PostId,
        owner_id: &UserId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), PostRepositoryError>;

    /// Overwrite the owner's counter with the number of live posts.
    async fn recount(
        &self,
        owner_id: &UserId,
    ) -> Result<PostCountReconciliation, PostRepositoryError>;
}
