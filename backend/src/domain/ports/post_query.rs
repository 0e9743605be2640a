//! Driving port for public post reads.

use async_trait::async_trait;

use crate::domain::{Error, Post, PostId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostQuery: Send + Sync {
    /// Fetch a live post.
    async fn get(&self, post_id: PostId) -> Result<Post, Error>;

    /// All live posts, newest first.
    async fn list(&self) -> Result<Vec<Post>, Error>;
}
