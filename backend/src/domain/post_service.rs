//! Post use-cases: publishing, revising, deleting, and reading posts.
//!
//! Mutations follow a fixed order: the post must exist (not found), the caller
//! must own it (forbidden), and only then is the payload validated.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    CreatePostRequest, PostCommand, PostCountReconciliation, PostFields, PostQuery,
    PostRepository, PostRepositoryError, UpdatePostRequest,
};
use crate::domain::post_count::consistency_failure;
use crate::domain::{Error, Identity, Post, PostDraft, PostId, UserId, authorize};

/// Post service implementing the post driving ports.
#[derive(Clone)]
pub struct PostService<P> {
    posts: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P> PostService<P> {
    pub fn new(posts: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { posts, clock }
    }
}

pub(crate) fn map_post_repository_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
        PostRepositoryError::NotFound { .. } => post_not_found(),
        PostRepositoryError::OwnerMissing { owner_id } => {
            Error::internal(format!("post owner {owner_id} does not exist"))
        }
        PostRepositoryError::CounterRejected { owner_id, reason } => {
            warn!(owner_id = %owner_id, reason = %reason, "post write rolled back by its counter");
            Error::internal(format!("post write rolled back: {reason}"))
        }
        PostRepositoryError::ConsistencyFailure { owner_id, reason } => {
            consistency_failure(&owner_id, &reason)
        }
    }
}

pub(crate) fn post_not_found() -> Error {
    Error::not_found("post not found")
}

fn invalid_draft(title: String, content: String) -> Result<PostDraft, Error> {
    PostDraft::try_from_parts(title, content).map_err(|err| Error::invalid_request(err.to_string()))
}

impl<P> PostService<P>
where
    P: PostRepository,
{
    async fn find_live(&self, post_id: &PostId) -> Result<Post, Error> {
        self.posts
            .find_live(post_id)
            .await
            .map_err(map_post_repository_error)?
            .ok_or_else(post_not_found)
    }

    /// Find a post the caller owns, in existence-then-ownership order.
    async fn find_owned(&self, identity: &Identity, post_id: &PostId) -> Result<Post, Error> {
        let post = self.find_live(post_id).await?;
        authorize(identity, &post).into_result().inspect_err(|_| {
            warn!(
                post_id = %post_id,
                user_id = %identity.user_id(),
                "ownership check denied post mutation"
            );
        })?;
        Ok(post)
    }

    /// Recompute `owner_id`'s post counter from their live posts.
    pub async fn reconcile_post_count(
        &self,
        owner_id: &UserId,
    ) -> Result<PostCountReconciliation, Error> {
        let outcome = self
            .posts
            .recount(owner_id)
            .await
            .map_err(|err| match err {
                PostRepositoryError::OwnerMissing { .. } => Error::not_found("user not found"),
                other => map_post_repository_error(other),
            })?;
        if outcome.corrected() {
            warn!(
                owner_id = %owner_id,
                previous = outcome.previous,
                actual = outcome.actual,
                "post count corrected"
            );
        }
        Ok(outcome)
    }
}

#[async_trait]
impl<P> PostCommand for PostService<P>
where
    P: PostRepository,
{
    async fn create(&self, identity: &Identity, request: CreatePostRequest) -> Result<Post, Error> {
        let draft = invalid_draft(request.title, request.content)?;
        let post = Post::create(
            PostId::random(),
            identity.user_id().clone(),
            draft,
            self.clock.utc(),
        );
        self.posts
            .create(&post)
            .await
            .map_err(map_post_repository_error)?;
        info!(post_id = %post.id(), owner_id = %identity.user_id(), "post created");
        Ok(post)
    }

    async fn update(&self, identity: &Identity, request: UpdatePostRequest) -> Result<Post, Error> {
        let post = self.find_owned(identity, &request.post_id).await?;
        let PostFields { title, content } = request.fields.into_fields()?;
        let draft = invalid_draft(title, content)?;
        let revised = post.revise(draft, self.clock.utc());
        self.posts
            .update(&revised)
            .await
            .map_err(map_post_repository_error)?;
        info!(post_id = %revised.id(), "post updated");
        Ok(revised)
    }

    async fn delete(&self, identity: &Identity, post_id: PostId) -> Result<(), Error> {
        self.find_owned(identity, &post_id).await?;
        self.posts
            .soft_delete(&post_id, identity.user_id(), self.clock.utc())
            .await
            .map_err(map_post_repository_error)?;
        info!(post_id = %post_id, owner_id = %identity.user_id(), "post deleted");
        Ok(())
    }
}

#[async_trait]
impl<P> PostQuery for PostService<P>
where
    P: PostRepository,
{
    async fn get(&self, post_id: PostId) -> Result<Post, Error> {
        self.find_live(&post_id).await
    }

    async fn list(&self) -> Result<Vec<Post>, Error> {
        self.posts
            .list_live()
            .await
            .map_err(map_post_repository_error)
    }
}

#[cfg(test)]
mod tests;
