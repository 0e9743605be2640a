//! Comment use-cases.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CommentCommand, CommentQuery, CommentRepository, CommentRepositoryError, CreateCommentRequest,
    PostRepository,
};
use crate::domain::post_service::{map_post_repository_error, post_not_found};
use crate::domain::{Comment, CommentContent, CommentId, Error, Identity, PostId};

/// Comment service implementing the comment driving ports.
#[derive(Clone)]
pub struct CommentService<C, P> {
    comments: Arc<C>,
    posts: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<C, P> CommentService<C, P> {
    pub fn new(comments: Arc<C>, posts: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            comments,
            posts,
            clock,
        }
    }
}

fn map_comment_repository_error(error: CommentRepositoryError) -> Error {
    match error {
        CommentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("comment repository unavailable: {message}"))
        }
        CommentRepositoryError::Query { message } => {
            Error::internal(format!("comment repository error: {message}"))
        }
    }
}

impl<C, P> CommentService<C, P>
where
    C: CommentRepository,
    P: PostRepository,
{
    async fn ensure_post_exists(&self, post_id: &PostId) -> Result<(), Error> {
        self.posts
            .find_live(post_id)
            .await
            .map_err(map_post_repository_error)?
            .map(|_| ())
            .ok_or_else(post_not_found)
    }
}

#[async_trait]
impl<C, P> CommentCommand for CommentService<C, P>
where
    C: CommentRepository,
    P: PostRepository,
{
    async fn create(
        &self,
        identity: &Identity,
        request: CreateCommentRequest,
    ) -> Result<Comment, Error> {
        self.ensure_post_exists(&request.post_id).await?;
        let content = CommentContent::new(request.content.into_fields()?)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let comment = Comment::new(
            CommentId::random(),
            request.post_id,
            identity.user_id().clone(),
            content,
            self.clock.utc(),
        );
        self.comments
            .insert(&comment)
            .await
            .map_err(map_comment_repository_error)?;
        info!(
            comment_id = %comment.id(),
            post_id = %comment.post_id(),
            commenter_id = %identity.user_id(),
            "comment created"
        );
        Ok(comment)
    }
}

#[async_trait]
impl<C, P> CommentQuery for CommentService<C, P>
where
    C: CommentRepository,
    P: PostRepository,
{
    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, Error> {
        self.ensure_post_exists(&post_id).await?;
        self.comments
            .list_for_post(&post_id)
            .await
            .map_err(map_comment_repository_error)
    }
}
