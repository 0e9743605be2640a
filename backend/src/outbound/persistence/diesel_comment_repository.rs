//! PostgreSQL-backed `CommentRepository` implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CommentRepository, CommentRepositoryError};
use crate::domain::{Comment, CommentContent, CommentId, PostId, UserId};

use super::diesel_basic_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{CommentRow, NewCommentRow};
use super::pool::{DbPool, PoolError};
use super::schema::comments;

#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CommentRepositoryError {
    CommentRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> CommentRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(_) => {
            CommentRepositoryError::connection("database connection error")
        }
        _ => CommentRepositoryError::query("database error"),
    }
}

fn row_to_comment(row: CommentRow) -> Result<Comment, CommentRepositoryError> {
    let content = CommentContent::new(row.content).map_err(|err| {
        tracing::warn!(comment_id = %row.id, error = %err, "stored comment failed validation");
        CommentRepositoryError::query("stored comment is invalid")
    })?;
    Ok(Comment::new(
        CommentId::from_uuid(row.id),
        PostId::from_uuid(row.post_id),
        UserId::from_uuid(row.commenter_id),
        content,
        row.created_at,
    ))
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewCommentRow {
            id: *comment.id().as_uuid(),
            post_id: *comment.post_id().as_uuid(),
            commenter_id: *comment.commenter_id().as_uuid(),
            content: comment.content(),
            created_at: comment.created_at(),
        };
        diesel::insert_into(comments::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for_post(
        &self,
        post_id: &PostId,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CommentRow> = comments::table
            .filter(comments::post_id.eq(post_id.as_uuid()))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select(CommentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_comment).collect()
    }
}
