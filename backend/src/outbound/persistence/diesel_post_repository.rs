//! PostgreSQL-backed `PostRepository` implementation using Diesel.
//!
//! Post creation and soft deletion run in one transaction together with the
//! owner's `post_count` adjustment, expressed as `post_count = post_count ± 1`
//! so concurrent writers never lose an update. When the owner row cannot be
//! adjusted the transaction rolls back and the rejection is reported as such.
//! Only a lost connection, where the commit outcome is unknown, is reported
//! as a consistency failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{PostCountReconciliation, PostRepository, PostRepositoryError};
use crate::domain::{Owned, Post, PostCountAdjustment, PostDraft, PostId, UserId};

use super::diesel_basic_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{NewPostRow, PostRow, PostUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{posts, users};

/// Diesel-backed implementation of the `PostRepository` port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a post transaction.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    /// The owner has no user row.
    OwnerMissing,
    /// The owner's counter would have gone negative.
    CounterExhausted,
    /// No live post matched.
    PostNotFound,
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> PostRepositoryError {
    PostRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> PostRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(_) => PostRepositoryError::connection("database connection error"),
        _ => PostRepositoryError::query("database error"),
    }
}

/// Map a transaction failure for a write that touches `owner_id`'s counter.
fn map_counter_tx_error(error: TxError, owner_id: &UserId, post_id: &PostId) -> PostRepositoryError {
    let owner = owner_id.to_string();
    match error {
        TxError::OwnerMissing => PostRepositoryError::owner_missing(owner),
        TxError::CounterExhausted => {
            PostRepositoryError::counter_rejected(owner, "post count would become negative")
        }
        TxError::PostNotFound => PostRepositoryError::not_found(post_id.to_string()),
        TxError::Diesel(error) => match classify_diesel_error(error) {
            DieselFailure::ForeignKeyViolation => PostRepositoryError::owner_missing(owner),
            DieselFailure::CheckViolation => {
                PostRepositoryError::counter_rejected(owner, "post count would become negative")
            }
            // The connection dropped mid-transaction, so the commit outcome is unknown.
            DieselFailure::Connection(_) => {
                PostRepositoryError::consistency_failure(owner, "transaction outcome unknown")
            }
            DieselFailure::UniqueViolation(_) | DieselFailure::Query(_) => {
                PostRepositoryError::query("database error")
            }
        },
    }
}

async fn adjust_post_count(
    conn: &mut AsyncPgConnection,
    owner: Uuid,
    adjustment: PostCountAdjustment,
) -> Result<(), TxError> {
    let delta = adjustment.delta();
    let updated = diesel::update(
        users::table
            .filter(users::id.eq(owner))
            .filter(users::post_count.ge(-delta)),
    )
    .set(users::post_count.eq(users::post_count + delta))
    .execute(conn)
    .await?;

    if updated == 0 {
        debug!(owner_id = %owner, ?adjustment, "post count row not adjusted");
        let owner_exists: bool =
            diesel::select(diesel::dsl::exists(users::table.filter(users::id.eq(owner))))
                .get_result(conn)
                .await?;
        return Err(if owner_exists {
            TxError::CounterExhausted
        } else {
            TxError::OwnerMissing
        });
    }
    Ok(())
}

fn row_to_post(row: PostRow) -> Result<Post, PostRepositoryError> {
    let PostRow {
        id,
        user_id,
        title,
        content,
        created_at,
        updated_at,
    } = row;
    let draft = PostDraft::try_from_parts(title, content).map_err(|err| {
        tracing::warn!(post_id = %id, error = %err, "stored post failed validation");
        PostRepositoryError::query("stored post is invalid")
    })?;
    Ok(Post::new(
        PostId::from_uuid(id),
        UserId::from_uuid(user_id),
        draft,
        created_at,
        updated_at,
    ))
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn create(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = *post.owner_id().as_uuid();
        let row = NewPostRow {
            id: *post.id().as_uuid(),
            user_id: owner,
            title: post.title(),
            content: post.content(),
            created_at: post.created_at(),
            updated_at: post.updated_at(),
        };

        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                diesel::insert_into(posts::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                adjust_post_count(conn, owner, PostCountAdjustment::Increment).await
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_counter_tx_error(err, post.owner_id(), &post.id()))
    }

    async fn find_live(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        posts::table
            .filter(posts::id.eq(id.as_uuid()))
            .filter(posts::deleted_at.is_null())
            .select(PostRow::as_select())
            .first::<PostRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_post)
            .transpose()
    }

    async fn list_live(&self) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PostRow> = posts::table
            .filter(posts::deleted_at.is_null())
            .order((posts::created_at.desc(), posts::id.desc()))
            .select(PostRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_post).collect()
    }

    async fn update(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = PostUpdate {
            title: post.title(),
            content: post.content(),
            updated_at: post.updated_at(),
        };
        let updated = diesel::update(
            posts::table
                .filter(posts::id.eq(post.id().as_uuid()))
                .filter(posts::deleted_at.is_null()),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(PostRepositoryError::not_found(post.id().to_string()));
        }
        Ok(())
    }

    async fn soft_delete(
        &self,
        id: &PostId,
        owner_id: &UserId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post = *id.as_uuid();
        let owner = *owner_id.as_uuid();

        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let deleted = diesel::update(
                    posts::table
                        .filter(posts::id.eq(post))
                        .filter(posts::user_id.eq(owner))
                        .filter(posts::deleted_at.is_null()),
                )
                .set(posts::deleted_at.eq(Some(deleted_at)))
                .execute(conn)
                .await?;
                if deleted == 0 {
                    return Err(TxError::PostNotFound);
                }
                adjust_post_count(conn, owner, PostCountAdjustment::Decrement).await
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_counter_tx_error(err, owner_id, id))
    }

    async fn recount(
        &self,
        owner_id: &UserId,
    ) -> Result<PostCountReconciliation, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = *owner_id.as_uuid();

        let (previous, actual) = conn
            .transaction::<_, TxError, _>(|conn| {
                async move {
                    let previous: Option<i64> = users::table
                        .filter(users::id.eq(owner))
                        .select(users::post_count)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(previous) = previous else {
                        return Err(TxError::OwnerMissing);
                    };
                    let actual: i64 = posts::table
                        .filter(posts::user_id.eq(owner))
                        .filter(posts::deleted_at.is_null())
                        .count()
                        .get_result(conn)
                        .await?;
                    diesel::update(users::table.filter(users::id.eq(owner)))
                        .set(users::post_count.eq(actual))
                        .execute(conn)
                        .await?;
                    Ok((previous, actual))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| match err {
                TxError::OwnerMissing => PostRepositoryError::owner_missing(owner_id.to_string()),
                TxError::CounterExhausted | TxError::PostNotFound => {
                    PostRepositoryError::query("unexpected recount outcome")
                }
                TxError::Diesel(error) => map_diesel_error(error),
            })?;

        let to_count = |value: i64| {
            u64::try_from(value).map_err(|_| PostRepositoryError::query("stored post count is negative"))
        };
        Ok(PostCountReconciliation {
            owner_id: owner_id.clone(),
            previous: to_count(previous)?,
            actual: to_count(actual)?,
        })
    }
}
