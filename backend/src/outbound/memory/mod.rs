//! In-memory store implementing every repository port.
//!
//! All state sits behind one mutex, so each repository call is a single
//! all-or-nothing critical section, which gives post writes and counter
//! adjustments the same atomicity a database transaction would. The lock is
//! never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    CommentRepository, CommentRepositoryError, PostCountReconciliation, PostRepository,
    PostRepositoryError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Comment, Email, Owned, Post, PostCountAdjustment, PostId, User, UserId, Username,
};

#[derive(Debug)]
struct PostRow {
    post: Post,
    deleted_at: Option<DateTime<Utc>>,
    sequence: u64,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    posts: HashMap<PostId, PostRow>,
    comments: Vec<Comment>,
    next_sequence: u64,
}

impl State {
    fn live_post_count(&self, owner_id: &UserId) -> u64 {
        let count = self
            .posts
            .values()
            .filter(|row| row.deleted_at.is_none() && row.post.owner_id() == owner_id)
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    /// Compute the owner's adjusted record without storing it.
    fn adjusted_owner(
        &self,
        owner_id: &UserId,
        adjustment: PostCountAdjustment,
    ) -> Result<User, PostRepositoryError> {
        let owner = self
            .users
            .get(owner_id)
            .ok_or_else(|| PostRepositoryError::owner_missing(owner_id.to_string()))?;
        let post_count = adjustment.apply(owner.post_count()).ok_or_else(|| {
            PostRepositoryError::counter_rejected(
                owner_id.to_string(),
                "post count would leave the valid range",
            )
        })?;
        Ok(with_post_count(owner, post_count))
    }
}

fn with_post_count(user: &User, post_count: u64) -> User {
    User::new(
        user.id().clone(),
        user.username().clone(),
        user.email().clone(),
        user.password_hash().clone(),
        post_count,
    )
}

/// Process-local store for development and tests.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use inkwell::outbound::memory::InMemoryStore;
///
/// let store = Arc::new(InMemoryStore::default());
/// let _users: Arc<dyn inkwell::domain::ports::UserRepository> = store.clone();
/// let _posts: Arc<dyn inkwell::domain::ports::PostRepository> = store;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic mid-operation never leaves partial writes, so the state is usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.username() == user.username()) {
            return Err(UserPersistenceError::duplicate("username"));
        }
        if state.users.values().any(|u| u.email() == user.email()) {
            return Err(UserPersistenceError::duplicate("email"));
        }
        state.users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().users.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn list_ids(&self) -> Result<Vec<UserId>, UserPersistenceError> {
        Ok(self.lock().users.keys().cloned().collect())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut state = self.lock();
        let owner = state.adjusted_owner(post.owner_id(), PostCountAdjustment::Increment)?;
        let sequence = state.next_sequence;
        state.next_sequence = sequence.saturating_add(1);
        state.posts.insert(
            post.id(),
            PostRow {
                post: post.clone(),
                deleted_at: None,
                sequence,
            },
        );
        state.users.insert(owner.id().clone(), owner);
        Ok(())
    }

    async fn find_live(&self, id: &PostId) -> Result<Option<Post>, PostRepositoryError> {
        Ok(self
            .lock()
            .posts
            .get(id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.post.clone()))
    }

    async fn list_live(&self) -> Result<Vec<Post>, PostRepositoryError> {
        let state = self.lock();
        let mut rows: Vec<&PostRow> = state
            .posts
            .values()
            .filter(|row| row.deleted_at.is_none())
            .collect();
        rows.sort_by(|a, b| {
            b.post
                .created_at()
                .cmp(&a.post.created_at())
                .then(b.sequence.cmp(&a.sequence))
        });
        Ok(rows.into_iter().map(|row| row.post.clone()).collect())
    }

    async fn update(&self, post: &Post) -> Result<(), PostRepositoryError> {
        let mut state = self.lock();
        match state.posts.get_mut(&post.id()) {
            Some(row) if row.deleted_at.is_none() => {
                row.post = post.clone();
                Ok(())
            }
            _ => Err(PostRepositoryError::not_found(post.id().to_string())),
        }
    }

    async fn soft_delete(
        &self,
        id: &PostId,
        owner_id: &UserId,
        deleted_at: DateTime<Utc>,
    ) -> Result<(), PostRepositoryError> {
        let mut state = self.lock();
        let is_live_and_owned = state
            .posts
            .get(id)
            .is_some_and(|row| row.deleted_at.is_none() && row.post.owner_id() == owner_id);
        if !is_live_and_owned {
            return Err(PostRepositoryError::not_found(id.to_string()));
        }
        let owner = state.adjusted_owner(owner_id, PostCountAdjustment::Decrement)?;
        if let Some(row) = state.posts.get_mut(id) {
            row.deleted_at = Some(deleted_at);
        }
        state.users.insert(owner.id().clone(), owner);
        Ok(())
    }

    async fn recount(
        &self,
        owner_id: &UserId,
    ) -> Result<PostCountReconciliation, PostRepositoryError> {
        let mut state = self.lock();
        let actual = state.live_post_count(owner_id);
        let owner = state
            .users
            .get(owner_id)
            .ok_or_else(|| PostRepositoryError::owner_missing(owner_id.to_string()))?;
        let previous = owner.post_count();
        let corrected = with_post_count(owner, actual);
        state.users.insert(owner_id.clone(), corrected);
        Ok(PostCountReconciliation {
            owner_id: owner_id.clone(),
            previous,
            actual,
        })
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert(&self, comment: &Comment) -> Result<(), CommentRepositoryError> {
        self.lock().comments.push(comment.clone());
        Ok(())
    }

    async fn list_for_post(
        &self,
        post_id: &PostId,
    ) -> Result<Vec<Comment>, CommentRepositoryError> {
        let state = self.lock();
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|comment| comment.post_id() == *post_id)
            .cloned()
            .collect();
        comments.sort_by_key(Comment::created_at);
        Ok(comments)
    }
}
