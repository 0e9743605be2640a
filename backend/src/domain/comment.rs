//! Comments attached to posts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::post::PostId;
use super::user::UserId;

/// Maximum comment length in characters.
pub const COMMENT_MAX: usize = 1000;

/// Validation errors for comment bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    EmptyContent,
    ContentTooLong { max: usize },
}

impl fmt::Display for CommentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "comment must not be empty"),
            Self::ContentTooLong { max } => {
                write!(f, "comment must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for CommentValidationError {}

/// Stable comment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Comment text between 1 and [`COMMENT_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent(String);

impl CommentContent {
    pub fn new(content: impl Into<String>) -> Result<Self, CommentValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(CommentValidationError::EmptyContent);
        }
        if content.chars().count() > COMMENT_MAX {
            return Err(CommentValidationError::ContentTooLong { max: COMMENT_MAX });
        }
        Ok(Self(content))
    }
}

impl AsRef<str> for CommentContent {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// A comment left by `commenter_id` on `post_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[schema(value_type = String)]
    id: CommentId,
    #[schema(value_type = String)]
    post_id: PostId,
    #[schema(value_type = String)]
    commenter_id: UserId,
    #[schema(value_type = String, example = "Nice post!")]
    #[serde(serialize_with = "serialize_content")]
    content: CommentContent,
    created_at: DateTime<Utc>,
}

fn serialize_content<S: serde::Serializer>(
    content: &CommentContent,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(content.as_ref())
}

impl Comment {
    pub fn new(
        id: CommentId,
        post_id: PostId,
        commenter_id: UserId,
        content: CommentContent,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            post_id,
            commenter_id,
            content,
            created_at,
        }
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn commenter_id(&self) -> &UserId {
        &self.commenter_id
    }

    pub fn content(&self) -> &str {
        self.content.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
