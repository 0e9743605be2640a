//! Posts and their validated content.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::ownership::Owned;
use super::user::UserId;

/// Maximum title length in characters.
pub const POST_TITLE_MAX: usize = 200;

/// Validation errors for post drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    EmptyContent,
}

impl fmt::Display for PostValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::EmptyContent => write!(f, "content must not be empty"),
        }
    }
}

impl std::error::Error for PostValidationError {}

/// Stable post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
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

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Validated title and body for creating or replacing a post.
///
/// # Examples
/// ```
/// use inkwell::domain::{PostDraft, PostValidationError};
///
/// assert!(PostDraft::try_from_parts("Hello", "First post").is_ok());
/// assert_eq!(
///     PostDraft::try_from_parts("", "body").unwrap_err(),
///     PostValidationError::EmptyTitle
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    title: String,
    content: String,
}

impl PostDraft {
    pub fn try_from_parts(
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, PostValidationError> {
        let title = title.into();
        let content = content.into();
        if title.trim().is_empty() {
            return Err(PostValidationError::EmptyTitle);
        }
        if title.chars().count() > POST_TITLE_MAX {
            return Err(PostValidationError::TitleTooLong {
                max: POST_TITLE_MAX,
            });
        }
        if content.trim().is_empty() {
            return Err(PostValidationError::EmptyContent);
        }
        Ok(Self { title, content })
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }
}

/// A live (not soft-deleted) post.
///
/// ## Invariants
/// - `owner_id` never changes after creation and references an existing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[schema(value_type = String, example = "6f1c2a4e-8d4b-4c53-9a59-0d2a3c1b7e11")]
    id: PostId,
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    owner_id: UserId,
    #[schema(example = "Hello")]
    title: String,
    #[schema(example = "First post")]
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Post {
    /// Build a new post authored now.
    pub fn create(id: PostId, owner_id: UserId, draft: PostDraft, now: DateTime<Utc>) -> Self {
        Self::new(id, owner_id, draft, now, now)
    }

    /// Rehydrate a post from storage.
    pub fn new(
        id: PostId,
        owner_id: UserId,
        draft: PostDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let PostDraft { title, content } = draft;
        Self {
            id,
            owner_id,
            title,
            content,
            created_at,
            updated_at,
        }
    }

    /// Replace title and content, keeping identity and ownership.
    pub fn revise(mut self, draft: PostDraft, now: DateTime<Utc>) -> Self {
        let PostDraft { title, content } = draft;
        self.title = title;
        self.content = content;
        self.updated_at = now;
        self
    }

    pub fn id(&self) -> PostId {
        self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Owned for Post {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}
