//! Domain primitives, services, and ports.
//!
//! Purpose: define strongly typed entities, the credential and token
//! machinery, ownership checks, and the use-case services that inbound
//! adapters drive. Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - CredentialManager: password hashing and verification.
//! - TokenService: signed identity token issuance and validation.
//! - Identity: per-request authenticated principal.
//! - authorize: ownership decision for mutating owned resources.
//! - AccountService, PostService, CommentService: driving port implementations.

pub mod account_service;
pub mod auth;
pub mod comment;
pub mod comment_service;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod ownership;
pub mod ports;
pub mod post;
pub mod post_count;
pub mod post_service;
pub mod token;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{AuthenticatedUser, LoginCredentials, LoginValidationError, Registration};
pub use self::comment::{
    COMMENT_MAX, Comment, CommentContent, CommentId, CommentValidationError,
};
pub use self::comment_service::CommentService;
pub use self::credentials::{
    CredentialError, CredentialManager, PASSWORD_MAX_BYTES, PASSWORD_MIN_BYTES, PasswordHash,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::Identity;
pub use self::ownership::{Authorization, Owned, authorize};
pub use self::post::{POST_TITLE_MAX, Post, PostDraft, PostId, PostValidationError};
pub use self::post_count::{POST_COUNT_ALERT, PostCountAdjustment};
pub use self::post_service::PostService;
pub use self::token::{Claims, DEFAULT_TOKEN_TTL, TokenError, TokenService, TokenSettings};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Email, User, UserId, UserProfile, UserValidationError, Username};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use inkwell::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
