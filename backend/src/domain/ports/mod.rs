//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) are implemented by outbound adapters; driving
//! ports (`*Service`, `*Command`, `*Query`) are consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod comment_command;
mod comment_query;
mod comment_repository;
mod login_service;
mod post_command;
mod post_query;
mod post_repository;
mod registration_service;
mod submission;
mod user_repository;

#[cfg(test)]
pub use comment_command::MockCommentCommand;
pub use comment_command::{CommentCommand, CreateCommentRequest};
#[cfg(test)]
pub use comment_query::MockCommentQuery;
pub use comment_query::CommentQuery;
#[cfg(test)]
pub use comment_repository::MockCommentRepository;
pub use comment_repository::{CommentRepository, CommentRepositoryError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use post_command::MockPostCommand;
pub use post_command::{CreatePostRequest, PostCommand, PostFields, UpdatePostRequest};
#[cfg(test)]
pub use post_query::MockPostQuery;
pub use post_query::PostQuery;
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostCountReconciliation, PostRepository, PostRepositoryError};
#[cfg(test)]
pub use registration_service::MockRegistrationService;
pub use registration_service::RegistrationService;
pub use submission::Submission;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
