//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod bearer;
mod body;
pub mod comments;
pub mod error;
pub mod health;
pub mod posts;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod token_config;

use actix_web::web;

pub use error::ApiResult;

/// Register the versioned API handlers on `cfg`.
///
/// Callers mount this under `/api/v1` and provide `web::Data<HttpState>` and
/// `web::Data<TokenService>` as app data.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::register)
        .service(auth::login)
        .service(posts::list_posts)
        .service(posts::create_post)
        .service(posts::get_post)
        .service(posts::update_post)
        .service(posts::delete_post)
        .service(comments::list_comments)
        .service(comments::create_comment);
}
