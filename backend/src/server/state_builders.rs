//! Builders wiring repository adapters into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use inkwell::domain::ports::{CommentRepository, PostRepository, UserRepository};
use inkwell::domain::{AccountService, CommentService, CredentialManager, PostService, TokenService};
use inkwell::inbound::http::state::{HttpState, HttpStatePorts};
use inkwell::outbound::memory::InMemoryStore;
use inkwell::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselPostRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Compose the domain services over one set of repositories.
fn build_ports<U, P, C>(
    users: Arc<U>,
    posts: Arc<P>,
    comments: Arc<C>,
    tokens: Arc<TokenService>,
) -> HttpStatePorts
where
    U: UserRepository + 'static,
    P: PostRepository + 'static,
    C: CommentRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let accounts = Arc::new(AccountService::new(
        users,
        CredentialManager::default(),
        tokens,
    ));
    let post_service = Arc::new(PostService::new(posts.clone(), clock.clone()));
    let comment_service = Arc::new(CommentService::new(comments, posts, clock));

    HttpStatePorts {
        login: accounts.clone(),
        registration: accounts,
        posts: post_service.clone(),
        posts_query: post_service,
        comments: comment_service.clone(),
        comments_query: comment_service,
    }
}

fn diesel_ports(pool: &DbPool, tokens: Arc<TokenService>) -> HttpStatePorts {
    build_ports(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselPostRepository::new(pool.clone())),
        Arc::new(DieselCommentRepository::new(pool.clone())),
        tokens,
    )
}

fn memory_ports(tokens: Arc<TokenService>) -> HttpStatePorts {
    let store = Arc::new(InMemoryStore::new());
    build_ports(store.clone(), store.clone(), store, tokens)
}

/// Build the HTTP state from configuration.
///
/// Uses the Diesel repositories when a pool is configured and the in-memory
/// store otherwise.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let tokens = config.tokens.clone();
    let ports = match &config.db_pool {
        Some(pool) => diesel_ports(pool, tokens),
        None => memory_ports(tokens),
    };
    web::Data::new(HttpState::new(ports))
}
