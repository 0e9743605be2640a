//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates the annotated handlers of the inbound HTTP layer and
//! the JSON shapes they exchange. It declares the `bearer` security scheme
//! used by every authenticated route; public routes opt out per operation.
//!
//! The generated document backs Swagger UI in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{AuthenticatedUser, Comment, Error, ErrorCode, Post, UserProfile};
use crate::inbound::http::auth::{LoginRequest, RegisterRequest};
use crate::inbound::http::comments::CommentPayload;
use crate::inbound::http::posts::PostPayload;

/// Name of the bearer security scheme referenced by handler annotations.
pub const BEARER_SCHEME: &str = "bearer";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Identity token returned by the register and login endpoints.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Inkwell API",
        description = "Accounts, bearer-token authentication, and owner-scoped posts and comments."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::posts::list_posts,
        crate::inbound::http::posts::get_post,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::update_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::comments::list_comments,
        crate::inbound::http::comments::create_comment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        AuthenticatedUser,
        UserProfile,
        Post,
        Comment,
        Error,
        ErrorCode,
        RegisterRequest,
        LoginRequest,
        PostPayload,
        CommentPayload,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "posts", description = "Owner-scoped posts"),
        (name = "comments", description = "Comments attached to posts"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
