//! Post handlers.
//!
//! ```text
//! GET    /api/v1/posts
//! GET    /api/v1/posts/{post_id}
//! POST   /api/v1/posts            {"title":"Hello","content":"First post"}   (bearer)
//! PUT    /api/v1/posts/{post_id}  {"title":"Hello","content":"Edited"}       (bearer, owner)
//! DELETE /api/v1/posts/{post_id}                                             (bearer, owner)
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreatePostRequest, PostFields, UpdatePostRequest};
use crate::domain::{Error, Identity, Post, PostId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::decode;
use crate::inbound::http::state::HttpState;

/// Title and content of a post.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    #[schema(example = "Hello")]
    pub title: String,
    #[schema(example = "First post")]
    pub content: String,
}

/// List live posts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    responses(
        (status = 200, description = "Posts", body = [Post]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["posts"],
    operation_id = "listPosts",
    security([])
)]
#[get("/posts")]
pub async fn list_posts(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Post>>> {
    Ok(web::Json(state.posts_query.list().await?))
}

/// Fetch one live post.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}",
    params(("post_id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 400, description = "Malformed post id", body = Error),
        (status = 404, description = "Post not found", body = Error)
    ),
    tags = ["posts"],
    operation_id = "getPost",
    security([])
)]
#[get("/posts/{post_id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    path: web::Path<PostId>,
) -> ApiResult<web::Json<Post>> {
    Ok(web::Json(state.posts_query.get(path.into_inner()).await?))
}

/// Publish a post owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = PostPayload,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["posts"],
    operation_id = "createPost",
    security(("bearer" = []))
)]
#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    identity: Identity,
    payload: web::Json<PostPayload>,
) -> ApiResult<HttpResponse> {
    let PostPayload { title, content } = payload.into_inner();
    let post = state
        .posts
        .create(&identity, CreatePostRequest { title, content })
        .await?;
    Ok(HttpResponse::Created().json(post))
}

/// Replace the title and content of a post the caller owns.
///
/// The body is decoded here but judged only after the existence and
/// ownership checks.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{post_id}",
    params(("post_id" = String, Path, description = "Post identifier")),
    request_body = PostPayload,
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Caller does not own the post", body = Error),
        (status = 404, description = "Post not found", body = Error)
    ),
    tags = ["posts"],
    operation_id = "updatePost",
    security(("bearer" = []))
)]
#[put("/posts/{post_id}")]
pub async fn update_post(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<PostId>,
    body: web::Bytes,
) -> ApiResult<web::Json<Post>> {
    let fields = decode::<PostPayload>(&body)
        .map(|PostPayload { title, content }| PostFields { title, content });
    let request = UpdatePostRequest {
        post_id: path.into_inner(),
        fields,
    };
    Ok(web::Json(state.posts.update(&identity, request).await?))
}

/// Soft-delete a post the caller owns.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{post_id}",
    params(("post_id" = String, Path, description = "Post identifier")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 403, description = "Caller does not own the post", body = Error),
        (status = 404, description = "Post not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["posts"],
    operation_id = "deletePost",
    security(("bearer" = []))
)]
#[delete("/posts/{post_id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<PostId>,
) -> ApiResult<HttpResponse> {
    state.posts.delete(&identity, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use actix_web::{App, test};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::domain::ports::Submission;
    use crate::domain::{PostDraft, UserId};
    use crate::inbound::http::error::path_error_handler;
    use crate::inbound::http::test_utils::{MockPorts, bearer_for, test_tokens};

    fn sample_post(owner: UserId) -> Post {
        let draft = PostDraft::try_from_parts("Hello", "First post").expect("valid draft");
        Post::create(PostId::random(), owner, draft, Utc::now())
    }

    async fn call(ports: MockPorts, request: test::TestRequest) -> actix_web::dev::ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(ports.into_state())
                .app_data(test_tokens())
                .app_data(web::PathConfig::default().error_handler(path_error_handler))
                .service(
                    web::scope("/api/v1")
                        .service(list_posts)
                        .service(get_post)
                        .service(create_post)
                        .service(update_post)
                        .service(delete_post),
                ),
        )
        .await;
        test::call_service(&app, request.to_request()).await
    }

    #[rstest]
    #[actix_web::test]
    async fn create_requires_bearer_token() {
        let mut ports = MockPorts::default();
        ports.posts.expect_create().times(0);

        let response = call(
            ports,
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .set_json(json!({"title": "Hello", "content": "First post"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn create_passes_identity_to_service() {
        let (identity, header) = bearer_for(&test_tokens(), "alice");
        let owner = identity.user_id().clone();
        let post = sample_post(owner.clone());
        let mut ports = MockPorts::default();
        ports
            .posts
            .expect_create()
            .withf(move |caller, request| caller.user_id() == &owner && request.title == "Hello")
            .times(1)
            .return_once(move |_, _| Ok(post));

        let response = call(
            ports,
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .insert_header((AUTHORIZATION, header))
                .set_json(json!({"title": "Hello", "content": "First post"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["title"], "Hello");
    }

    #[rstest]
    #[actix_web::test]
    async fn update_by_non_owner_is_forbidden() {
        let (_, header) = bearer_for(&test_tokens(), "bob");
        let mut ports = MockPorts::default();
        ports
            .posts
            .expect_update()
            .return_once(|_, _| Err(Error::forbidden("not yours")));

        let response = call(
            ports,
            test::TestRequest::put()
                .uri(&format!("/api/v1/posts/{}", PostId::random()))
                .insert_header((AUTHORIZATION, header))
                .set_json(json!({"title": "Hijack", "content": "Mine now"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[case::missing_fields("{}", StatusCode::NOT_FOUND, "post not found")]
    #[case::wrong_type(r#"{"title":1}"#, StatusCode::FORBIDDEN, "not yours")]
    #[actix_web::test]
    async fn undecodable_update_reaches_the_service(
        #[case] body: &'static str,
        #[case] expected: StatusCode,
        #[case] outcome: &'static str,
    ) {
        let (_, header) = bearer_for(&test_tokens(), "bob");
        let mut ports = MockPorts::default();
        ports
            .posts
            .expect_update()
            .withf(|_, request| matches!(request.fields, Submission::Undecodable(_)))
            .times(1)
            .return_once(move |_, _| {
                Err(if expected == StatusCode::NOT_FOUND {
                    Error::not_found(outcome)
                } else {
                    Error::forbidden(outcome)
                })
            });

        let response = call(
            ports,
            test::TestRequest::put()
                .uri(&format!("/api/v1/posts/{}", PostId::random()))
                .insert_header((AUTHORIZATION, header))
                .insert_header((CONTENT_TYPE, "application/json"))
                .set_payload(body),
        )
        .await;

        assert_eq!(response.status(), expected);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["message"], outcome);
    }

    #[rstest]
    #[actix_web::test]
    async fn update_forwards_decoded_fields() {
        let (identity, header) = bearer_for(&test_tokens(), "alice");
        let post = sample_post(identity.user_id().clone());
        let mut ports = MockPorts::default();
        ports
            .posts
            .expect_update()
            .withf(|_, request| {
                request.fields
                    == Submission::decoded(PostFields {
                        title: "Hello".to_owned(),
                        content: "Edited".to_owned(),
                    })
            })
            .times(1)
            .return_once(move |_, _| Ok(post));

        let response = call(
            ports,
            test::TestRequest::put()
                .uri(&format!("/api/v1/posts/{}", PostId::random()))
                .insert_header((AUTHORIZATION, header))
                .set_json(json!({"title": "Hello", "content": "Edited"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn delete_returns_no_content() {
        let (_, header) = bearer_for(&test_tokens(), "alice");
        let post_id = PostId::random();
        let mut ports = MockPorts::default();
        ports
            .posts
            .expect_delete()
            .withf(move |_, id| *id == post_id)
            .times(1)
            .return_once(|_, _| Ok(()));

        let response = call(
            ports,
            test::TestRequest::delete()
                .uri(&format!("/api/v1/posts/{post_id}"))
                .insert_header((AUTHORIZATION, header)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[rstest]
    #[actix_web::test]
    async fn malformed_post_id_is_bad_request() {
        let response = call(
            MockPorts::default(),
            test::TestRequest::get().uri("/api/v1/posts/not-a-uuid"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_post_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .posts_query
            .expect_get()
            .return_once(|_| Err(Error::not_found("post not found")));

        let response = call(
            ports,
            test::TestRequest::get().uri(&format!("/api/v1/posts/{}", PostId::random())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn list_is_public() {
        let mut ports = MockPorts::default();
        let post = sample_post(UserId::random());
        ports
            .posts_query
            .expect_list()
            .return_once(move || Ok(vec![post]));

        let response = call(ports, test::TestRequest::get().uri("/api/v1/posts")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Vec<Value> = test::read_body_json(response).await;
        assert_eq!(body.len(), 1);
    }
}
