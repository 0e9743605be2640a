//! Comment handlers.
//!
//! ```text
//! GET  /api/v1/posts/{post_id}/comments
//! POST /api/v1/posts/{post_id}/comments {"content":"Nice post!"}   (bearer)
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::CreateCommentRequest;
use crate::domain::{Comment, Error, Identity, PostId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::decode;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    #[schema(example = "Nice post!")]
    pub content: String,
}

/// List comments on a live post, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/comments",
    params(("post_id" = String, Path, description = "Post identifier")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Post not found", body = Error)
    ),
    tags = ["comments"],
    operation_id = "listComments",
    security([])
)]
#[get("/posts/{post_id}/comments")]
pub async fn list_comments(
    state: web::Data<HttpState>,
    path: web::Path<PostId>,
) -> ApiResult<web::Json<Vec<Comment>>> {
    let comments = state.comments_query.list_for_post(path.into_inner()).await?;
    Ok(web::Json(comments))
}

/// Comment on a live post as the caller.
///
/// A missing post is reported before anything about the body.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/comments",
    params(("post_id" = String, Path, description = "Post identifier")),
    request_body = CommentPayload,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Missing or invalid token", body = Error),
        (status = 404, description = "Post not found", body = Error)
    ),
    tags = ["comments"],
    operation_id = "createComment",
    security(("bearer" = []))
)]
#[post("/posts/{post_id}/comments")]
pub async fn create_comment(
    state: web::Data<HttpState>,
    identity: Identity,
    path: web::Path<PostId>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let request = CreateCommentRequest {
        post_id: path.into_inner(),
        content: decode::<CommentPayload>(&body).map(|payload| payload.content),
    };
    let comment = state.comments.create(&identity, request).await?;
    Ok(HttpResponse::Created().json(comment))
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
    use crate::domain::{CommentContent, CommentId};
    use crate::inbound::http::test_utils::{MockPorts, bearer_for, test_tokens};

    async fn call(ports: MockPorts, request: test::TestRequest) -> actix_web::dev::ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(ports.into_state())
                .app_data(test_tokens())
                .service(
                    web::scope("/api/v1")
                        .service(list_comments)
                        .service(create_comment),
                ),
        )
        .await;
        test::call_service(&app, request.to_request()).await
    }

    #[rstest]
    #[actix_web::test]
    async fn any_authenticated_user_may_comment() {
        let (identity, header) = bearer_for(&test_tokens(), "bob");
        let post_id = PostId::random();
        let commenter = identity.user_id().clone();
        let mut ports = MockPorts::default();
        ports
            .comments
            .expect_create()
            .withf(move |caller, request| {
                caller.user_id() == &commenter && request.post_id == post_id
            })
            .times(1)
            .return_once(move |caller, request| {
                Ok(Comment::new(
                    CommentId::random(),
                    request.post_id,
                    caller.user_id().clone(),
                    CommentContent::new(request.content.into_fields().expect("decoded body"))
                        .expect("valid content"),
                    Utc::now(),
                ))
            });

        let response = call(
            ports,
            test::TestRequest::post()
                .uri(&format!("/api/v1/posts/{post_id}/comments"))
                .insert_header((AUTHORIZATION, header))
                .set_json(json!({"content": "Nice post!"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["content"], "Nice post!");
    }

    #[rstest]
    #[actix_web::test]
    async fn commenting_requires_token() {
        let mut ports = MockPorts::default();
        ports.comments.expect_create().times(0);

        let response = call(
            ports,
            test::TestRequest::post()
                .uri(&format!("/api/v1/posts/{}/comments", PostId::random()))
                .set_json(json!({"content": "Nice post!"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case::missing_fields("{}")]
    #[case::wrong_type(r#"{"content":false}"#)]
    #[case::not_json("Nice post!")]
    #[actix_web::test]
    async fn undecodable_comment_on_missing_post_is_not_found(#[case] body: &'static str) {
        let (_, header) = bearer_for(&test_tokens(), "bob");
        let mut ports = MockPorts::default();
        ports
            .comments
            .expect_create()
            .withf(|_, request| matches!(request.content, Submission::Undecodable(_)))
            .times(1)
            .return_once(|_, _| Err(Error::not_found("post not found")));

        let response = call(
            ports,
            test::TestRequest::post()
                .uri(&format!("/api/v1/posts/{}/comments", PostId::random()))
                .insert_header((AUTHORIZATION, header))
                .insert_header((CONTENT_TYPE, "application/json"))
                .set_payload(body),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn comments_on_missing_post_are_not_found() {
        let mut ports = MockPorts::default();
        ports
            .comments_query
            .expect_list_for_post()
            .return_once(|_| Err(Error::not_found("post not found")));

        let response = call(
            ports,
            test::TestRequest::get().uri(&format!("/api/v1/posts/{}/comments", PostId::random())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
