//! Registration and login handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"username":"alice","email":"alice@example.com","password":"hunter22"}
//! POST /api/v1/auth/login    {"username":"alice","password":"hunter22"}
//! ```
//!
//! Both return `{"token": "...", "user": {...}}`; the token goes into the
//! `Authorization: Bearer <token>` header of later requests.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    AuthenticatedUser, Error, LoginCredentials, LoginValidationError, Registration,
    UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Registration request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = UserValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.email, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyUsername => ("username", "empty_username"),
        LoginValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

fn map_registration_error(err: UserValidationError) -> Error {
    let field = match err {
        UserValidationError::EmptyEmail
        | UserValidationError::EmailTooLong { .. }
        | UserValidationError::InvalidEmail => "email",
        _ => "username",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Create an account and return a bearer token for it.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthenticatedUser),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Username or email already taken", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration =
        Registration::try_from(payload.into_inner()).map_err(map_registration_error)?;
    let authenticated = state.registration.register(&registration).await?;
    Ok(HttpResponse::Created().json(authenticated))
}

/// Exchange a username and password for a bearer token.
///
/// Unknown usernames and wrong passwords produce the same response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthenticatedUser),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthenticatedUser>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let authenticated = state.login.authenticate(&credentials).await?;
    Ok(web::Json(authenticated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;

    use crate::domain::{ErrorCode, UserId, UserProfile};
    use crate::inbound::http::test_utils::MockPorts;

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            token: "token-value".to_owned(),
            user: UserProfile {
                id: UserId::random().to_string(),
                username: "alice".to_owned(),
                email: "alice@example.com".to_owned(),
                post_count: 0,
            },
        }
    }

    async fn post_json(ports: MockPorts, uri: &str, body: Value) -> actix_web::dev::ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(ports.into_state())
                .service(web::scope("/api/v1").service(register).service(login)),
        )
        .await;
        test::call_service(
            &app,
            test::TestRequest::post().uri(uri).set_json(body).to_request(),
        )
        .await
    }

    #[rstest]
    #[actix_web::test]
    async fn register_returns_created_with_token() {
        let mut ports = MockPorts::default();
        ports
            .registration
            .expect_register()
            .withf(|registration| registration.username().as_ref() == "alice")
            .times(1)
            .return_once(|_| Ok(alice()));

        let response = post_json(
            ports,
            "/api/v1/auth/register",
            json!({"username": "alice", "email": "alice@example.com", "password": "hunter222"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["token"], "token-value");
        assert_eq!(body["user"]["postCount"], 0);
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn register_rejects_invalid_email_before_service() {
        let mut ports = MockPorts::default();
        ports.registration.expect_register().times(0);

        let response = post_json(
            ports,
            "/api/v1/auth/register",
            json!({"username": "alice", "email": "nope", "password": "hunter222"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Error = test::read_body_json(response).await;
        assert_eq!(body.details(), Some(&json!({"field": "email"})));
    }

    #[rstest]
    #[actix_web::test]
    async fn register_surfaces_conflict() {
        let mut ports = MockPorts::default();
        ports
            .registration
            .expect_register()
            .return_once(|_| Err(Error::conflict("username already exists")));

        let response = post_json(
            ports,
            "/api/v1/auth/register",
            json!({"username": "alice", "email": "alice@example.com", "password": "hunter222"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[actix_web::test]
    async fn login_returns_token() {
        let mut ports = MockPorts::default();
        ports
            .login
            .expect_authenticate()
            .withf(|credentials| credentials.username() == "alice")
            .return_once(|_| Ok(alice()));

        let response = post_json(
            ports,
            "/api/v1/auth/login",
            json!({"username": " alice ", "password": "hunter222"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: AuthenticatedUser = test::read_body_json(response).await;
        assert_eq!(body.token, "token-value");
    }

    #[rstest]
    #[actix_web::test]
    async fn login_rejects_blank_password() {
        let mut ports = MockPorts::default();
        ports.login.expect_authenticate().times(0);

        let response = post_json(
            ports,
            "/api/v1/auth/login",
            json!({"username": "alice", "password": ""}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Error = test::read_body_json(response).await;
        assert_eq!(body.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[actix_web::test]
    async fn login_failure_is_unauthorised() {
        let mut ports = MockPorts::default();
        ports
            .login
            .expect_authenticate()
            .return_once(|_| Err(Error::unauthorized("invalid username or password")));

        let response = post_json(
            ports,
            "/api/v1/auth/login",
            json!({"username": "alice", "password": "wrong-password"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Error = test::read_body_json(response).await;
        assert_eq!(body.message(), "invalid username or password");
    }
}
