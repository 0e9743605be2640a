//! End-to-end behaviour of registration, login, and owner-scoped posting.
//!
//! The full HTTP stack runs against the in-memory store with a clock the test
//! controls, so token expiry is exercised without sleeping.

use std::sync::Arc;
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use argon2::Params;
use chrono::{TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use inkwell::Trace;
use inkwell::domain::{
    AccountService, CommentService, CredentialManager, PostService, TRACE_ID_HEADER,
    TokenService, TokenSettings,
};
use inkwell::inbound::http::configure_api;
use inkwell::inbound::http::error::json_error_handler;
use inkwell::inbound::http::state::{HttpState, HttpStatePorts};
use inkwell::outbound::memory::InMemoryStore;
use inkwell::test_support::MutableClock;

const SECRET: &[u8] = b"publishing-flow-secret-of-32-bytes!!";
const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
const ALICE_PASSWORD: &str = "correct horse battery";
const BOB_PASSWORD: &str = "staple battery horse";

struct World {
    clock: Arc<MutableClock>,
    state: web::Data<HttpState>,
    tokens: web::Data<TokenService>,
}

#[fixture]
fn world() -> World {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid start time");
    let clock = Arc::new(MutableClock::new(start));
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let tokens = Arc::new(TokenService::new(
        TokenSettings::new(SECRET.to_vec(), TOKEN_TTL),
        shared_clock.clone(),
    ));
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("minimal argon2 params");
    let store = Arc::new(InMemoryStore::new());

    let accounts = Arc::new(AccountService::new(
        store.clone(),
        CredentialManager::with_params(params),
        tokens.clone(),
    ));
    let posts = Arc::new(PostService::new(store.clone(), shared_clock.clone()));
    let comments = Arc::new(CommentService::new(store.clone(), store, shared_clock));

    let state = web::Data::new(HttpState::new(HttpStatePorts {
        login: accounts.clone(),
        registration: accounts,
        posts: posts.clone(),
        posts_query: posts,
        comments: comments.clone(),
        comments_query: comments,
    }));

    World {
        clock,
        state,
        tokens: web::Data::from(tokens),
    }
}

async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    assert!(
        res.headers().contains_key(TRACE_ID_HEADER),
        "every response carries a trace id"
    );
    let body = test::read_body(res).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, json)
}

fn register(username: &str, password: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
        }))
        .to_request()
}

fn login(username: &str, password: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request()
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn token_of(body: &Value) -> String {
    body["token"].as_str().expect("token in body").to_owned()
}

#[rstest]
#[actix_web::test]
async fn publishing_scenario(world: World) {
    let World {
        clock,
        state,
        tokens,
    } = world;
    let app = test::init_service(
        App::new()
            .app_data(state)
            .app_data(tokens)
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;

    let (status, body) = send(&app, register("alice", ALICE_PASSWORD)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["postCount"], 0);
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = send(&app, register("alice", ALICE_PASSWORD)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, body) = send(&app, login("alice", "wrong password!")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, unknown) = send(&app, login("mallory", "wrong password!")).await;
    assert_eq!(body["message"], unknown["message"]);

    let (status, body) = send(&app, login("alice", ALICE_PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    let alice = token_of(&body);

    let (status, post) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&alice))
            .set_json(json!({ "title": "Hello", "content": "First post" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = post["id"].as_str().expect("post id").to_owned();

    let (_, body) = send(&app, login("alice", ALICE_PASSWORD)).await;
    assert_eq!(body["user"]["postCount"], 1);

    let (status, body) = send(&app, register("bob", BOB_PASSWORD)).await;
    assert_eq!(status, StatusCode::CREATED);
    let bob = token_of(&body);

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/posts/{post_id}"))
            .insert_header(bearer(&bob))
            .set_json(json!({ "title": "Mine now", "content": "Edited" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _) = send(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/posts/{post_id}/comments"))
            .insert_header(bearer(&bob))
            .set_json(json!({ "content": "Nice post!" }))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    clock.advance(TOKEN_TTL + Duration::from_secs(1));

    let (status, body) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/posts/{post_id}"))
            .insert_header(bearer(&alice))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (_, body) = send(&app, login("alice", ALICE_PASSWORD)).await;
    let fresh = token_of(&body);
    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/posts/{post_id}"))
            .insert_header(bearer(&fresh))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, login("alice", ALICE_PASSWORD)).await;
    assert_eq!(body["user"]["postCount"], 0);

    let (status, _) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/posts/{post_id}"))
            .to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case::missing(None)]
#[case::wrong_scheme(Some("Basic YWxpY2U6cGFzc3dvcmQ="))]
#[case::no_token(Some("Bearer "))]
#[case::garbage(Some("Bearer not.a.token"))]
#[actix_web::test]
async fn protected_routes_reject_without_valid_bearer(
    world: World,
    #[case] authorization: Option<&str>,
) {
    let app = test::init_service(
        App::new()
            .app_data(world.state)
            .app_data(world.tokens)
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;

    let mut request = test::TestRequest::post()
        .uri("/api/v1/posts")
        .set_json(json!({ "title": "Hello", "content": "First post" }));
    if let Some(value) = authorization {
        request = request.insert_header((header::AUTHORIZATION, value));
    }

    let (status, body) = send(&app, request.to_request()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, body) = send(
        &app,
        test::TestRequest::get().uri("/api/v1/posts").to_request(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

fn raw_json(request: test::TestRequest, token: &str, body: &'static str) -> actix_http::Request {
    request
        .insert_header(bearer(token))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(body)
        .to_request()
}

#[rstest]
#[actix_web::test]
async fn missing_posts_and_foreign_owners_are_reported_before_bad_bodies(world: World) {
    let app = test::init_service(
        App::new()
            .app_data(world.state)
            .app_data(world.tokens)
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await;

    let (_, body) = send(&app, register("alice", ALICE_PASSWORD)).await;
    let alice = token_of(&body);
    let (_, body) = send(&app, register("bob", BOB_PASSWORD)).await;
    let bob = token_of(&body);
    let (_, post) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&alice))
            .set_json(json!({ "title": "Hello", "content": "First post" }))
            .to_request(),
    )
    .await;
    let post_id = post["id"].as_str().expect("post id").to_owned();
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send(
        &app,
        raw_json(
            test::TestRequest::post().uri(&format!("/api/v1/posts/{missing}/comments")),
            &bob,
            "{}",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send(
        &app,
        raw_json(
            test::TestRequest::put().uri(&format!("/api/v1/posts/{post_id}")),
            &bob,
            r#"{"title":1}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = send(
        &app,
        raw_json(
            test::TestRequest::put().uri(&format!("/api/v1/posts/{missing}")),
            &alice,
            "{}",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = send(
        &app,
        raw_json(
            test::TestRequest::put().uri(&format!("/api/v1/posts/{post_id}")),
            &alice,
            r#"{"title":1}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let (status, body) = send(
        &app,
        raw_json(
            test::TestRequest::post().uri(&format!("/api/v1/posts/{post_id}/comments")),
            &bob,
            "{}",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}
