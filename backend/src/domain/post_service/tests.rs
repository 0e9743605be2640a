//! Tests for the post service.

use std::io;
use std::sync::{Arc, Mutex};

use super::*;
use crate::domain::ports::{MockPostRepository, Submission};
use crate::domain::{ErrorCode, Owned, POST_COUNT_ALERT};
use chrono::Utc;
use rstest::{fixture, rstest};

#[fixture]
fn alice() -> Identity {
    Identity::new(UserId::random(), "alice")
}

fn make_service(repo: MockPostRepository) -> PostService<MockPostRepository> {
    PostService::new(Arc::new(repo), Arc::new(mockable::DefaultClock))
}

fn post_owned_by(owner: &Identity) -> Post {
    Post::create(
        PostId::random(),
        owner.user_id().clone(),
        PostDraft::try_from_parts("Hello", "World").expect("valid draft"),
        Utc::now(),
    )
}

fn update_request(post_id: PostId, title: &str) -> UpdatePostRequest {
    UpdatePostRequest {
        post_id,
        fields: PostFields {
            title: title.to_owned(),
            content: "Revised".to_owned(),
        }
        .into(),
    }
}

fn undecodable_update(post_id: PostId) -> UpdatePostRequest {
    UpdatePostRequest {
        post_id,
        fields: Submission::undecodable("invalid type: integer `1`, expected a string"),
    }
}

#[rstest]
#[tokio::test]
async fn create_assigns_caller_as_owner(alice: Identity) {
    let mut repo = MockPostRepository::new();
    let owner = alice.user_id().clone();
    repo.expect_create()
        .times(1)
        .withf(move |post| post.owner_id() == &owner)
        .return_once(|_| Ok(()));

    let post = make_service(repo)
        .create(
            &alice,
            CreatePostRequest {
                title: "Hello".to_owned(),
                content: "World".to_owned(),
            },
        )
        .await
        .expect("create succeeds");
    assert_eq!(post.owner_id(), alice.user_id());
}

#[rstest]
#[tokio::test]
async fn create_validates_before_writing(alice: Identity) {
    let mut repo = MockPostRepository::new();
    repo.expect_create().never();

    let err = make_service(repo)
        .create(
            &alice,
            CreatePostRequest {
                title: String::new(),
                content: "World".to_owned(),
            },
        )
        .await
        .expect_err("empty title");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

/// Log lines captured from the current thread while a test runs.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log buffer lock").clone();
        String::from_utf8(bytes).expect("utf-8 logs")
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn create_failing_with(error: PostRepositoryError, alice: &Identity) -> (Error, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut repo = MockPostRepository::new();
    repo.expect_create().times(1).return_once(move |_| Err(error));
    let err = make_service(repo)
        .create(
            alice,
            CreatePostRequest {
                title: "Hello".to_owned(),
                content: "World".to_owned(),
            },
        )
        .await
        .expect_err("counter failure aborts create");
    (err, logs.contents())
}

#[rstest]
#[tokio::test]
async fn unknown_commit_outcome_raises_the_counter_alert(alice: Identity) {
    let owner = alice.user_id().to_string();
    let (err, logs) = create_failing_with(
        PostRepositoryError::consistency_failure(owner, "transaction outcome unknown"),
        &alice,
    )
    .await;

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert!(logs.contains(POST_COUNT_ALERT), "alert missing from: {logs}");
}

#[rstest]
#[case::owner_missing(PostRepositoryError::owner_missing("ghost"))]
#[case::counter_rejected(PostRepositoryError::counter_rejected(
    "alice",
    "post count would become negative"
))]
#[tokio::test]
async fn rolled_back_counter_failures_are_plain_internal_errors(
    alice: Identity,
    #[case] error: PostRepositoryError,
) {
    let (err, logs) = create_failing_with(error, &alice).await;

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert!(!logs.contains(POST_COUNT_ALERT), "unexpected alert in: {logs}");
}

#[rstest]
#[tokio::test]
async fn reconciling_a_missing_user_is_not_found() {
    let mut repo = MockPostRepository::new();
    repo.expect_recount()
        .times(1)
        .return_once(|owner| Err(PostRepositoryError::owner_missing(owner.to_string())));

    let err = make_service(repo)
        .reconcile_post_count(&UserId::random())
        .await
        .expect_err("user missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn update_by_non_owner_is_forbidden(alice: Identity) {
    let post = post_owned_by(&alice);
    let post_id = post.id();
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(move |_| Ok(Some(post)));
    repo.expect_update().never();

    let bob = Identity::new(UserId::random(), "bob");
    let err = make_service(repo)
        .update(&bob, update_request(post_id, "Hijacked"))
        .await
        .expect_err("bob does not own the post");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn update_checks_ownership_before_validation(alice: Identity) {
    let post = post_owned_by(&alice);
    let post_id = post.id();
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(move |_| Ok(Some(post)));

    let bob = Identity::new(UserId::random(), "bob");
    let err = make_service(repo)
        .update(&bob, update_request(post_id, ""))
        .await
        .expect_err("forbidden wins over invalid payload");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn update_checks_existence_before_validation(alice: Identity) {
    let mut repo = MockPostRepository::new();
    repo.expect_find_live().times(1).return_once(|_| Ok(None));

    let err = make_service(repo)
        .update(&alice, update_request(PostId::random(), ""))
        .await
        .expect_err("missing post");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn undecodable_update_from_non_owner_is_forbidden(alice: Identity) {
    let post = post_owned_by(&alice);
    let post_id = post.id();
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(move |_| Ok(Some(post)));
    repo.expect_update().never();

    let bob = Identity::new(UserId::random(), "bob");
    let err = make_service(repo)
        .update(&bob, undecodable_update(post_id))
        .await
        .expect_err("forbidden wins over undecodable body");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn undecodable_update_of_missing_post_is_not_found(alice: Identity) {
    let mut repo = MockPostRepository::new();
    repo.expect_find_live().times(1).return_once(|_| Ok(None));

    let err = make_service(repo)
        .update(&alice, undecodable_update(PostId::random()))
        .await
        .expect_err("missing post");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn undecodable_update_from_owner_is_invalid(alice: Identity) {
    let post = post_owned_by(&alice);
    let post_id = post.id();
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(move |_| Ok(Some(post)));
    repo.expect_update().never();

    let err = make_service(repo)
        .update(&alice, undecodable_update(post_id))
        .await
        .expect_err("owner sent an undecodable body");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_by_owner_persists_revision(alice: Identity) {
    let post = post_owned_by(&alice);
    let post_id = post.id();
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(move |_| Ok(Some(post)));
    repo.expect_update()
        .times(1)
        .withf(|post| post.title() == "Renamed")
        .return_once(|_| Ok(()));

    let revised = make_service(repo)
        .update(&alice, update_request(post_id, "Renamed"))
        .await
        .expect("owner may update");
    assert_eq!(revised.id(), post_id);
    assert_eq!(revised.content(), "Revised");
}

#[rstest]
#[tokio::test]
async fn delete_by_owner_soft_deletes(alice: Identity) {
    let post = post_owned_by(&alice);
    let post_id = post.id();
    let owner = alice.user_id().clone();
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(move |_| Ok(Some(post)));
    repo.expect_soft_delete()
        .times(1)
        .withf(move |id, owner_id, _| *id == post_id && *owner_id == owner)
        .return_once(|_, _, _| Ok(()));

    make_service(repo)
        .delete(&alice, post_id)
        .await
        .expect("owner may delete");
}

#[rstest]
#[tokio::test]
async fn delete_by_non_owner_is_forbidden(alice: Identity) {
    let post = post_owned_by(&alice);
    let post_id = post.id();
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(move |_| Ok(Some(post)));
    repo.expect_soft_delete().never();

    let bob = Identity::new(UserId::random(), "bob");
    let err = make_service(repo)
        .delete(&bob, post_id)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn delete_of_missing_post_is_not_found(alice: Identity) {
    let mut repo = MockPostRepository::new();
    repo.expect_find_live().times(1).return_once(|_| Ok(None));

    let err = make_service(repo)
        .delete(&alice, PostId::random())
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn get_maps_connection_failures_to_unavailable() {
    let mut repo = MockPostRepository::new();
    repo.expect_find_live()
        .times(1)
        .return_once(|_| Err(PostRepositoryError::connection("refused")));

    let err = make_service(repo)
        .get(PostId::random())
        .await
        .expect_err("store down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn reconcile_reports_corrections(alice: Identity) {
    let owner = alice.user_id().clone();
    let expected = PostCountReconciliation {
        owner_id: owner.clone(),
        previous: 3,
        actual: 2,
    };
    let returned = expected.clone();
    let mut repo = MockPostRepository::new();
    repo.expect_recount()
        .times(1)
        .return_once(move |_| Ok(returned));

    let outcome = make_service(repo)
        .reconcile_post_count(&owner)
        .await
        .expect("recount succeeds");
    assert_eq!(outcome, expected);
    assert!(outcome.corrected());
}
