// ABOUTME: Tests for per-service rollout serialization and request dedup.
// ABOUTME: At most one rollout per service; duplicates observe the active record.

use std::sync::Arc;
use std::time::Duration;

use anelixi::history::RolloutHistory;
use anelixi::platform::InMemoryPlatform;
use anelixi::rollout::{RolloutController, RolloutError, RolloutOptions, RolloutOutcome};
use anelixi::types::{ArtifactRef, ServiceId};

fn artifact(tag: &str) -> ArtifactRef {
    ArtifactRef::parse(&format!("registry.test/acme/app:{tag}")).unwrap()
}

fn service() -> ServiceId {
    ServiceId::new("svc").unwrap()
}

fn slow_opts() -> RolloutOptions {
    RolloutOptions {
        health_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(30),
        max_retries: 3,
        backoff_base: Duration::from_millis(10),
        auto_rollback: true,
        call_timeout: Duration::from_secs(1),
    }
}

fn setup() -> (
    Arc<InMemoryPlatform>,
    Arc<RolloutHistory>,
    Arc<RolloutController<InMemoryPlatform>>,
) {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.register_service(service(), artifact("v1"), 2);
    let history = Arc::new(RolloutHistory::new());
    let controller = Arc::new(RolloutController::new(platform.clone(), history.clone()));
    (platform, history, controller)
}

/// Test: a concurrent duplicate request returns the active record's id and
/// exactly one record reaches a terminal state.
#[tokio::test]
async fn concurrent_duplicate_returns_same_record() {
    let (platform, history, controller) = setup();
    // Several polls before convergence so the first rollout is still
    // active when the duplicate arrives.
    platform.set_converge_after(&service(), 5);

    let first_controller = controller.clone();
    let handle = tokio::spawn(async move {
        first_controller
            .start(service(), artifact("v2"), slow_opts())
            .await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = controller
        .start(service(), artifact("v2"), slow_opts())
        .await
        .unwrap();
    let first = handle.await.unwrap().unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.outcome, RolloutOutcome::Pending);
    assert!(first.outcome.is_terminal());
    assert_eq!(history.len(), 1);
}

/// Test: a concurrent request with a different target is rejected.
#[tokio::test]
async fn different_target_while_active_is_rejected() {
    let (platform, _history, controller) = setup();
    platform.set_converge_after(&service(), 5);

    let first_controller = controller.clone();
    let handle = tokio::spawn(async move {
        first_controller
            .start(service(), artifact("v2"), slow_opts())
            .await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let err = controller
        .start(service(), artifact("v3"), slow_opts())
        .await
        .unwrap_err();

    assert!(matches!(err, RolloutError::RolloutInProgress { .. }));
    let first = handle.await.unwrap().unwrap();
    assert!(first.outcome.is_terminal());
}

/// Test: sequential rollouts each get a fresh record.
#[tokio::test]
async fn sequential_rollouts_get_fresh_records() {
    let (_platform, history, controller) = setup();

    let first = controller
        .start(service(), artifact("v2"), slow_opts())
        .await
        .unwrap();
    let second = controller
        .start(service(), artifact("v3"), slow_opts())
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(history.len(), 2);

    let listed = history.list_by_service(&service());
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id, "most recent first");
}

/// Test: independent services roll out concurrently without interference.
#[tokio::test]
async fn independent_services_run_concurrently() {
    let platform = Arc::new(InMemoryPlatform::new());
    let history = Arc::new(RolloutHistory::new());
    let controller = Arc::new(RolloutController::new(platform.clone(), history.clone()));

    let services = ["svc-a", "svc-b", "svc-c"];
    for name in services {
        platform.register_service(
            ServiceId::new(name).unwrap(),
            artifact("v1"),
            2,
        );
    }

    let mut handles = Vec::new();
    for name in services {
        let controller = controller.clone();
        handles.push(tokio::spawn(async move {
            controller
                .start(ServiceId::new(name).unwrap(), artifact("v2"), slow_opts())
                .await
        }));
    }

    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_eq!(record.outcome, RolloutOutcome::Succeeded);
    }
    assert_eq!(history.len(), 3);
}

/// Test: the active slot is released after a synchronous error, so a later
/// request for the same service is admitted.
#[tokio::test]
async fn active_slot_released_after_error() {
    let platform = Arc::new(InMemoryPlatform::new());
    let history = Arc::new(RolloutHistory::new());
    let controller = RolloutController::new(platform.clone(), history.clone());

    let err = controller
        .start(service(), artifact("v2"), slow_opts())
        .await
        .unwrap_err();
    assert!(matches!(err, RolloutError::ServiceNotFound(_)));

    platform.register_service(service(), artifact("v1"), 2);
    let record = controller
        .start(service(), artifact("v2"), slow_opts())
        .await
        .unwrap();
    assert_eq!(record.outcome, RolloutOutcome::Succeeded);
}
