// ABOUTME: Tests for the append-only rollout history store.
// ABOUTME: Covers round-trips, duplicate rejection, and listing order.

use chrono::{Duration, Utc};

use anelixi::history::{HistoryError, RolloutHistory};
use anelixi::rollout::{RolloutOutcome, RolloutRecord};
use anelixi::types::{ArtifactRef, RolloutId, ServiceId};

fn record(service: &str, id: &str, finished_secs_ago: i64) -> RolloutRecord {
    let finished = Utc::now() - Duration::seconds(finished_secs_ago);
    RolloutRecord {
        id: RolloutId::new(id.to_string()),
        service: ServiceId::new(service).unwrap(),
        target: ArtifactRef::parse("registry.test/acme/app:v2").unwrap(),
        started_at: finished - Duration::seconds(30),
        finished_at: Some(finished),
        outcome: RolloutOutcome::Succeeded,
        attempts: 1,
    }
}

#[test]
fn append_and_get_round_trip() {
    let history = RolloutHistory::new();
    let rec = record("web", "web-1-0", 10);

    history.append(rec.clone()).unwrap();

    let stored = history.get(&rec.id).unwrap();
    assert_eq!(stored.id, rec.id);
    assert_eq!(stored.outcome, RolloutOutcome::Succeeded);
    assert_eq!(stored.attempts, 1);
}

#[test]
fn get_missing_returns_not_found() {
    let history = RolloutHistory::new();
    let id = RolloutId::new("ghost-1-0".to_string());
    assert!(matches!(history.get(&id), Err(HistoryError::NotFound(_))));
}

#[test]
fn append_duplicate_id_rejected() {
    let history = RolloutHistory::new();
    history.append(record("web", "web-1-0", 10)).unwrap();

    let err = history.append(record("web", "web-1-0", 5)).unwrap_err();
    assert!(matches!(err, HistoryError::DuplicateId(_)));
    assert_eq!(history.len(), 1);
}

#[test]
fn list_by_service_most_recent_first() {
    let history = RolloutHistory::new();
    history.append(record("web", "web-1-0", 300)).unwrap();
    history.append(record("web", "web-1-1", 10)).unwrap();
    history.append(record("web", "web-1-2", 100)).unwrap();

    let listed = history.list_by_service(&ServiceId::new("web").unwrap());
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["web-1-1", "web-1-2", "web-1-0"]);
}

#[test]
fn list_by_service_filters_other_services() {
    let history = RolloutHistory::new();
    history.append(record("web", "web-1-0", 10)).unwrap();
    history.append(record("api", "api-1-0", 5)).unwrap();

    let listed = history.list_by_service(&ServiceId::new("web").unwrap());
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id.as_str(), "web-1-0");

    let none = history.list_by_service(&ServiceId::new("worker").unwrap());
    assert!(none.is_empty());
}

#[test]
fn empty_store_reports_empty() {
    let history = RolloutHistory::new();
    assert!(history.is_empty());
    assert_eq!(history.len(), 0);
}

#[test]
fn record_serializes_with_export_field_names() {
    let rec = record("web", "web-1-0", 10);
    let json = serde_json::to_value(&rec).unwrap();

    assert_eq!(json["id"], "web-1-0");
    assert_eq!(json["service"], "web");
    assert_eq!(json["outcome"], "Succeeded");
    assert_eq!(json["target"]["registry"], "registry.test");
    assert_eq!(json["target"]["repository"], "acme/app");
    assert_eq!(json["target"]["tag"], "v2");
    assert!(json["startedAt"].is_string());
    assert!(json["finishedAt"].is_string());
    assert_eq!(json["attempts"], 1);
}
