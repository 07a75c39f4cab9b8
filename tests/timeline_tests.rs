//! Integration tests for status timeline resolution.
//!
//! These tests drive `TimelineResolver` against an in-memory backend and
//! check the up-since / down-since fallback chains end to end.

mod common;

use chrono::{DateTime, Utc};
use common::{Answer, MockBackend};
use herakles_target_monitor::model::epoch_seconds;
use herakles_target_monitor::timeline::{Probe, TimelineResolver, DEFAULT_LOOKBACK};
use herakles_target_monitor::{Health, Status, Target};
use std::sync::Arc;
use std::time::Duration;

const T0: i64 = 1_700_000_000;
const T1: i64 = 1_700_086_400 + 3_723;

fn target(health: Health) -> Target {
    Target {
        app: "go".to_string(),
        name: "go".to_string(),
        address: "host:58082".to_string(),
        health,
    }
}

fn probe(p: Probe) -> String {
    p.expr("go", "host:58082", DEFAULT_LOOKBACK)
}

fn at(secs: i64) -> DateTime<Utc> {
    epoch_seconds(secs).unwrap()
}

fn resolver(backend: MockBackend) -> (TimelineResolver, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    (
        TimelineResolver::new(backend.clone(), DEFAULT_LOOKBACK),
        backend,
    )
}

#[tokio::test]
async fn test_healthy_without_down_samples_starts_at_first_up() {
    let (resolver, _) = resolver(
        MockBackend::new()
            .answer(probe(Probe::FirstUp), Answer::Timestamp(T0))
            .answer(probe(Probe::LastUp), Answer::Timestamp(T1)),
    );

    let resolved = resolver
        .resolve_target(&target(Health::Healthy), at(T1))
        .await;

    assert_eq!(resolved.app, "go");
    assert_eq!(resolved.instance.status, Status::Up);
    assert_eq!(resolved.instance.time, Some(at(T0)));
    assert_eq!(
        resolved.instance.duration,
        Duration::from_secs((T1 - T0) as u64)
    );
    assert_eq!(resolved.degraded, 0);

    let json = serde_json::to_value(&resolved.instance).unwrap();
    assert_eq!(json["status"], "UP");
    assert_eq!(json["addr"], "host:58082");
    assert_eq!(json["time"], "2023-11-14 22:13:20");
    assert_eq!(json["duration"], "1d 1h 2m 3s");
}

#[tokio::test]
async fn test_healthy_with_down_samples_starts_at_last_down() {
    let last_down = T0 + 600;
    let (resolver, _) = resolver(
        MockBackend::new()
            .answer(probe(Probe::FirstUp), Answer::Timestamp(T0))
            .answer(probe(Probe::LastDown), Answer::Timestamp(last_down))
            .answer(probe(Probe::LastUp), Answer::Timestamp(T1)),
    );

    let resolved = resolver
        .resolve_target(&target(Health::Healthy), at(T1))
        .await;

    assert_eq!(resolved.instance.time, Some(at(last_down)));
    assert_eq!(
        resolved.instance.duration,
        Duration::from_secs((T1 - last_down) as u64)
    );
}

#[tokio::test]
async fn test_healthy_duration_is_clamped_when_down_is_newer() {
    let (resolver, _) = resolver(
        MockBackend::new()
            .answer(probe(Probe::LastDown), Answer::Timestamp(T1))
            .answer(probe(Probe::LastUp), Answer::Timestamp(T0)),
    );

    let resolved = resolver
        .resolve_target(&target(Health::Healthy), at(T1))
        .await;

    assert_eq!(resolved.instance.time, Some(at(T1)));
    assert_eq!(resolved.instance.duration, Duration::ZERO);
}

#[tokio::test]
async fn test_unhealthy_reports_last_up() {
    let (resolver, _) = resolver(
        MockBackend::new()
            .answer(probe(Probe::LastUp), Answer::Timestamp(T0))
            .answer(probe(Probe::FirstDown), Answer::Timestamp(T0 + 15)),
    );

    let resolved = resolver
        .resolve_target(&target(Health::Unhealthy), at(T1))
        .await;

    assert_eq!(resolved.instance.status, Status::Down);
    assert_eq!(resolved.instance.time, Some(at(T0)));
    assert_eq!(resolved.instance.duration, Duration::ZERO);
}

#[tokio::test]
async fn test_unhealthy_without_up_reports_first_down() {
    let (resolver, _) = resolver(
        MockBackend::new().answer(probe(Probe::FirstDown), Answer::Timestamp(T0 + 15)),
    );

    let resolved = resolver
        .resolve_target(&target(Health::Unhealthy), at(T1))
        .await;

    assert_eq!(resolved.instance.status, Status::Down);
    assert_eq!(resolved.instance.time, Some(at(T0 + 15)));
}

#[tokio::test]
async fn test_unknown_health_issues_no_probes() {
    let (resolver, backend) = resolver(MockBackend::new().answer_everything(Answer::Timestamp(T0)));

    let resolved = resolver
        .resolve_target(&target(Health::Unknown), at(T1))
        .await;

    assert_eq!(resolved.instance.status, Status::Unknown);
    assert_eq!(resolved.instance.time, None);
    assert_eq!(resolved.instance.duration, Duration::ZERO);
    assert!(backend.queries().is_empty());

    let json = serde_json::to_value(&resolved.instance).unwrap();
    assert_eq!(json["status"], "UNKNOWN");
    assert_eq!(json["time"], "");
    assert_eq!(json["duration"], "0s");
}

#[tokio::test]
async fn test_only_relevant_probes_are_issued() {
    let (resolver, backend) = resolver(MockBackend::new());

    resolver
        .resolve_target(&target(Health::Unhealthy), at(T1))
        .await;

    let mut queries = backend.queries();
    queries.sort();
    let mut expected = vec![probe(Probe::LastUp), probe(Probe::FirstDown)];
    expected.sort();
    assert_eq!(queries, expected);
}

#[tokio::test]
async fn test_failed_probe_degrades_to_not_found() {
    let (resolver, _) = resolver(
        MockBackend::new()
            .answer(probe(Probe::LastDown), Answer::Timeout)
            .answer(probe(Probe::FirstUp), Answer::Timestamp(T0))
            .answer(probe(Probe::LastUp), Answer::Timestamp(T1)),
    );

    let resolved = resolver
        .resolve_target(&target(Health::Healthy), at(T1))
        .await;

    // The failed last-down probe behaves like "no down samples"
    assert_eq!(resolved.instance.status, Status::Up);
    assert_eq!(resolved.instance.time, Some(at(T0)));
    assert_eq!(resolved.degraded, 1);
}

#[tokio::test]
async fn test_non_vector_probe_result_counts_as_degraded() {
    let (resolver, _) = resolver(MockBackend::new().answer_everything(Answer::Scalar(1.0)));

    let resolved = resolver
        .resolve_target(&target(Health::Unhealthy), at(T1))
        .await;

    assert_eq!(resolved.instance.status, Status::Down);
    assert_eq!(resolved.instance.time, None);
    assert_eq!(resolved.degraded, 2);
}

#[tokio::test]
async fn test_duration_stays_within_evidence_window() {
    let values = [None, Some(T0), Some(T1)];
    for last_down in values {
        for first_up in values {
            for last_up in values {
                let mut backend = MockBackend::new();
                for (p, v) in [
                    (Probe::LastDown, last_down),
                    (Probe::FirstUp, first_up),
                    (Probe::LastUp, last_up),
                ] {
                    if let Some(secs) = v {
                        backend = backend.answer(probe(p), Answer::Timestamp(secs));
                    }
                }
                let (resolver, _) = resolver(backend);
                let resolved = resolver
                    .resolve_target(&target(Health::Healthy), at(T1))
                    .await;
                assert!(resolved.instance.duration <= Duration::from_secs((T1 - T0) as u64));
            }
        }
    }
}
