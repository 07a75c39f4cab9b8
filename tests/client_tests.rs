//! Integration tests for the Prometheus HTTP client.
//!
//! A small axum app on 127.0.0.1 stands in for the Prometheus API and serves
//! canned responses.

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use herakles_target_monitor::model::epoch_seconds;
use herakles_target_monitor::{
    MetricsBackend, PrometheusClient, QueryError, QueryValue, StatusEngine, EngineOptions,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn query_handler(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let query = params.get("query").cloned().unwrap_or_default();
    let body = match query.as_str() {
        "up" => json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"__name__": "up", "job": "go", "instance": "h:1"}, "value": [1700000000.123, "1"]}
                ]
            }
        }),
        "scalar(1)" => json!({
            "status": "success",
            "data": {"resultType": "scalar", "result": [1700000000, "1"]}
        }),
        "echo_time" => json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {}, "value": [1700000000, params.get("time").cloned().unwrap_or_default()]}
                ]
            }
        }),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            json!({"status": "success", "data": {"resultType": "vector", "result": []}})
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "error",
                    "errorType": "bad_data",
                    "error": "parse error at char 1"
                })),
            )
        }
    };
    (StatusCode::OK, Json(body))
}

async fn targets_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("state").map(String::as_str), Some("active"));
    Json(json!({
        "status": "success",
        "data": {
            "activeTargets": [
                {
                    "labels": {"app": "shop", "job": "go", "instance": "10.0.0.1:9090"},
                    "health": "up",
                    "scrapePool": "go"
                },
                {
                    "labels": {"app": "shop", "job": "go", "instance": "10.0.0.2:9090"},
                    "health": "down"
                }
            ],
            "droppedTargets": []
        }
    }))
}

async fn start_stub() -> SocketAddr {
    let app = Router::new()
        .route("/api/v1/query", get(query_handler))
        .route("/api/v1/targets", get(targets_handler))
        .route("/broken/api/v1/query", get(|| async { "not json" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> PrometheusClient {
    PrometheusClient::new(format!("http://{}/", addr), Duration::from_secs(1)).unwrap()
}

#[tokio::test]
async fn test_endpoint_trailing_slash_is_trimmed() {
    let client = PrometheusClient::from_host("http", "prom.local", 9090, Duration::from_secs(1))
        .unwrap();
    assert_eq!(client.endpoint(), "http://prom.local:9090");

    let client = PrometheusClient::new("http://prom.local:9090/", Duration::from_secs(1)).unwrap();
    assert_eq!(client.endpoint(), "http://prom.local:9090");
}

#[tokio::test]
async fn test_instant_query_decodes_vector() {
    let addr = start_stub().await;

    let value = client(addr).instant_query("up", Utc::now()).await.unwrap();
    let QueryValue::Vector(points) = value else {
        panic!("expected vector, got {:?}", value);
    };
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].label("job"), "go");
    assert_eq!(points[0].label("instance"), "h:1");
    assert_eq!(points[0].label("missing"), "");
    assert_eq!(points[0].value, 1.0);
    assert!((points[0].timestamp - 1_700_000_000.123).abs() < 1e-6);
}

#[tokio::test]
async fn test_instant_query_sends_evaluation_time() {
    let addr = start_stub().await;
    let at = epoch_seconds(1_700_000_000).unwrap();

    let value = client(addr).instant_query("echo_time", at).await.unwrap();
    let QueryValue::Vector(points) = value else {
        panic!("expected vector");
    };
    assert_eq!(points[0].value, 1_700_000_000.0);
}

#[tokio::test]
async fn test_instant_query_decodes_scalar() {
    let addr = start_stub().await;

    let value = client(addr)
        .instant_query("scalar(1)", Utc::now())
        .await
        .unwrap();
    assert_eq!(value.result_type(), "scalar");
}

#[tokio::test]
async fn test_error_envelope_is_malformed_result() {
    let addr = start_stub().await;

    let err = client(addr)
        .instant_query("sum(", Utc::now())
        .await
        .unwrap_err();
    match err {
        QueryError::MalformedResult(msg) => {
            assert!(msg.contains("bad_data"), "got: {}", msg);
            assert!(msg.contains("parse error"), "got: {}", msg);
        }
        other => panic!("expected MalformedResult, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed_result() {
    let addr = start_stub().await;
    let client =
        PrometheusClient::new(format!("http://{}/broken", addr), Duration::from_secs(1)).unwrap();

    let err = client.instant_query("up", Utc::now()).await.unwrap_err();
    assert!(matches!(err, QueryError::MalformedResult(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let addr = start_stub().await;
    let client =
        PrometheusClient::new(format!("http://{}", addr), Duration::from_millis(200)).unwrap();

    let err = client.instant_query("slow", Utc::now()).await.unwrap_err();
    assert!(matches!(err, QueryError::Timeout), "got {:?}", err);
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).targets().await.unwrap_err();
    assert!(
        matches!(err, QueryError::BackendUnreachable(_)),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_targets_decodes_labels_and_health() {
    let addr = start_stub().await;

    let targets = client(addr).targets().await.unwrap();
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].labels["app"], "shop");
    assert_eq!(targets[0].health, "up");
    assert_eq!(targets[1].health, "down");
}

#[tokio::test]
async fn test_engine_over_http_stub() {
    let addr = start_stub().await;
    let engine = StatusEngine::new(Arc::new(client(addr)), EngineOptions::default());

    engine.verify().await.unwrap();

    // Probe expressions are rejected by the stub, so every probe degrades
    let refresh = engine.refresh().await.unwrap();
    assert_eq!(refresh.targets, 2);
    assert_eq!(refresh.degraded_probes, 5);
    assert_eq!(refresh.applications.len(), 1);

    let json = serde_json::to_value(&refresh.applications).unwrap();
    assert_eq!(json[0]["name"], "shop");
    assert_eq!(json[0]["instances"][0]["addr"], "10.0.0.1:9090");
    assert_eq!(json[0]["instances"][0]["status"], "UP");
    assert_eq!(json[0]["instances"][0]["time"], "");
    assert_eq!(json[0]["instances"][1]["status"], "DOWN");
}
