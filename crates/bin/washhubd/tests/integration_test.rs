//! End-to-end smoke tests for the full washhubd stack.
//!
//! Each test wires the virtual cloud, the real scheduler, dispatcher and
//! washer service, and the real axum router, then exercises the HTTP layer
//! via `tower::ServiceExt::oneshot`. No TCP port is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use washhub_adapter_http_axum::router;
use washhub_adapter_http_axum::state::AppState;
use washhub_adapter_virtual::{VirtualCloud, VirtualDevice};
use washhub_app::event_bus::InProcessEventBus;
use washhub_app::scheduler::{PollSettings, Refresh};
use washhub_app::services::washer_service::{PollIntervals, WasherService};
use washhub_domain::cadence::Cadence;
use washhub_domain::device::Device;
use washhub_domain::id::DeviceId;

type Service = WasherService<Arc<VirtualCloud>, Arc<InProcessEventBus>>;

struct Stack {
    cloud: Arc<VirtualCloud>,
    service: Arc<Service>,
    app: axum::Router,
}

fn device(id: &str, washer: bool) -> Device {
    Device::builder()
        .id(id)
        .name(id)
        .washer(washer)
        .build()
        .expect("fixture device should be valid")
}

fn washer_id() -> DeviceId {
    DeviceId::new("washer-1").unwrap()
}

/// Build the full stack around one powered-on washer and a vacuum, with
/// discovery done and both cadences fetched once.
async fn stack() -> Stack {
    let washer = match VirtualDevice::from_device(device("washer-1", true)) {
        VirtualDevice::Washer(washer) => VirtualDevice::Washer(washer.powered_on()),
        other => other,
    };
    let cloud = Arc::new(VirtualCloud::new([
        washer,
        VirtualDevice::from_device(device("vacuum-1", false)),
    ]));
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let service = Arc::new(WasherService::new(
        Arc::clone(&cloud),
        Arc::clone(&event_bus),
        PollSettings::default(),
        PollIntervals::default(),
    ));
    service.discover().await.expect("discovery should succeed");
    for cadence in Cadence::ALL {
        service
            .scheduler()
            .force_refresh(&washer_id(), cadence)
            .await
            .expect("initial fetch should succeed");
    }

    let app = router::build(AppState::new(Arc::clone(&service), event_bus));
    Stack {
        cloud,
        service,
        app,
    }
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(resp).await
}

async fn post(app: &axum::Router, uri: &str, value: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::json!({ "value": value }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(resp).await
}

async fn read(resp: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn reading<'a>(readings: &'a serde_json::Value, entity_id: &str) -> &'a serde_json::Value {
    readings
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["entity_id"] == entity_id)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack().await;

    let resp = stack
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_expose_only_washers() {
    let stack = stack().await;

    let (status, body) = get(&stack.app, "/api/devices").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["washer-1"]);
    assert_eq!(stack.service.scheduler().timer_count(), 2);
}

// ---------------------------------------------------------------------------
// Command cycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_run_start_pause_stop_cycle() {
    let stack = stack().await;
    let base = "/api/devices/washer-1/capabilities/power";

    let (status, body) = post(&stack.app, base, "start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "confirmed");
    assert_eq!(body["observed"], "washing");

    let (_, readings) = get(&stack.app, "/api/devices/washer-1/entities").await;
    assert_eq!(reading(&readings, "sensor.status")["value"], "washing");
    assert_eq!(reading(&readings, "sensor.washing_left")["value"], 60);

    let (_, body) = post(&stack.app, base, "pause").await;
    assert_eq!(body["outcome"], "confirmed");
    assert_eq!(body["observed"], "paused");

    let (_, body) = post(&stack.app, base, "stop").await;
    assert_eq!(body["outcome"], "confirmed");
    assert_eq!(body["observed"], "standby");
}

#[tokio::test]
async fn should_report_unconfirmed_effect_for_start_in_standby() {
    let stack = stack().await;
    stack
        .cloud
        .washer(&washer_id())
        .unwrap()
        .press_power();

    let (status, body) = post(
        &stack.app,
        "/api/devices/washer-1/capabilities/power",
        "start",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "unconfirmed_effect");
    assert_eq!(body["observed"], "standby");
}

#[tokio::test]
async fn should_write_select_and_read_it_back() {
    let stack = stack().await;

    let (status, body) = post(
        &stack.app,
        "/api/devices/washer-1/capabilities/spin_level",
        "max",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "confirmed");

    let (_, reading) = get(
        &stack.app,
        "/api/devices/washer-1/entities/select.spin_level",
    )
    .await;
    assert_eq!(reading["value"], "max");
    assert_eq!(reading["available"], true);
}

#[tokio::test]
async fn should_reject_value_outside_domain() {
    let stack = stack().await;

    let (status, body) = post(
        &stack.app,
        "/api/devices/washer-1/capabilities/sound_set",
        "loud",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("loud"));
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_keep_last_values_but_mark_unavailable_during_outage() {
    let stack = stack().await;
    stack.cloud.set_online(false);

    for _ in 0..2 {
        let result = stack
            .service
            .scheduler()
            .force_refresh(&washer_id(), Cadence::Fast)
            .await;
        assert!(result.is_err());
    }

    let (_, readings) = get(&stack.app, "/api/devices/washer-1/entities").await;
    let status = reading(&readings, "sensor.status");
    assert_eq!(status["value"], "ready");
    assert_eq!(status["available"], false);
    assert_eq!(reading(&readings, "select.program")["available"], true);

    stack.cloud.set_online(true);
    stack
        .service
        .scheduler()
        .force_refresh(&washer_id(), Cadence::Fast)
        .await
        .unwrap();
    let (_, status) = get(&stack.app, "/api/devices/washer-1/entities/sensor.status").await;
    assert_eq!(status["available"], true);
}

#[tokio::test]
async fn should_fail_with_bad_gateway_when_cloud_is_down() {
    let stack = stack().await;
    stack.cloud.set_online(false);

    let (status, body) = post(
        &stack.app,
        "/api/devices/washer-1/capabilities/power",
        "start",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}
