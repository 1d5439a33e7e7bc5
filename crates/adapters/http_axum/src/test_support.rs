//! Fixtures shared by the handler tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;
use washhub_adapter_virtual::{VirtualCloud, VirtualDevice};
use washhub_app::event_bus::InProcessEventBus;
use washhub_app::scheduler::{PollSettings, Refresh};
use washhub_app::services::washer_service::{PollIntervals, WasherService};
use washhub_domain::cadence::Cadence;
use washhub_domain::device::Device;
use washhub_domain::id::DeviceId;

use crate::state::AppState;

pub(crate) type TestState = AppState<Arc<VirtualCloud>, Arc<InProcessEventBus>>;

pub(crate) fn washer_id() -> DeviceId {
    DeviceId::new("washer-1").unwrap()
}

/// One discovered virtual washer, in standby, with both cadences fetched.
///
/// The account also holds a vacuum, which discovery skips.
pub(crate) async fn state() -> (TestState, Arc<VirtualCloud>) {
    let washer = Device::builder()
        .id("washer-1")
        .name("Laundry")
        .washer(true)
        .build()
        .unwrap();
    let vacuum = Device::builder()
        .id("vacuum-1")
        .name("Hallway")
        .build()
        .unwrap();
    let cloud = Arc::new(VirtualCloud::new([
        VirtualDevice::from_device(washer),
        VirtualDevice::from_device(vacuum),
    ]));
    let event_bus = Arc::new(InProcessEventBus::new(64));
    let service = WasherService::new(
        Arc::clone(&cloud),
        Arc::clone(&event_bus),
        PollSettings::default(),
        PollIntervals::default(),
    );
    service.discover().await.unwrap();
    for cadence in Cadence::ALL {
        service
            .scheduler()
            .force_refresh(&washer_id(), cadence)
            .await
            .unwrap();
    }
    (AppState::new(Arc::new(service), event_bus), cloud)
}

pub(crate) async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub(crate) async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
