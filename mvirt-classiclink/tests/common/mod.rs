//! Fake control plane for mvirt-classiclink integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mvirt_classiclink::clients::http::{
    AttachRequest, DescribeResponse, DetachRequest, LinkedInstance, REQUEST_ID_HEADER,
};
use mvirt_classiclink::{ClientConfig, HttpClient};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A canned failure for the next request.
pub struct Fault {
    pub status: StatusCode,
    pub body: String,
}

impl Fault {
    pub fn coded(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: json!({ "code": code, "message": message }).to_string(),
        }
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// State of the fake control plane.
#[derive(Default)]
pub struct ControlPlane {
    pub instances: HashSet<String>,
    pub links: HashMap<String, (String, Vec<String>)>,
    pub request_ids: Vec<String>,
    pub fault: Option<Fault>,
    pub delay: Option<Duration>,
}

type Shared = Arc<Mutex<ControlPlane>>;

fn not_found(instance_id: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "code": "InvalidInstanceID.NotFound",
            "message": format!("The instance ID '{}' does not exist", instance_id),
        })),
    )
        .into_response()
}

/// Common request prelude: record the request ID, apply delay and faults.
async fn prelude(state: &Shared, headers: &HeaderMap) -> Option<Response> {
    let delay = {
        let mut cp = state.lock().await;
        if let Some(id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
            cp.request_ids.push(id.to_string());
        }
        cp.delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let fault = state.lock().await.fault.take()?;
    Some((fault.status, fault.body).into_response())
}

async fn attach(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<AttachRequest>,
) -> Response {
    if let Some(resp) = prelude(&state, &headers).await {
        return resp;
    }

    let mut cp = state.lock().await;
    if !cp.instances.contains(&req.instance_id) {
        return not_found(&req.instance_id);
    }
    if cp.links.contains_key(&req.instance_id) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": "InvalidParameterValue", "message": "already linked" })),
        )
            .into_response();
    }
    cp.links
        .insert(req.instance_id.clone(), (req.vpc_id, req.groups));
    Json(json!({ "return": true })).into_response()
}

async fn describe(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(resp) = prelude(&state, &headers).await {
        return resp;
    }

    let instance_id = params.get("instance_id").cloned().unwrap_or_default();
    let cp = state.lock().await;
    if !cp.instances.contains(&instance_id) {
        return not_found(&instance_id);
    }

    let instances = cp
        .links
        .get(&instance_id)
        .map(|(vpc_id, groups)| LinkedInstance {
            instance_id: instance_id.clone(),
            vpc_id: vpc_id.clone(),
            groups: groups.clone(),
        })
        .into_iter()
        .collect();
    Json(DescribeResponse { instances }).into_response()
}

async fn detach(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<DetachRequest>,
) -> Response {
    if let Some(resp) = prelude(&state, &headers).await {
        return resp;
    }

    let mut cp = state.lock().await;
    let linked = cp
        .links
        .get(&req.instance_id)
        .is_some_and(|(vpc_id, _)| *vpc_id == req.vpc_id);
    if !linked {
        return not_found(&req.instance_id);
    }
    cp.links.remove(&req.instance_id);
    Json(json!({ "return": true })).into_response()
}

/// Test server wrapper running the fake control plane on a random port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Shared,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    /// Spawn a control plane that knows the given instances.
    pub async fn spawn(instances: &[&str]) -> Self {
        let state: Shared = Arc::new(Mutex::new(ControlPlane {
            instances: instances.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }));

        let router = Router::new()
            .route("/classic-links", get(describe))
            .route("/classic-links/attach", post(attach))
            .route("/classic-links/detach", post(detach))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// HTTP client pointed at this server.
    pub fn client(&self, timeout: Duration) -> HttpClient {
        HttpClient::new(&ClientConfig::new(self.endpoint(), timeout)).expect("Invalid config")
    }

    pub async fn fail_next(&self, fault: Fault) {
        self.state.lock().await.fault = Some(fault);
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}
