//! In-process mock of the forwarding control plane
//!
//! Serves the pairing and mode API from memory on an ephemeral localhost
//! port. Knobs on [`MockControlPlane`] simulate the misbehaviour the client
//! must tolerate: slow responses, refused writes, garbage bodies and the
//! different ways a duplicate pairing can be reported.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use cast_core::{ForwardingMode, Pairing};

/// How the mock answers a POST for a pairing it already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// 201, as if newly created
    Accept,
    /// 409 Conflict
    Conflict,
    /// 400 with an explanatory body
    BadRequest,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModeBody {
    mode: String,
}

struct MockState {
    pairings: DashSet<Pairing>,
    raw_pairings: Mutex<Vec<serde_json::Value>>,
    mode: Mutex<ForwardingMode>,
    duplicate_policy: AtomicU8,
    delay_ms: AtomicU64,
    reject_writes: AtomicBool,
    malformed_reads: AtomicBool,
}

impl MockState {
    async fn stall(&self) {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn duplicate_policy(&self) -> DuplicatePolicy {
        match self.duplicate_policy.load(Ordering::SeqCst) {
            1 => DuplicatePolicy::Conflict,
            2 => DuplicatePolicy::BadRequest,
            _ => DuplicatePolicy::Accept,
        }
    }

    fn current_mode(&self) -> ForwardingMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A running mock control plane; stops when dropped
pub struct MockControlPlane {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockControlPlane {
    /// Bind to an ephemeral port and start serving
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            pairings: DashSet::new(),
            raw_pairings: Mutex::new(Vec::new()),
            mode: Mutex::new(ForwardingMode::Auto),
            duplicate_policy: AtomicU8::new(0),
            delay_ms: AtomicU64::new(0),
            reject_writes: AtomicBool::new(false),
            malformed_reads: AtomicBool::new(false),
        });

        let router = Router::new()
            .route(
                "/api/pairings",
                get(list_pairings).post(add_pairing).delete(remove_pairing),
            )
            .route("/api/mode", get(get_mode).post(set_mode))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock control plane");
        let addr = listener.local_addr().expect("mock control plane address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// API root to hand to the client under test
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Pairings currently held
    pub fn pairings(&self) -> Vec<Pairing> {
        self.state.pairings.iter().map(|p| p.key().clone()).collect()
    }

    /// Append an entry to every pairing listing, as stored by some other tool
    pub fn push_raw_pairing(&self, entry: serde_json::Value) {
        self.state
            .raw_pairings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }

    /// Mode currently held
    pub fn mode(&self) -> ForwardingMode {
        self.state.current_mode()
    }

    pub fn set_duplicate_policy(&self, policy: DuplicatePolicy) {
        let raw = match policy {
            DuplicatePolicy::Accept => 0,
            DuplicatePolicy::Conflict => 1,
            DuplicatePolicy::BadRequest => 2,
        };
        self.state.duplicate_policy.store(raw, Ordering::SeqCst);
    }

    /// Delay every response by `delay`
    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Answer every write with 503
    pub fn set_reject_writes(&self, reject: bool) {
        self.state.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Answer every read with a body that is not JSON
    pub fn set_malformed_reads(&self, malformed: bool) {
        self.state.malformed_reads.store(malformed, Ordering::SeqCst);
    }

    /// Stop serving and wait until the port is released
    pub async fn shutdown(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for MockControlPlane {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn garbage() -> Response {
    (StatusCode::OK, "<html>gateway says hi</html>").into_response()
}

async fn list_pairings(State(state): State<Arc<MockState>>) -> Response {
    state.stall().await;
    if state.malformed_reads.load(Ordering::SeqCst) {
        return garbage();
    }
    let mut listing: Vec<serde_json::Value> = state
        .pairings
        .iter()
        .filter_map(|p| serde_json::to_value(p.key()).ok())
        .collect();
    listing.extend(
        state
            .raw_pairings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned(),
    );
    Json(listing).into_response()
}

async fn add_pairing(State(state): State<Arc<MockState>>, Json(pairing): Json<Pairing>) -> Response {
    state.stall().await;
    if state.reject_writes.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if state.pairings.insert(pairing) {
        return StatusCode::CREATED.into_response();
    }
    match state.duplicate_policy() {
        DuplicatePolicy::Accept => StatusCode::CREATED.into_response(),
        DuplicatePolicy::Conflict => StatusCode::CONFLICT.into_response(),
        DuplicatePolicy::BadRequest => {
            (StatusCode::BAD_REQUEST, "pairing already exists").into_response()
        }
    }
}

async fn remove_pairing(
    State(state): State<Arc<MockState>>,
    Json(pairing): Json<Pairing>,
) -> StatusCode {
    state.stall().await;
    if state.reject_writes.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    if state.pairings.remove(&pairing).is_some() {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_mode(State(state): State<Arc<MockState>>) -> Response {
    state.stall().await;
    if state.malformed_reads.load(Ordering::SeqCst) {
        return garbage();
    }
    Json(ModeBody {
        mode: state.current_mode().to_string(),
    })
    .into_response()
}

async fn set_mode(State(state): State<Arc<MockState>>, Json(body): Json<ModeBody>) -> StatusCode {
    state.stall().await;
    if state.reject_writes.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match body.mode.parse::<ForwardingMode>() {
        Ok(mode) if mode.is_writable() => {
            *state.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
            StatusCode::OK
        }
        _ => StatusCode::BAD_REQUEST,
    }
}
