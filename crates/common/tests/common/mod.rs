//! Shared test utilities: in-process stand-ins for the pinning
//! service and retrieval gateways, and session setup helpers
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use url::Url;

use common::prelude::*;

pub const OWNER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const RECIPIENT: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
pub const JWT: &str = "test-jwt";

/// Content pinned through the stub pinning service, by CID
pub type Network = Arc<Mutex<HashMap<String, Vec<u8>>>>;

pub fn network() -> Network {
    Arc::new(Mutex::new(HashMap::new()))
}

pub fn address(value: &str) -> AccountAddress {
    AccountAddress::parse(value).unwrap()
}

/// Route library logs to the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

/// One request received by the stub pinning service
#[derive(Debug, Clone, Default)]
pub struct PinRequest {
    pub authorization: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
    pub metadata: Value,
    pub options: Value,
}

#[derive(Clone)]
struct PinningState {
    network: Network,
    cid: Option<String>,
    failure: Option<(StatusCode, String)>,
    requests: Arc<Mutex<Vec<PinRequest>>>,
}

/// A stub `pinFileToIPFS` endpoint
pub struct PinningStub {
    pub url: Url,
    pub requests: Arc<Mutex<Vec<PinRequest>>>,
}

impl PinningStub {
    /// Pins every upload into `network` and answers with `cid`
    pub async fn spawn(network: &Network, cid: &str) -> Self {
        Self::spawn_with(network, Some(cid.to_string()), None).await
    }

    /// Answers every upload with `status` and `body`
    pub async fn failing(status: StatusCode, body: &str) -> Self {
        Self::spawn_with(&network(), None, Some((status, body.to_string()))).await
    }

    /// Answers every upload with success but no `IpfsHash`
    pub async fn without_hash() -> Self {
        Self::spawn_with(&network(), None, None).await
    }

    async fn spawn_with(
        network: &Network,
        cid: Option<String>,
        failure: Option<(StatusCode, String)>,
    ) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = PinningState {
            network: network.clone(),
            cid,
            failure,
            requests: requests.clone(),
        };
        let router = Router::new()
            .route("/pinning/pinFileToIPFS", post(pin_handler))
            .with_state(state);
        Self {
            url: serve(router).await,
            requests,
        }
    }

    pub fn client(&self) -> PinataClient {
        PinataClient::new(self.url.clone(), JWT).unwrap()
    }

    pub fn requests(&self) -> Vec<PinRequest> {
        self.requests.lock().clone()
    }
}

async fn pin_handler(
    State(state): State<PinningState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut request = PinRequest {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                request.file_name = field.file_name().map(str::to_string);
                request.content_type = field.content_type().map(str::to_string);
                request.body = field.text().await.unwrap();
            }
            "pinataMetadata" => {
                request.metadata = serde_json::from_str(&field.text().await.unwrap()).unwrap();
            }
            "pinataOptions" => {
                request.options = serde_json::from_str(&field.text().await.unwrap()).unwrap();
            }
            _ => {}
        }
    }

    let body = request.body.clone();
    state.requests.lock().push(request);

    if let Some((status, message)) = state.failure {
        return (status, message).into_response();
    }
    match state.cid {
        Some(cid) => {
            state.network.lock().insert(cid.clone(), body.into_bytes());
            Json(json!({ "IpfsHash": cid, "PinSize": 1, "Timestamp": "now" })).into_response()
        }
        None => Json(json!({ "PinSize": 1 })).into_response(),
    }
}

/// How a stub gateway answers
#[derive(Debug, Clone, Copy)]
pub enum GatewayMode {
    /// Serve whatever the network holds, 404 for anything else
    Serve,
    /// Answer every request with this status
    Fail(StatusCode),
}

#[derive(Clone)]
struct GatewayState {
    network: Network,
    mode: GatewayMode,
    hits: Arc<AtomicUsize>,
}

/// A stub `GET /ipfs/{cid}` gateway that counts its requests
pub struct GatewayStub {
    pub url: Url,
    hits: Arc<AtomicUsize>,
}

impl GatewayStub {
    pub async fn spawn(network: &Network, mode: GatewayMode) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = GatewayState {
            network: network.clone(),
            mode,
            hits: hits.clone(),
        };
        let router = Router::new()
            .route("/ipfs/:cid", get(gateway_handler))
            .with_state(state);
        Self {
            url: serve(router).await,
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn gateway_handler(State(state): State<GatewayState>, Path(cid): Path<String>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match state.mode {
        GatewayMode::Fail(status) => (status, "gateway unavailable").into_response(),
        GatewayMode::Serve => match state.network.lock().get(&cid) {
            Some(bytes) => bytes.clone().into_response(),
            None => (StatusCode::NOT_FOUND, "not found").into_response(),
        },
    }
}

pub fn fetcher(gateways: &[&GatewayStub]) -> GatewayFetcher {
    let urls: Vec<Url> = gateways.iter().map(|g| g.url.clone()).collect();
    GatewayFetcher::new(urls).unwrap()
}

/// A session on `ledger` with in-memory device state
pub fn session(
    ledger: MemoryLedger,
    pinning: &PinningStub,
    gateways: &[&GatewayStub],
) -> Session<MemoryLedger, PinataClient> {
    init_tracing();
    Session::connect(
        ledger,
        pinning.client(),
        fetcher(gateways),
        KeyStore::in_memory(),
        IdentifierCache::in_memory(),
    )
}

/// An uploaded `report.pdf`, the file most tests work with
pub fn report() -> FileUpload {
    FileUpload::new(
        "report.pdf",
        "application/pdf",
        b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF".to_vec(),
    )
}
