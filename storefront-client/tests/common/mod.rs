//! In-process fake of the storefront backend.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

pub const VALID_TOKEN: &str = "abc";
pub const VALID_PASSWORD: &str = "secret";

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

pub struct TestServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests the backend has received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn echo(State(hits): State<Hits>, headers: HeaderMap) -> Json<Value> {
    hits.0.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "authorization": bearer(&headers) }))
}

async fn orders(State(hits): State<Hits>) -> StatusCode {
    hits.0.fetch_add(1, Ordering::SeqCst);
    StatusCode::UNAUTHORIZED
}

async fn missing(State(hits): State<Hits>) -> impl IntoResponse {
    hits.0.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, "no such thing")
}

async fn empty(State(hits): State<Hits>) -> StatusCode {
    hits.0.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn login(
    State(hits): State<Hits>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    hits.0.fetch_add(1, Ordering::SeqCst);
    if body["password"] == VALID_PASSWORD {
        (
            StatusCode::OK,
            Json(json!({ "token": VALID_TOKEN, "role": "seller" })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid credentials" })),
        )
    }
}

async fn me(State(hits): State<Hits>, headers: HeaderMap) -> impl IntoResponse {
    hits.0.fetch_add(1, Ordering::SeqCst);
    if bearer(&headers).as_deref() == Some("Bearer abc") {
        (
            StatusCode::OK,
            Json(json!({
                "email": "seller@example.com",
                "name": "Sam Seller",
                "role": "seller"
            })),
        )
            .into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// Serve the fake backend on an ephemeral port.
///
/// - `GET /api/echo` returns the received `Authorization` header
/// - `GET /api/orders` always answers 401
/// - `GET /api/missing` answers 404 with a text body
/// - `GET /api/empty` answers 204
/// - `POST /api/auth/login` issues `abc`/seller for the right password and
///   answers 401 otherwise
/// - `GET /api/users/me` requires `Bearer abc`
pub async fn spawn() -> TestServer {
    let hits = Hits::default();
    let app = Router::new()
        .route("/api/echo", get(echo))
        .route("/api/orders", get(orders))
        .route("/api/missing", get(missing))
        .route("/api/empty", get(empty))
        .route("/api/auth/login", post(login))
        .route("/api/users/me", get(me))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test backend");
    });

    TestServer {
        addr,
        hits: hits.0,
        handle,
    }
}

/// Address with nothing listening on it.
pub async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    format!("http://{}", addr)
}
