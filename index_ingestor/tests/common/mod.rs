#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
};
use serde::Deserialize;

/// Counts hits per route so tests can assert on the fallback order.
#[derive(Clone, Default)]
pub struct Hits {
    pub kline: Arc<AtomicUsize>,
    pub broken: Arc<AtomicUsize>,
    pub garbage: Arc<AtomicUsize>,
    pub slow: Arc<AtomicUsize>,
}

impl Hits {
    pub fn get(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Deserialize)]
struct KlineQuery {
    secid: String,
}

pub const GROWTH_BODY: &str = r#"{"rc":0,"data":{"code":"000918","name":"300成长","klines":["2024-01-02,100.0","2024-01-03,110.0"]}}"#;
pub const VALUE_BODY: &str = r#"{"rc":0,"data":{"code":"000919","name":"300价值","klines":["2024-01-02,100.0","2024-01-03,100.0"]}}"#;

async fn kline(
    State(hits): State<Hits>,
    headers: HeaderMap,
    Query(q): Query<KlineQuery>,
) -> (StatusCode, String) {
    hits.kline.fetch_add(1, Ordering::SeqCst);
    if headers.get("x-test-token").is_none() {
        return (StatusCode::FORBIDDEN, "missing token".to_string());
    }
    match q.secid.as_str() {
        "1.000918" => (StatusCode::OK, GROWTH_BODY.to_string()),
        "1.000919" => (StatusCode::OK, VALUE_BODY.to_string()),
        _ => (StatusCode::OK, r#"{"rc":102,"data":null}"#.to_string()),
    }
}

async fn broken(State(hits): State<Hits>) -> StatusCode {
    hits.broken.fetch_add(1, Ordering::SeqCst);
    StatusCode::BAD_GATEWAY
}

async fn garbage(State(hits): State<Hits>) -> &'static str {
    hits.garbage.fetch_add(1, Ordering::SeqCst);
    "<html>captcha</html>"
}

async fn slow(State(hits): State<Hits>) -> &'static str {
    hits.slow.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    GROWTH_BODY
}

/// Starts a stand-in upstream on an ephemeral port.
pub async fn spawn_upstream() -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/kline", get(kline))
        .route("/broken", get(broken))
        .route("/garbage", get(garbage))
        .route("/slow", get(slow))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
