//! Test utilities for proxy module testing
//!
//! A mock origin server, view stores that misbehave on purpose and helpers
//! for waiting on background accounting.

use crate::domain::{ModifiedCount, StoreError, UpstreamTarget, VideoKey, ViewStore};
use crate::proxy::{ProxyConfig, ProxyService};
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::connect_info::MockConnectInfo;
use axum::extract::{Path, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use futures_util::{stream, StreamExt};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Address the mock client connects from
pub const TEST_CLIENT_ADDR: ([u8; 4], u16) = ([10, 0, 0, 7], 50123);

/// Playlist served by the mock origin
pub const MASTER_PLAYLIST: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n\
360p/index.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720\n\
720p/index.m3u8\n";

/// Chunks the `/stream` route emits one at a time
pub const STREAM_CHUNKS: [&str; 3] = ["segment-part-1;", "segment-part-2;", "segment-part-3"];

/// Store whose every call fails, as if the database were down
pub struct FailingViewStore;

#[async_trait]
impl ViewStore for FailingViewStore {
    async fn increment_views(&self, _key: &VideoKey) -> Result<ModifiedCount, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn views(&self, _key: &VideoKey) -> Result<Option<i64>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Store whose increments never complete
pub struct StalledViewStore;

#[async_trait]
impl ViewStore for StalledViewStore {
    async fn increment_views(&self, _key: &VideoKey) -> Result<ModifiedCount, StoreError> {
        std::future::pending().await
    }

    async fn views(&self, _key: &VideoKey) -> Result<Option<i64>, StoreError> {
        Ok(None)
    }
}

/// Poll a store until `key` reaches `expected` views or two seconds pass.
pub async fn wait_for_views(store: &dyn ViewStore, key: &VideoKey, expected: i64) -> Option<i64> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let views = store.views(key).await.ok().flatten();
        if views == Some(expected) || tokio::time::Instant::now() >= deadline {
            return views;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn mock_origin() -> Router {
    Router::new()
        .route(
            "/{owner}/{video}/master.m3u8",
            get(|| async {
                (
                    [
                        (header::CONTENT_TYPE, "application/vnd.apple.mpegurl"),
                        (header::CACHE_CONTROL, "max-age=60"),
                    ],
                    MASTER_PLAYLIST,
                )
            }),
        )
        .route(
            "/stream",
            get(|| async {
                let chunks = STREAM_CHUNKS
                    .iter()
                    .map(|chunk| Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())));
                Body::from_stream(stream::iter(chunks))
            }),
        )
        .route(
            "/status/{code}",
            get(|Path(code): Path<u16>| async move {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::OK);
                (status, "Status response")
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "Slow response"
            }),
        )
        .fallback(echo)
}

/// Echo the request the origin received as JSON
async fn echo(request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let mut headers = Map::new();
    for name in parts.headers.keys() {
        let values: Vec<Value> = parts
            .headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(v.to_str().unwrap_or_default().to_string()))
            .collect();
        headers.insert(name.to_string(), Value::Array(values));
    }

    Json(json!({
        "method": parts.method.as_str(),
        "uri": parts.uri.to_string(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response()
}

/// Start the mock origin on an ephemeral port
pub async fn spawn_mock_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock origin");
    serve_mock_origin(listener)
}

/// Start the mock origin on a specific address
pub async fn spawn_mock_origin_on(addr: SocketAddr) -> SocketAddr {
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind mock origin");
    serve_mock_origin(listener)
}

fn serve_mock_origin(listener: TcpListener) -> SocketAddr {
    let addr = listener.local_addr().expect("Mock origin has an address");
    tokio::spawn(async move {
        axum::serve(listener, mock_origin()).await.unwrap();
    });
    addr
}

/// Notifies when the body stream it travels with is dropped
struct DropSignal(Arc<Notify>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

/// Start an origin whose `/endless` body sends one chunk and then never
/// finishes. The returned `Notify` fires once that body is dropped.
pub async fn spawn_endless_origin() -> (SocketAddr, Arc<Notify>) {
    let dropped = Arc::new(Notify::new());
    let signal = dropped.clone();

    let origin = Router::new().route(
        "/endless",
        get(move || {
            let guard = DropSignal(signal.clone());
            async move {
                let first = stream::once(async {
                    Ok::<_, std::io::Error>(Bytes::from_static(b"first-chunk"))
                });
                let body = first.chain(stream::pending()).map(move |chunk| {
                    let _held = &guard;
                    chunk
                });
                Body::from_stream(body)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind endless origin");
    let addr = listener.local_addr().expect("Endless origin has an address");
    tokio::spawn(async move {
        axum::serve(listener, origin).await.unwrap();
    });
    (addr, dropped)
}

/// An address nothing is listening on
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    listener.local_addr().expect("Probe listener has an address")
}

pub fn proxy_config_for(origin: SocketAddr) -> ProxyConfig {
    let upstream = UpstreamTarget::parse(&format!("http://{origin}")).expect("valid origin");
    ProxyConfig::new(upstream)
}

/// Proxy router forwarding to `origin`, as seen from [`TEST_CLIENT_ADDR`]
pub fn proxy_app(config: ProxyConfig, store: Arc<dyn ViewStore>) -> Router {
    ProxyService::new(config, store)
        .into_router()
        .layer(MockConnectInfo(SocketAddr::from(TEST_CLIENT_ADDR)))
}

/// Collect a response into status, headers and body
pub async fn read_response(response: Response) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body");
    (parts.status, parts.headers, bytes)
}
