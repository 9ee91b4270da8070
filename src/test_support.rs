//! Shared helpers for unit and HTTP tests.

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tower::ServiceExt;

use crate::app::build_router;
use crate::config::Config;
use crate::memory::MemoryStore;
use crate::models::{NewRoute, NewUser, Route, User};
use crate::state::AppState;
use crate::store::{Store, StoreError, StoreResult};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that read or write process environment variables
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub fn app_with_store(store: Arc<dyn Store>) -> Router {
    build_router(AppState::new(store, Config::in_memory()))
}

pub fn app_with_deadline(store: Arc<dyn Store>, deadline: Duration) -> Router {
    let config = Config {
        db_timeout: deadline,
        ..Config::in_memory()
    };
    build_router(AppState::new(store, config))
}

/// A router backed by a fresh in-memory store, plus the store for assertions
pub fn memory_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (app_with_store(store.clone()), store)
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn send_empty(app: &Router, method: &str, uri: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// A store whose every call fails, for exercising 500 paths
pub struct FailingStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
}

#[async_trait]
impl Store for FailingStore {
    async fn sample_users(&self, _limit: usize) -> StoreResult<Vec<User>> {
        unavailable()
    }

    async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
        unavailable()
    }

    async fn insert_user(&self, _user: NewUser) -> StoreResult<User> {
        unavailable()
    }

    async fn insert_route(&self, _route: NewRoute) -> StoreResult<Route> {
        unavailable()
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        unavailable()
    }
}

/// A store that never answers, for exercising the call deadline
pub struct HangingStore;

async fn hang<T>() -> StoreResult<T> {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    unavailable()
}

#[async_trait]
impl Store for HangingStore {
    async fn sample_users(&self, _limit: usize) -> StoreResult<Vec<User>> {
        hang().await
    }

    async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
        hang().await
    }

    async fn insert_user(&self, _user: NewUser) -> StoreResult<User> {
        hang().await
    }

    async fn insert_route(&self, _route: NewRoute) -> StoreResult<Route> {
        hang().await
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        hang().await
    }
}

/// Collects formatted log output so tests can assert on what was written
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install a debug-level subscriber writing into a fresh buffer for this thread
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(buffer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
