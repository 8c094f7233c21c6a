#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use base64::Engine as _;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use cad3d_api::config::ServerConfig;
use cad3d_api::router::build_app_router;
use cad3d_api::state::AppState;
use cad3d_cloud::local::LocalObjectStore;
use cad3d_core::engine::EngineCommand;
use cad3d_core::metadata::MetadataStore;
use cad3d_pipeline::publisher::Publisher;
use cad3d_pipeline::{Orchestrator, OrchestratorConfig};

pub const PUBLIC_URL: &str = "http://localhost:3000/storage";

/// Engine that "converts" by copying the drawing to the output path.
pub const COPY_ENGINE: &str = "cp \"$1\" \"$2\"\n";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_body_bytes: 1024 * 1024,
    }
}

/// Scratch directories backing a test app. Dropping it removes them.
pub struct TestDirs {
    pub staging: TempDir,
    pub storage: TempDir,
    pub scripts: TempDir,
}

impl TestDirs {
    pub fn staged_entries(&self) -> usize {
        std::fs::read_dir(self.staging.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Build the full application router with a bash-script engine and the
/// local storage backend (served under `/storage`).
pub fn build_test_app(pool: Option<PgPool>, engine_body: &str) -> (Router, TestDirs) {
    let dirs = TestDirs {
        staging: tempfile::tempdir().unwrap(),
        storage: tempfile::tempdir().unwrap(),
        scripts: tempfile::tempdir().unwrap(),
    };

    let script = dirs.scripts.path().join("engine.sh");
    std::fs::write(&script, format!("#!/bin/bash\n{engine_body}")).unwrap();
    let engine = EngineCommand {
        program: "/bin/bash".into(),
        args: vec![script.to_string_lossy().into_owned()],
        timeout: Duration::from_secs(10),
    };

    let metadata = pool
        .clone()
        .map(|pool| Arc::new(cad3d_db::PgMetadataStore::new(pool)) as Arc<dyn MetadataStore>);
    let publisher = Publisher::new(
        Arc::new(LocalObjectStore::new(dirs.storage.path(), "drawings", PUBLIC_URL)),
        Arc::new(LocalObjectStore::new(dirs.storage.path(), "models", PUBLIC_URL)),
    );
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::new(dirs.staging.path(), engine),
        publisher,
        metadata,
    );

    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
        local_storage: Some(dirs.storage.path().to_path_buf()),
    };

    (build_app_router(state, &config), dirs)
}

pub fn png(payload: &str) -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(payload.as_bytes());
    bytes
}

pub fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Strip the public base from a locator, leaving `/storage/...` for the router.
pub fn storage_path(url: &str) -> String {
    let rest = url.strip_prefix(PUBLIC_URL).expect("locator under public base");
    format!("/storage{rest}")
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Send a CORS preflight for a JSON POST to `uri` from `origin`.
pub async fn preflight(app: Router, uri: &str, origin: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
