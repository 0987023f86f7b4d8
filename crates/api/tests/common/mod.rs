//! Shared helpers for API integration tests.
//!
//! Builds the full application router with the same middleware stack
//! production uses, wired to temp directories and (where a test needs
//! one) an in-process mock engine or chat upstream.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Path;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use versecraft_comfyui::ComfyUIApi;
use versecraft_pipeline::BatchPipeline;

use versecraft_api::chat::ChatClient;
use versecraft_api::config::ServerConfig;
use versecraft_api::routes;
use versecraft_api::state::AppState;

/// Build a test `ServerConfig` rooted in a temp directory.
///
/// The engine endpoint defaults to an unroutable local port; tests
/// that exercise the engine path override `comfyui_api` and
/// `comfyui_base_url` with a mock server's address.
pub fn test_config(dir: &tempfile::TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        workflow_template: dir.path().join("workflow.json"),
        upload_dir: dir.path().join("uploads"),
        output_dir: dir.path().join("output"),
        comfyui_api: "http://127.0.0.1:9/api/prompt".to_string(),
        comfyui_base_url: "http://127.0.0.1:9".to_string(),
        ai_api_url: String::new(),
        ai_api_key: String::new(),
        poll_max_attempts: Some(20),
    }
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(mut config: ServerConfig) -> Router {
    // Tests want fast polling regardless of the defaults.
    let mut pipeline_config = config.pipeline_config();
    pipeline_config.poller.poll_interval = Duration::from_millis(10);
    pipeline_config.poller.timeout_backoff = Duration::from_millis(10);
    pipeline_config.poller.request_timeout = Duration::from_millis(500);

    let api = ComfyUIApi::new(config.comfyui_api.clone(), config.comfyui_base_url.clone());
    let pipeline = Arc::new(BatchPipeline::new(api, pipeline_config));
    let chat = Arc::new(ChatClient::new(
        config.ai_api_url.clone(),
        config.ai_api_key.clone(),
    ));

    config.host = "127.0.0.1".to_string();
    let state = AppState {
        config: Arc::new(config),
        pipeline,
        chat,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:3000".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::router())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get_request(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a JSON POST request against the app.
pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Write a complete workflow template into the config's template path.
pub fn write_template(config: &ServerConfig) {
    write_template_json(
        config,
        json!({
            "1": {"class_type": "LoadImage", "inputs": {}},
            "2": {"class_type": "CLIPTextEncode", "inputs": {}},
            "3": {"class_type": "LoraLoaderModelOnly", "inputs": {}},
            "4": {"class_type": "KSampler", "inputs": {"steps": 20}},
            "5": {"class_type": "SaveImage", "inputs": {}}
        }),
    );
}

/// Write a template missing the text encoder node.
pub fn write_template_without_text_encoder(config: &ServerConfig) {
    write_template_json(
        config,
        json!({
            "1": {"class_type": "LoadImage", "inputs": {}},
            "3": {"class_type": "LoraLoaderModelOnly", "inputs": {}},
            "5": {"class_type": "SaveImage", "inputs": {}}
        }),
    );
}

fn write_template_json(config: &ServerConfig, template: Value) {
    std::fs::write(&config.workflow_template, template.to_string()).expect("write template");
}

/// Filename the mock engine's history endpoint reports.
pub const ARTIFACT_NAME: &str = "generated.png";

/// Spawn a mock engine that accepts every submission and immediately
/// reports completion with [`ARTIFACT_NAME`]. Returns its base URL.
pub async fn spawn_engine() -> String {
    let app = Router::new()
        .route(
            "/api/prompt",
            post(|| async { Json(json!({"prompt_id": "p-0", "number": 0})) }),
        )
        .route(
            "/history/{id}",
            get(|Path(id): Path<String>| async move {
                Json(json!({
                    id: {
                        "outputs": {
                            "9": {"images": [{"filename": ARTIFACT_NAME, "subfolder": "", "type": "output"}]}
                        }
                    }
                }))
            }),
        );
    spawn_app(app).await
}

/// Serve an arbitrary router on an ephemeral port, returning its base URL.
pub async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server serve");
    });
    format!("http://{addr}")
}

/// Prepare template, dirs, and artifact for a happy-path generate call.
pub fn seed_generation_files(config: &ServerConfig) {
    write_template(config);
    std::fs::create_dir_all(&config.upload_dir).expect("create upload dir");
    std::fs::create_dir_all(&config.output_dir).expect("create output dir");
    std::fs::write(config.output_dir.join(ARTIFACT_NAME), b"generated-bytes")
        .expect("seed artifact");
}

/// Absolute path helper for assertions on upload namespacing.
pub fn upload_dir(config: &ServerConfig) -> PathBuf {
    config.upload_dir.clone()
}
