//! Shared helpers for engine client integration tests.
//!
//! Tests run against a small in-process axum server standing in for
//! the execution engine, so every HTTP path (status codes, bodies,
//! timeouts) is exercised end to end without a real ComfyUI instance.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::Router;
use uuid::Uuid;
use versecraft_core::workflow::{ConcreteJob, WorkflowTemplate};

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_engine(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock engine");
    let addr = listener.local_addr().expect("mock engine addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock engine serve");
    });

    format!("http://{addr}")
}

/// Build a minimal valid concrete job backed by a real temp image.
///
/// Returns the temp dir alongside the job so the image file outlives
/// the test body.
pub fn sample_job() -> (tempfile::TempDir, ConcreteJob) {
    let dir = tempfile::tempdir().expect("tempdir");
    let image: PathBuf = dir.path().join("input.png");
    std::fs::write(&image, b"png-bytes").expect("write image");

    let template: WorkflowTemplate = serde_json::from_value(serde_json::json!({
        "1": {"class_type": "LoadImage", "inputs": {}},
        "2": {"class_type": "CLIPTextEncode", "inputs": {}},
        "3": {"class_type": "LoraLoaderModelOnly", "inputs": {}},
        "4": {"class_type": "SaveImage", "inputs": {}}
    }))
    .expect("parse template");

    let job = template
        .instantiate(&image, "a prompt", "style", Uuid::new_v4())
        .expect("instantiate");

    (dir, job)
}
