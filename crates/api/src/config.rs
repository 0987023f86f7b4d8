use std::path::PathBuf;

use versecraft_comfyui::PollerConfig;
use versecraft_pipeline::PipelineConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables. Constructed once
/// at startup and read-only afterwards -- handlers receive it behind an
/// `Arc`, never through hidden globals.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600` -- a batch
    /// legitimately waits on generation).
    pub request_timeout_secs: u64,
    /// Path of the workflow template JSON.
    pub workflow_template: PathBuf,
    /// Directory uploaded images are written under (namespaced per batch).
    pub upload_dir: PathBuf,
    /// Directory the engine writes generated artifacts to.
    pub output_dir: PathBuf,
    /// Full submission endpoint of the execution engine.
    pub comfyui_api: String,
    /// Engine base URL for the history API, derived from `comfyui_api`.
    pub comfyui_base_url: String,
    /// Chat upstream endpoint; empty means the chat path is not configured.
    pub ai_api_url: String,
    /// Chat upstream bearer credential; empty means not configured.
    pub ai_api_key: String,
    /// Optional cap on completion-poll attempts per job. Unset retries
    /// forever.
    pub poll_max_attempts: Option<u32>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                             |
    /// |------------------------|-------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                           |
    /// | `PORT`                 | `8000`                              |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`             |
    /// | `REQUEST_TIMEOUT_SECS` | `600`                               |
    /// | `WORKFLOW_TEMPLATE`    | `workflow.json`                     |
    /// | `UPLOAD_DIR`           | `ComfyUI/input/uploaded_images`     |
    /// | `DEFAULT_OUTPUT_DIR`   | `ComfyUI/output`                    |
    /// | `COMFYUI_API`          | `http://localhost:8188/api/prompt`  |
    /// | `AI_API_URL`           | (empty)                             |
    /// | `AI_API_KEY`           | (empty)                             |
    /// | `POLL_MAX_ATTEMPTS`    | (unset -- unlimited)                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let workflow_template =
            PathBuf::from(std::env::var("WORKFLOW_TEMPLATE").unwrap_or_else(|_| "workflow.json".into()));

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "ComfyUI/input/uploaded_images".into()),
        );

        let output_dir = PathBuf::from(
            std::env::var("DEFAULT_OUTPUT_DIR").unwrap_or_else(|_| "ComfyUI/output".into()),
        );

        let comfyui_api = std::env::var("COMFYUI_API")
            .unwrap_or_else(|_| "http://localhost:8188/api/prompt".into());
        let comfyui_base_url = derive_base_url(&comfyui_api);

        let ai_api_url = std::env::var("AI_API_URL").unwrap_or_default();
        let ai_api_key = std::env::var("AI_API_KEY").unwrap_or_default();

        let poll_max_attempts = std::env::var("POLL_MAX_ATTEMPTS").ok().map(|raw| {
            raw.parse()
                .expect("POLL_MAX_ATTEMPTS must be a valid u32")
        });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            workflow_template,
            upload_dir,
            output_dir,
            comfyui_api,
            comfyui_base_url,
            ai_api_url,
            ai_api_key,
            poll_max_attempts,
        }
    }

    /// Poller tuning derived from this configuration.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            max_attempts: self.poll_max_attempts,
            ..PollerConfig::default()
        }
    }

    /// Pipeline settings derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            template_path: self.workflow_template.clone(),
            output_dir: self.output_dir.clone(),
            poller: self.poller_config(),
        }
    }
}

/// Reduce a full endpoint URL to its `scheme://host[:port]` origin.
///
/// Falls back to the default engine address when the URL does not
/// parse, mirroring the permissive startup behavior of the original
/// service.
fn derive_base_url(endpoint: &str) -> String {
    match reqwest::Url::parse(endpoint) {
        Ok(url) if url.has_host() => {
            let mut base = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
            if let Some(port) = url.port() {
                base.push_str(&format!(":{port}"));
            }
            base
        }
        _ => "http://localhost:8188".to_string(),
    }
}
