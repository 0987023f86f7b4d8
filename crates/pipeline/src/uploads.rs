//! Upload and artifact file helpers.
//!
//! Inbound images arrive base64-encoded; they are decoded and written
//! under a per-batch namespace directory so concurrent batches sharing
//! one upload directory never collide on filenames. Generated
//! artifacts are read back from the engine's output directory and
//! re-encoded for the response.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use uuid::Uuid;

/// Errors while persisting uploaded images.
///
/// These surface before any per-item pipeline work; a malformed upload
/// fails the whole request as a client error.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The payload at `index` is not valid base64.
    #[error("Failed to decode image {index}: {source}")]
    Decode {
        index: usize,
        source: base64::DecodeError,
    },

    /// The decoded image could not be written to disk.
    #[error("Failed to save image {index}: {source}")]
    Io {
        index: usize,
        source: std::io::Error,
    },
}

/// Decode and save base64 images under `{upload_dir}/{batch_id}/`.
///
/// A `data:` URL prefix, if present, is stripped before decoding.
/// Returns the absolute path of each saved file, in input order.
pub fn save_base64_images(
    upload_dir: &Path,
    batch_id: Uuid,
    images_base64: &[String],
) -> Result<Vec<PathBuf>, UploadError> {
    let batch_dir = upload_dir.join(batch_id.to_string());
    std::fs::create_dir_all(&batch_dir).map_err(|source| UploadError::Io { index: 0, source })?;

    let mut paths = Vec::with_capacity(images_base64.len());
    for (index, encoded) in images_base64.iter().enumerate() {
        // Browsers send `data:image/png;base64,<payload>`.
        let payload = match encoded.split_once(',') {
            Some((_, rest)) => rest,
            None => encoded.as_str(),
        };

        let bytes = BASE64
            .decode(payload)
            .map_err(|source| UploadError::Decode { index, source })?;

        let path = batch_dir.join(format!("upload_{index}.png"));
        std::fs::write(&path, bytes).map_err(|source| UploadError::Io { index, source })?;

        let absolute = path
            .canonicalize()
            .map_err(|source| UploadError::Io { index, source })?;
        paths.push(absolute);
    }

    Ok(paths)
}

/// Read a generated artifact and base64-encode it for the response.
pub fn encode_artifact(output_dir: &Path, filename: &str) -> std::io::Result<String> {
    let bytes = std::fs::read(output_dir.join(filename))?;
    Ok(BASE64.encode(bytes))
}
