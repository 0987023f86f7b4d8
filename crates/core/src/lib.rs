//! Domain logic for the VerseCraft generation backend.
//!
//! Contains the workflow template model and the template engine that
//! parameterizes one concrete job per (image, prompt, lora) item.
//! No network I/O lives here; the engine client is in
//! `versecraft-comfyui`.

pub mod error;
pub mod workflow;
