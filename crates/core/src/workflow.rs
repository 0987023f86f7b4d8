//! Workflow template model and per-item parameterization.
//!
//! A workflow is the ComfyUI-style node graph: an ordered map from node
//! id to a node carrying a `class_type` tag and an `inputs` map. The
//! template is loaded once per batch request and cloned per item;
//! [`WorkflowTemplate::instantiate`] substitutes the item-specific slot
//! values by node kind and leaves the rest of the graph untouched.

use std::path::Path;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Node kinds
// ---------------------------------------------------------------------------

/// Class types the template engine knows how to parameterize.
///
/// Matching on this enum is exhaustive, so adding a kind forces every
/// substitution site to handle it. Unrecognized class types map to
/// [`NodeKind::Other`] and pass through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Image input node (`LoadImage`): receives the uploaded image path.
    ImageInput,
    /// Text encoder node (`CLIPTextEncode`): receives the prompt text.
    TextEncoder,
    /// Style adapter node (`LoraLoaderModelOnly`): receives the lora name.
    StyleAdapter,
    /// Sampler node (`KSampler`): receives a fresh random seed.
    Sampler,
    /// Image output node (`SaveImage`): receives the filename prefix.
    ImageOutput,
    /// Any other node: left untouched.
    Other,
}

/// Class type of the image input node.
pub const CLASS_IMAGE_INPUT: &str = "LoadImage";
/// Class type of the text encoder node.
pub const CLASS_TEXT_ENCODER: &str = "CLIPTextEncode";
/// Class type of the style adapter node.
pub const CLASS_STYLE_ADAPTER: &str = "LoraLoaderModelOnly";
/// Class type of the sampler node.
pub const CLASS_SAMPLER: &str = "KSampler";
/// Class type of the image output node.
pub const CLASS_IMAGE_OUTPUT: &str = "SaveImage";

/// Node kinds that must be present for instantiation to proceed.
///
/// The sampler is not required; a template without one simply gets no
/// seed assignment.
pub const REQUIRED_CLASS_TYPES: &[&str] = &[
    CLASS_IMAGE_INPUT,
    CLASS_TEXT_ENCODER,
    CLASS_STYLE_ADAPTER,
    CLASS_IMAGE_OUTPUT,
];

impl NodeKind {
    /// Classify a raw `class_type` tag.
    pub fn from_class_type(class_type: &str) -> Self {
        match class_type {
            CLASS_IMAGE_INPUT => NodeKind::ImageInput,
            CLASS_TEXT_ENCODER => NodeKind::TextEncoder,
            CLASS_STYLE_ADAPTER => NodeKind::StyleAdapter,
            CLASS_SAMPLER => NodeKind::Sampler,
            CLASS_IMAGE_OUTPUT => NodeKind::ImageOutput,
            _ => NodeKind::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Template parameters
// ---------------------------------------------------------------------------

/// File extension every lora name must carry when sent to the engine.
pub const LORA_SUFFIX: &str = ".safetensors";
/// Fixed model strength applied to the style adapter node.
pub const LORA_STRENGTH: f64 = 0.8;
/// Upper bound (inclusive) for the per-job sampler seed.
pub const MAX_SEED: u64 = 999_999;
/// Second-resolution, lexicographically sortable timestamp format used
/// in output filename prefixes.
const PREFIX_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

// ---------------------------------------------------------------------------
// Workflow graph
// ---------------------------------------------------------------------------

/// One node of the workflow graph.
///
/// Only `class_type` and `inputs` are interpreted; every other field is
/// preserved verbatim so unknown node shapes survive a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Node kind tag, e.g. `KSampler`.
    pub class_type: String,
    /// Input slot name to value.
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,
    /// Fields this engine does not interpret (e.g. `_meta`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl WorkflowNode {
    /// Classify this node's `class_type`.
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_class_type(&self.class_type)
    }
}

/// Reusable workflow template: an ordered map from node id to node.
///
/// Immutable after load; [`instantiate`](Self::instantiate) clones it
/// per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowTemplate {
    nodes: IndexMap<String, WorkflowNode>,
}

/// A fully parameterized workflow for a single batch item, ready for
/// submission to the execution engine.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ConcreteJob {
    nodes: IndexMap<String, WorkflowNode>,
}

impl ConcreteJob {
    /// The parameterized nodes, in template order.
    pub fn nodes(&self) -> &IndexMap<String, WorkflowNode> {
        &self.nodes
    }
}

impl WorkflowTemplate {
    /// Load a template from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ValidationError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The template's nodes, in file order.
    pub fn nodes(&self) -> &IndexMap<String, WorkflowNode> {
        &self.nodes
    }

    /// True if any node in the template has the given class type.
    fn has_class_type(&self, class_type: &str) -> bool {
        self.nodes
            .values()
            .any(|node| node.class_type == class_type)
    }

    /// Produce a concrete job for one (image, prompt, lora, task) tuple.
    ///
    /// Required node kinds are verified before the image-existence
    /// check, so a malformed template fails identically for every item
    /// regardless of its image. Substitution rules per kind:
    ///
    /// - image input: `image` slot set to the uploaded image path;
    /// - text encoder: `text` slot set to the trimmed prompt with
    ///   embedded double quotes escaped;
    /// - style adapter: `lora_name` slot set to the lora name (with
    ///   [`LORA_SUFFIX`] appended when missing) and `strength_model`
    ///   set to [`LORA_STRENGTH`];
    /// - image output: `filename_prefix` set to
    ///   `<timestamp>_<task_id>`, making artifacts traceable back to
    ///   the task without a side-channel index;
    /// - sampler: `seed` set to a fresh random value so repeated
    ///   submissions produce independent outputs.
    ///
    /// Nodes of any other kind are left untouched.
    pub fn instantiate(
        &self,
        image_path: &Path,
        prompt: &str,
        lora_name: &str,
        task_id: Uuid,
    ) -> Result<ConcreteJob, ValidationError> {
        for class_type in REQUIRED_CLASS_TYPES {
            if !self.has_class_type(class_type) {
                return Err(ValidationError::MissingNode { class_type });
            }
        }

        if !image_path.is_file() {
            return Err(ValidationError::ImageNotFound {
                path: image_path.to_path_buf(),
            });
        }

        let mut nodes = self.nodes.clone();
        for node in nodes.values_mut() {
            match node.kind() {
                NodeKind::ImageInput => {
                    node.inputs.insert(
                        "image".to_string(),
                        Value::String(image_path.display().to_string()),
                    );
                }
                NodeKind::TextEncoder => {
                    let cleaned = prompt.trim().replace('"', "\\\"");
                    node.inputs.insert("text".to_string(), Value::String(cleaned));
                }
                NodeKind::StyleAdapter => {
                    let mut name = lora_name.to_string();
                    if !name.ends_with(LORA_SUFFIX) {
                        name.push_str(LORA_SUFFIX);
                    }
                    node.inputs
                        .insert("lora_name".to_string(), Value::String(name));
                    node.inputs
                        .insert("strength_model".to_string(), Value::from(LORA_STRENGTH));
                }
                NodeKind::ImageOutput => {
                    let timestamp = chrono::Local::now().format(PREFIX_TIMESTAMP_FORMAT);
                    node.inputs.insert(
                        "filename_prefix".to_string(),
                        Value::String(format!("{timestamp}_{task_id}")),
                    );
                }
                NodeKind::Sampler => {
                    let seed = rand::rng().random_range(0..=MAX_SEED);
                    node.inputs.insert("seed".to_string(), Value::from(seed));
                }
                NodeKind::Other => {}
            }
        }

        Ok(ConcreteJob { nodes })
    }
}
