//! Per-node-type execution handlers.

use serde_json::{Map, Value, json};
use strand_services::{
    CompletionRequest, CompletionService, CropRequest, FrameRequest, MediaTransformService,
    Timecode,
};

use super::input::IMAGES_HANDLE;
use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{NodeId, NodeKind};

/// Field names an upstream image URL may arrive under.
const IMAGE_URL_ALIASES: &[&str] = &["image", "imageUrl", "image_url", "url"];

/// Field names an upstream video URL may arrive under.
const VIDEO_URL_ALIASES: &[&str] = &["video", "videoUrl", "video_url", "url"];

/// Executes a node's work against its aggregated input.
///
/// Returns the node's outputs object, or an error that fails only this
/// node. Capability calls arrive here already wrapped in their retry
/// policies, so any service error is terminal.
pub(super) async fn run_node(
    node_id: NodeId,
    kind: &NodeKind,
    input: &Map<String, Value>,
    completion: &dyn CompletionService,
    media: &dyn MediaTransformService,
) -> WorkflowResult<Value> {
    match kind {
        NodeKind::Text(config) => Ok(json!({
            "output": config.text,
            "text": config.text,
        })),

        NodeKind::UploadImage(config) | NodeKind::UploadVideo(config) => Ok(json!({
            "output": config.url,
            "url": config.url,
        })),

        NodeKind::Llm(_) => {
            let prompt = compose_prompt(input)
                .ok_or_else(|| WorkflowError::invalid_input(node_id, "no prompt provided"))?;
            let images = image_urls(input);
            let mut request = CompletionRequest::new(prompt).with_images(images);
            request.model = find_string(input, &["model"]).map(str::to_owned);

            let text = completion.complete(request).await?;
            Ok(json!({ "output": text, "text": text }))
        }

        NodeKind::CropImage(_) => {
            let image_url = find_string(input, IMAGE_URL_ALIASES)
                .ok_or_else(|| WorkflowError::invalid_input(node_id, "no input image to crop"))?;
            let request = CropRequest {
                image_url: image_url.to_owned(),
                width: find_number(input, &["width", "widthPercent", "width_percent"]),
                height: find_number(input, &["height", "heightPercent", "height_percent"]),
            };

            let output = media.crop_image(request).await?;
            Ok(json!({ "output": output.url, "url": output.url }))
        }

        NodeKind::ExtractFrame(_) => {
            let video_url = find_string(input, VIDEO_URL_ALIASES).ok_or_else(|| {
                WorkflowError::invalid_input(node_id, "no input video for frame extraction")
            })?;
            let request = FrameRequest {
                video_url: video_url.to_owned(),
                timestamp: timecode(node_id, input)?,
            };

            let output = media.extract_frame(request).await?;
            Ok(json!({ "output": output.url, "url": output.url, "image": output.url }))
        }

        NodeKind::Other { type_name, .. } => {
            tracing::debug!(
                target: crate::TRACING_TARGET,
                node_id = %node_id,
                node_type = %type_name,
                "Unknown node type, skipping"
            );
            Ok(json!({ "status": "skipped" }))
        }
    }
}

/// Returns the first non-empty string among the aliased fields.
fn find_string<'a>(input: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|key| input.get(*key))
        .filter_map(Value::as_str)
        .find(|value| !value.is_empty())
}

/// Returns the first numeric value among the aliased fields.
fn find_number(input: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    aliases
        .iter()
        .filter_map(|key| input.get(*key))
        .find_map(Value::as_f64)
}

/// Composes the completion prompt from the aggregated input.
///
/// The user message (falling back to `prompt`) is required; a system
/// prompt, when present, is prepended with a blank line separator.
fn compose_prompt(input: &Map<String, Value>) -> Option<String> {
    let system = find_string(input, &["system_prompt", "systemPrompt"]);
    let message = find_string(input, &["user_message", "userMessage", "prompt", "text"])?;

    Some(match system {
        Some(system) => format!("{system}\n\n{message}"),
        None => message.to_owned(),
    })
}

/// Collects the image URLs accumulated under the `images` handle.
fn image_urls(input: &Map<String, Value>) -> Vec<String> {
    match input.get(IMAGES_HANDLE) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Some(Value::String(url)) => vec![url.clone()],
        _ => Vec::new(),
    }
}

/// Reads the frame timestamp, failing the node on an unparsable value.
fn timecode(node_id: NodeId, input: &Map<String, Value>) -> WorkflowResult<Option<Timecode>> {
    match input.get("timestamp") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| WorkflowError::invalid_input(node_id, format!("bad timestamp: {e}"))),
    }
}
