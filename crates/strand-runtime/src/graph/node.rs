//! Node types with per-type config schemas.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strand_services::Timecode;

/// A workflow node: a typed unit of work plus editor metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Display label shown in the editor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Position on the canvas, irrelevant to execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// The node kind and its typed config.
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Creates a new node with the given kind.
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        Self {
            label: None,
            position: None,
            kind: kind.into(),
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Position in the visual editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// The kind of work a node performs, with its typed configuration.
///
/// Persisted as `{ "type": ..., "config": ... }`. Types this engine does
/// not recognize deserialize into [`NodeKind::Other`] and execute as a
/// skip rather than failing the run.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Emits its configured literal text.
    Text(TextConfig),
    /// Emits the URL of an image uploaded out-of-band.
    UploadImage(UploadConfig),
    /// Emits the URL of a video uploaded out-of-band.
    UploadVideo(UploadConfig),
    /// Calls the LLM completion service.
    Llm(LlmConfig),
    /// Crops an upstream image via the media transform service.
    CropImage(CropConfig),
    /// Extracts a frame from an upstream video.
    ExtractFrame(ExtractFrameConfig),
    /// A node type this engine does not recognize.
    Other {
        /// The persisted type tag.
        type_name: String,
        /// The raw persisted config.
        config: serde_json::Value,
    },
}

impl NodeKind {
    /// Returns the persisted type tag for this kind.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::UploadImage(_) => "uploadImage",
            Self::UploadVideo(_) => "uploadVideo",
            Self::Llm(_) => "llm",
            Self::CropImage(_) => "cropImage",
            Self::ExtractFrame(_) => "extractFrame",
            Self::Other { type_name, .. } => type_name,
        }
    }

    /// Returns the config as a JSON object for input aggregation.
    ///
    /// Non-object configs (possible for unrecognized types) aggregate as
    /// an empty object.
    pub fn config_json(&self) -> serde_json::Map<String, serde_json::Value> {
        let value = match self {
            Self::Text(c) => serde_json::to_value(c),
            Self::UploadImage(c) | Self::UploadVideo(c) => serde_json::to_value(c),
            Self::Llm(c) => serde_json::to_value(c),
            Self::CropImage(c) => serde_json::to_value(c),
            Self::ExtractFrame(c) => serde_json::to_value(c),
            Self::Other { config, .. } => Ok(config.clone()),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Wire representation of a node kind.
#[derive(Serialize, Deserialize)]
struct RawKind {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    config: serde_json::Value,
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let config = match self {
            Self::Other { config, .. } => config.clone(),
            _ => serde_json::Value::Object(self.config_json()),
        };
        RawKind {
            type_name: self.type_name().to_owned(),
            config,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawKind::deserialize(deserializer)?;
        // A null config reads as an empty object so all-optional config
        // structs deserialize cleanly.
        let config = match raw.config {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            other => other,
        };

        match raw.type_name.as_str() {
            "text" => serde_json::from_value(config).map(Self::Text),
            "uploadImage" => serde_json::from_value(config).map(Self::UploadImage),
            "uploadVideo" => serde_json::from_value(config).map(Self::UploadVideo),
            "llm" => serde_json::from_value(config).map(Self::Llm),
            "cropImage" => serde_json::from_value(config).map(Self::CropImage),
            "extractFrame" => serde_json::from_value(config).map(Self::ExtractFrame),
            _ => Ok(Self::Other {
                type_name: raw.type_name,
                config,
            }),
        }
        .map_err(D::Error::custom)
    }
}

/// Config for text literal nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    /// The literal text this node emits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<TextConfig> for NodeKind {
    fn from(config: TextConfig) -> Self {
        Self::Text(config)
    }
}

/// Config for media upload nodes.
///
/// The upload itself happens out-of-band before the run; the node only
/// carries the resulting URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// URL of the already-uploaded media, if any.
    #[serde(alias = "imageUrl", alias = "videoUrl")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Config for LLM completion nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier, provider default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// System prompt prepended to the user message.
    #[serde(alias = "systemPrompt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Primary user message.
    #[serde(alias = "userMessage")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    /// Fallback prompt used when no user message is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl From<LlmConfig> for NodeKind {
    fn from(config: LlmConfig) -> Self {
        Self::Llm(config)
    }
}

/// Config for image crop nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    /// Target width as a percentage of the source width.
    #[serde(alias = "widthPercent", alias = "width_percent")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Target height as a percentage of the source height.
    #[serde(alias = "heightPercent", alias = "height_percent")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl From<CropConfig> for NodeKind {
    fn from(config: CropConfig) -> Self {
        Self::CropImage(config)
    }
}

/// Config for frame extraction nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractFrameConfig {
    /// Which frame to extract, in seconds or as a `"NN%"` position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timecode>,
}

impl From<ExtractFrameConfig> for NodeKind {
    fn from(config: ExtractFrameConfig) -> Self {
        Self::ExtractFrame(config)
    }
}
