//! Media transform contracts: image cropping and frame extraction.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ServiceResult;

/// A point in a video, either absolute or relative to its duration.
///
/// Serialized as a plain number of seconds or a `"NN%"` string, matching
/// the transform provider's wire format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timecode {
    /// Offset from the start of the video, in seconds.
    Seconds(f64),
    /// Position as a percentage of the video duration.
    Percent(f64),
}

impl Serialize for Timecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Seconds(secs) => serializer.serialize_f64(*secs),
            Self::Percent(pct) => serializer.serialize_str(&format!("{pct}%")),
        }
    }
}

impl<'de> Deserialize<'de> for Timecode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(secs) => Ok(Self::Seconds(secs)),
            Raw::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

impl std::str::FromStr for Timecode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(pct) = s.strip_suffix('%') {
            let value: f64 = pct
                .trim()
                .parse()
                .map_err(|_| format!("invalid percentage timecode: {s:?}"))?;
            Ok(Self::Percent(value))
        } else {
            let value: f64 = s
                .parse()
                .map_err(|_| format!("invalid timecode: {s:?}"))?;
            Ok(Self::Seconds(value))
        }
    }
}

/// A single crop-transform call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRequest {
    /// Source image URL.
    pub image_url: String,
    /// Target width as a percentage of the source width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Target height as a percentage of the source height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A single frame-extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRequest {
    /// Source video URL.
    pub video_url: String,
    /// Which frame to extract; provider default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timecode>,
}

/// Result of a media transform: the URL of the produced asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaOutput {
    /// URL of the transformed media.
    pub url: String,
}

/// Media transform capability.
#[async_trait::async_trait]
pub trait MediaTransformService: Send + Sync {
    /// Crops an image to the requested percentage dimensions.
    async fn crop_image(&self, request: CropRequest) -> ServiceResult<MediaOutput>;

    /// Extracts a single frame from a video.
    async fn extract_frame(&self, request: FrameRequest) -> ServiceResult<MediaOutput>;
}

#[async_trait::async_trait]
impl<T: MediaTransformService + ?Sized> MediaTransformService for std::sync::Arc<T> {
    async fn crop_image(&self, request: CropRequest) -> ServiceResult<MediaOutput> {
        (**self).crop_image(request).await
    }

    async fn extract_frame(&self, request: FrameRequest) -> ServiceResult<MediaOutput> {
        (**self).extract_frame(request).await
    }
}
