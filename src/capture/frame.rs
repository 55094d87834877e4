use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::CaptureError;

/// Encoding of a captured frame payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            _ => None,
        }
    }
}

/// Pixel dimensions of a frame or viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One captured visual snapshot
///
/// Width and height always describe the encoded payload; constructors reject
/// zero-sized or empty frames.
#[derive(Debug, Clone)]
pub struct Frame {
    format: ImageFormat,
    data: Vec<u8>,
    size: FrameSize,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Build a frame from an encoded image, probing format and dimensions from its header
    pub fn decode(data: Vec<u8>) -> Result<Self, CaptureError> {
        if data.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }

        let reader = image::ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .map_err(|e| CaptureError::Decode(e.to_string()))?;

        let format = match reader.format() {
            Some(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Some(image::ImageFormat::Png) => ImageFormat::Png,
            Some(other) => {
                return Err(CaptureError::Decode(format!(
                    "unsupported image format {:?}",
                    other
                )))
            }
            None => return Err(CaptureError::Decode("unrecognised image data".to_string())),
        };

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| CaptureError::Decode(e.to_string()))?;

        Self::from_parts(format, data, FrameSize::new(width, height))
    }

    /// Build a frame from a `data:image/...;base64,` URL
    pub fn from_data_url(url: &str) -> Result<Self, CaptureError> {
        let (header, payload) = url
            .split_once(',')
            .ok_or_else(|| CaptureError::Decode("missing data URL payload".to_string()))?;

        let mime = header
            .strip_prefix("data:")
            .and_then(|h| h.strip_suffix(";base64"))
            .ok_or_else(|| CaptureError::Decode("not a base64 data URL".to_string()))?;

        if ImageFormat::from_mime(mime).is_none() {
            return Err(CaptureError::Decode(format!("unsupported MIME type {}", mime)));
        }

        let data = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;

        Self::decode(data)
    }

    /// Build a frame whose dimensions are already known to the producer
    pub fn from_parts(
        format: ImageFormat,
        data: Vec<u8>,
        size: FrameSize,
    ) -> Result<Self, CaptureError> {
        if data.is_empty() || size.width == 0 || size.height == 0 {
            return Err(CaptureError::EmptyFrame);
        }

        Ok(Self {
            format,
            data,
            size,
            captured_at: Utc::now(),
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Encode as the data URL the inference backend expects
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}
