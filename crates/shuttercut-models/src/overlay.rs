//! Overlay specifications.
//!
//! An overlay is a timed visual element (text, image, or video clip)
//! composited onto the base video within a start/end window. Overlays are
//! applied in array order, which defines their z-order.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when an overlay specification is rejected.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("invalid overlay: {0}")]
    InvalidOverlay(String),
}

/// Kind of overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    /// Text drawn directly onto the frame
    #[default]
    Text,
    /// Still image composited from an uploaded asset
    Image,
    /// Video clip composited from an uploaded asset
    Video,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Text => "text",
            OverlayKind::Image => "image",
            OverlayKind::Video => "video",
        }
    }
}

/// A single overlay specification as submitted by the client.
///
/// For `Image` and `Video` overlays, `content` must equal the base filename
/// of one of the uploaded asset files. For `Text` overlays it is the text
/// to draw.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    /// Overlay kind (defaults to text)
    #[serde(default, alias = "type")]
    pub kind: OverlayKind,

    /// Text content, or asset base filename for image/video overlays
    #[serde(default = "default_content")]
    pub content: String,

    /// Horizontal position in pixels
    #[serde(default)]
    pub x: i32,

    /// Vertical position in pixels
    #[serde(default)]
    pub y: i32,

    /// Time the overlay becomes visible, in seconds
    #[serde(default)]
    pub start: f64,

    /// Time the overlay disappears, in seconds
    #[serde(default = "default_end")]
    pub end: f64,

    /// Optional target width in pixels (image/video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Optional target height in pixels (image/video only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Font size for text overlays
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Font color for text overlays (name or hex, leading '#' allowed)
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_content() -> String {
    "Text".to_string()
}

fn default_end() -> f64 {
    5.0
}

fn default_font_size() -> u32 {
    24
}

fn default_color() -> String {
    "white".to_string()
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            kind: OverlayKind::Text,
            content: default_content(),
            x: 0,
            y: 0,
            start: 0.0,
            end: default_end(),
            width: None,
            height: None,
            font_size: default_font_size(),
            color: default_color(),
        }
    }
}

impl Overlay {
    /// Create a text overlay.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: OverlayKind::Text,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create an image overlay referencing an asset by base filename.
    pub fn image(asset_name: impl Into<String>) -> Self {
        Self {
            kind: OverlayKind::Image,
            content: asset_name.into(),
            ..Default::default()
        }
    }

    /// Create a video overlay referencing an asset by base filename.
    pub fn video(asset_name: impl Into<String>) -> Self {
        Self {
            kind: OverlayKind::Video,
            content: asset_name.into(),
            ..Default::default()
        }
    }

    /// Set position.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the visibility window.
    pub fn between(mut self, start: f64, end: f64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Set target dimensions (image/video overlays).
    pub fn scaled(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Whether both target dimensions are present.
    pub fn has_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// Validate the overlay fields.
    ///
    /// Rejects non-finite or negative time values and inverted windows.
    /// These must be caught before any external tool is invoked.
    pub fn validate(&self) -> Result<(), OverlayError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(OverlayError::InvalidOverlay(format!(
                "non-finite time window {}..{}",
                self.start, self.end
            )));
        }
        if self.start < 0.0 {
            return Err(OverlayError::InvalidOverlay(format!(
                "negative start time {}",
                self.start
            )));
        }
        if self.end < self.start {
            return Err(OverlayError::InvalidOverlay(format!(
                "end {} precedes start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_sparse_json() {
        let overlay: Overlay = serde_json::from_str(r#"{"content": "Hello"}"#).unwrap();
        assert_eq!(overlay.kind, OverlayKind::Text);
        assert_eq!(overlay.x, 0);
        assert_eq!(overlay.y, 0);
        assert!((overlay.start - 0.0).abs() < f64::EPSILON);
        assert!((overlay.end - 5.0).abs() < f64::EPSILON);
        assert_eq!(overlay.font_size, 24);
        assert_eq!(overlay.color, "white");
    }

    #[test]
    fn test_type_alias_and_camel_case() {
        let overlay: Overlay = serde_json::from_str(
            r#"{"type": "image", "content": "logo.png", "fontSize": 32}"#,
        )
        .unwrap();
        assert_eq!(overlay.kind, OverlayKind::Image);
        assert_eq!(overlay.content, "logo.png");
        assert_eq!(overlay.font_size, 32);
    }

    #[test]
    fn test_validate_accepts_zero_length_window() {
        let overlay = Overlay::text("hi").between(3.0, 3.0);
        assert!(overlay.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let overlay = Overlay::text("hi").between(5.0, 1.0);
        assert!(overlay.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_start() {
        let overlay = Overlay::text("hi").between(-1.0, 2.0);
        assert!(overlay.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let overlay = Overlay::text("hi").between(f64::NAN, 2.0);
        assert!(overlay.validate().is_err());
    }
}
