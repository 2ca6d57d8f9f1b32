//! Engine options.
//!
//! ```json
//! {
//!   "exportFilters": "tone-only",
//!   "jpegQuality": 92,
//!   "decodeTimeoutMs": 5000
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which part of the adjustment set the export pipeline bakes into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFilters {
    /// The whole effect stack, identical to what the preview describes.
    #[default]
    Full,
    /// Only brightness, contrast and saturation. Stylistic fields affect the
    /// preview but are left out of the exported raster.
    ToneOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub export_filters: ExportFilters,

    /// JPEG quality used when the session MIME type is `image/jpeg` (1-100).
    pub jpeg_quality: u8,

    /// Upper bound on a single decode. `None` waits indefinitely.
    pub decode_timeout_ms: Option<u64>,

    /// Stem of the exported file name (`<stem>.<ext>`).
    pub file_stem: String,

    /// Font family used to rasterize text annotations.
    pub font_family: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            export_filters: ExportFilters::Full,
            jpeg_quality: 100,
            decode_timeout_ms: None,
            file_stem: "edited-image".to_string(),
            font_family: "sans-serif".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export_filters(mut self, filters: ExportFilters) -> Self {
        self.export_filters = filters;
        self
    }

    pub fn with_decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn decode_timeout(&self) -> Option<Duration> {
        self.decode_timeout_ms.map(Duration::from_millis)
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.export_filters, ExportFilters::Full);
        assert_eq!(config.jpeg_quality(), 100);
        assert_eq!(config.file_stem, "edited-image");
        assert!(config.decode_timeout().is_none());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config =
            EditorConfig::from_json(r#"{"exportFilters":"tone-only","decodeTimeoutMs":250}"#)
                .unwrap();
        assert_eq!(config.export_filters, ExportFilters::ToneOnly);
        assert_eq!(config.decode_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.font_family, "sans-serif");
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        let config = EditorConfig {
            jpeg_quality: 0,
            ..EditorConfig::default()
        };
        assert_eq!(config.jpeg_quality(), 1);
    }
}
