//! Serializable snapshot of an editing session's models.
//!
//! An [`EditProfile`] captures the adjustment set, geometry and text
//! annotations in a JSON format a host can store or hand to another process
//! (the CLI reads one with `--profile`). Raster strokes are not part of it.
//!
//! # Example
//!
//! ```
//! use photo_flatten::{Adjustment, AdjustmentSet, EditProfile, FilterPreset};
//!
//! let profile = EditProfile::new().with_adjustments(
//!     AdjustmentSet::new()
//!         .with(Adjustment::Brightness, 120.0)
//!         .with_preset(FilterPreset::Warm),
//! );
//!
//! let json = profile.to_json().unwrap();
//! let restored = EditProfile::from_json(&json).unwrap();
//! assert_eq!(restored.adjustments.brightness, 120.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::adjust::AdjustmentSet;
use crate::annotation::TextAnnotation;
use crate::geometry::Geometry;
use crate::surface::DisplaySize;

/// All session settings in a JSON-friendly form.
///
/// # JSON Format
///
/// ```json
/// {
///   "adjustments": { "brightness": 120.0, "preset": "warm" },
///   "geometry": { "rotation": 90, "flipHorizontal": true },
///   "texts": [
///     { "id": 1, "x": 40.0, "y": 60.0, "text": "Hello", "color": "#ffffff", "fontSize": 24.0 }
///   ],
///   "displaySize": { "width": 800.0, "height": 600.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EditProfile {
    pub adjustments: AdjustmentSet,

    pub geometry: Geometry,

    /// Text annotations in display coordinates, bottom to top.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub texts: Vec<TextAnnotation>,

    /// Display size the text coordinates refer to. `None` keeps the
    /// session's current display size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_size: Option<DisplaySize>,
}

impl EditProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adjustments(mut self, adjustments: AdjustmentSet) -> Self {
        self.adjustments = adjustments;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_texts(mut self, texts: Vec<TextAnnotation>) -> Self {
        self.texts = texts;
        self
    }

    pub fn with_display_size(mut self, display_size: DisplaySize) -> Self {
        self.display_size = Some(display_size);
        self
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a profile from a JSON string. Values are not clamped
    /// here; applying the profile to a session does that.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Configurable Trait
// ============================================================================

/// Types that can be configured from an [`EditProfile`].
pub trait Configurable {
    /// Applies a profile's settings to this instance.
    fn apply_profile(&mut self, profile: &EditProfile);

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> EditProfile;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::{Adjustment, FilterPreset};
    use crate::annotation::TextId;
    use crate::surface::Color;

    #[test]
    fn profile_serialization_roundtrip() {
        let mut geometry = Geometry::new();
        geometry.rotate_by(90);
        geometry.toggle_flip_vertical();

        let profile = EditProfile::new()
            .with_adjustments(AdjustmentSet::new().with(Adjustment::Sepia, 40.0))
            .with_geometry(geometry)
            .with_texts(vec![TextAnnotation {
                id: TextId(3),
                x: 1.0,
                y: 2.0,
                text: "hi".into(),
                color: Color::WHITE,
                font_size: 24.0,
                width: None,
                height: None,
            }]);

        let json = profile.to_json().unwrap();
        let restored = EditProfile::from_json(&json).unwrap();
        assert_eq!(restored, profile);
    }

    #[test]
    fn profile_json_format() {
        let profile = EditProfile::new()
            .with_adjustments(AdjustmentSet::new().with_preset(FilterPreset::Noir))
            .with_display_size(DisplaySize::new(800.0, 600.0));
        let json = profile.to_json_pretty().unwrap();

        assert!(json.contains("\"adjustments\""));
        assert!(json.contains("\"hueRotate\""));
        assert!(json.contains("\"noir\""));
        assert!(json.contains("\"displaySize\""));
        assert!(!json.contains("\"texts\""));
    }

    #[test]
    fn empty_profile_deserializes() {
        let profile = EditProfile::from_json("{}").unwrap();
        assert_eq!(profile, EditProfile::default());
        assert!(profile.adjustments.is_neutral());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let profile =
            EditProfile::from_json(r#"{"adjustments": {"contrast": 150}, "geometry": {"rotation": 45}}"#)
                .unwrap();
        assert_eq!(profile.adjustments.contrast, 150.0);
        assert_eq!(profile.adjustments.brightness, 100.0);
        assert_eq!(profile.geometry.rotation(), 45);
    }
}
