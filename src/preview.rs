//! Declarative preview descriptors.
//!
//! The host applies [`PreviewStyle::filter`] and [`PreviewStyle::transform`]
//! to the displayed image and its annotation overlay. Nothing here touches
//! pixel data.

use serde::{Deserialize, Serialize};

use crate::adjust::{AdjustmentSet, fmt_num};
use crate::geometry::Geometry;

/// Style strings for the live preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStyle {
    /// CSS `filter` value.
    pub filter: String,
    /// CSS `transform` value: rotation then flips as one `matrix()`.
    pub transform: String,
    /// CSS background for a vignette overlay, when the vignette is non-zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignette: Option<String>,
}

/// Builds the preview descriptor. Recomputed on every change; there is no
/// cache since this is plain string assembly.
pub fn preview(adjustments: &AdjustmentSet, geometry: &Geometry) -> PreviewStyle {
    let filter = adjustments
        .effects()
        .iter()
        .map(|effect| effect.css())
        .collect::<Vec<_>>()
        .join(" ");

    let (a, b, c, d) = geometry.orientation().linear();
    let transform = format!(
        "matrix({}, {}, {}, {}, 0, 0)",
        fmt_coeff(a),
        fmt_coeff(b),
        fmt_coeff(c),
        fmt_coeff(d)
    );

    let vignette = (adjustments.vignette > 0.0).then(|| {
        format!(
            "radial-gradient(ellipse at center, rgba(0, 0, 0, 0) 55%, rgba(0, 0, 0, {}) 100%)",
            fmt_num(adjustments.vignette / 100.0 * 0.8)
        )
    });

    PreviewStyle {
        filter,
        transform,
        vignette,
    }
}

fn fmt_coeff(v: f32) -> String {
    let rounded = (v * 1_000_000.0).round() / 1_000_000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}
