//! The flatten pipeline.
//!
//! # Stage order
//!
//! ```text
//! working image (decoded)
//!     │
//!     ▼
//! ┌──────────┐
//! │  Filter  │ ◄── adjustment effect stack (skipped for crop commits)
//! └────┬─────┘
//!      ▼
//! ┌──────────┐
//! │  Orient  │ ──► Placement
//! └────┬─────┘
//!      ▼
//! ┌──────────┐
//! │   Crop   │ ──► Placement (shifted)
//! └────┬─────┘
//!      ▼
//! ┌──────────┐
//! │ Strokes  │ ◄── Placement
//! └────┬─────┘
//!      ▼
//! ┌──────────┐
//! │   Text   │ ◄── Placement
//! └──────────┘
//! ```
//!
//! Filters run before the geometric stages so that blur and vignette see the
//! same neighborhood the preview does, and so that annotations drawn on top
//! are never filtered.

use std::sync::{Arc, OnceLock};

use image::RgbaImage;
use resvg::usvg::fontdb;
use tracing::{debug, info};

use crate::adjust::AdjustmentSet;
use crate::annotation::{StrokeOverlay, TextAnnotation};
use crate::codec::{self, Encoded};
use crate::config::EditorConfig;
use crate::error::EditorResult;
use crate::geometry::{CropRect, Orientation};
use crate::stage::{self, CropStage, FilterStage, OrientStage, StrokeStage, TextStage};
use crate::surface::{DisplayScale, SizePx};

/// Everything one flatten needs, borrowed from the session.
#[derive(Debug, Clone, Copy)]
pub struct FlattenRequest<'a> {
    /// Encoded working image.
    pub image: &'a Arc<[u8]>,
    /// `None` leaves pixel values untouched (crop commit).
    pub adjustments: Option<&'a AdjustmentSet>,
    pub orientation: Orientation,
    pub crop: Option<CropRect>,
    pub strokes: Option<&'a StrokeOverlay>,
    pub texts: &'a [TextAnnotation],
    pub display_scale: DisplayScale,
}

impl<'a> FlattenRequest<'a> {
    /// A request that decodes `image` and applies nothing.
    pub fn new(image: &'a Arc<[u8]>) -> Self {
        Self {
            image,
            adjustments: None,
            orientation: Orientation::default(),
            crop: None,
            strokes: None,
            texts: &[],
            display_scale: DisplayScale::IDENTITY,
        }
    }
}

/// Flattened and encoded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// Runs the flatten pipeline under one [`EditorConfig`].
#[derive(Debug, Clone)]
pub struct Compositor {
    config: EditorConfig,
}

impl Compositor {
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Decodes the working image and runs every stage over it.
    #[tracing::instrument(skip(self, request), fields(crop = request.crop.is_some(), texts = request.texts.len()))]
    pub fn flatten(&self, request: &FlattenRequest<'_>) -> EditorResult<RgbaImage> {
        let base = codec::decode_with_timeout(Arc::clone(request.image), self.config.decode_timeout())?;
        let natural = SizePx::of(&base);
        debug!(width = natural.width, height = natural.height, "decoded working image");

        let filter = request
            .adjustments
            .map(|a| FilterStage::for_export(a, self.config.export_filters));
        let orient = OrientStage::new(request.orientation);
        let crop = CropStage::new(request.crop);
        let strokes = StrokeStage::new(request.strokes);
        let text = TextStage::new(
            request.texts,
            request.display_scale,
            &self.config.font_family,
            font_database(),
        );

        let mut stages: Vec<&dyn stage::Stage> = Vec::with_capacity(5);
        if let Some(filter) = &filter {
            stages.push(filter);
        }
        stages.extend([&orient as &dyn stage::Stage, &crop, &strokes, &text]);

        let ctx = stage::run(base, &stages)?;
        Ok(ctx.image)
    }

    /// Flattens and encodes in `mime_type`, naming the file after it.
    pub fn export(&self, request: &FlattenRequest<'_>, mime_type: &str) -> EditorResult<ExportedImage> {
        let image = self.flatten(request)?;
        let Encoded { bytes, mime_type } = codec::encode(&image, mime_type, self.config.jpeg_quality())?;
        let file_name = codec::export_file_name(&self.config.file_stem, &mime_type);

        info!(
            width = image.width(),
            height = image.height(),
            bytes = bytes.len(),
            %mime_type,
            "exported image"
        );

        Ok(ExportedImage {
            bytes,
            mime_type,
            file_name,
            width: image.width(),
            height: image.height(),
        })
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

/// System fonts, loaded once per process on first use.
fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    Arc::clone(FONTS.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system fonts");
        Arc::new(db)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::Adjustment;
    use crate::config::ExportFilters;
    use crate::error::EditorError;
    use image::Rgba;

    fn png(image: &RgbaImage) -> Arc<[u8]> {
        codec::encode(image, "image/png", 100).unwrap().bytes.into()
    }

    #[test]
    fn empty_request_round_trips_pixels() {
        let img = RgbaImage::from_fn(5, 4, |x, y| Rgba([x as u8 * 50, y as u8 * 60, 9, 255]));
        let bytes = png(&img);
        let out = Compositor::default().flatten(&FlattenRequest::new(&bytes)).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn adjustments_are_skipped_without_a_set() {
        let bytes = png(&RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 255])));
        let adjustments = AdjustmentSet::new().with(Adjustment::Brightness, 120.0);

        let mut request = FlattenRequest::new(&bytes);
        let plain = Compositor::default().flatten(&request).unwrap();
        assert_eq!(plain.get_pixel(0, 0).0, [200, 0, 0, 255]);

        request.adjustments = Some(&adjustments);
        let bright = Compositor::default().flatten(&request).unwrap();
        assert_eq!(bright.get_pixel(0, 0).0, [240, 0, 0, 255]);
    }

    #[test]
    fn tone_only_ignores_sepia() {
        let bytes = png(&RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])));
        let adjustments = AdjustmentSet::new().with(Adjustment::Sepia, 100.0);
        let mut request = FlattenRequest::new(&bytes);
        request.adjustments = Some(&adjustments);

        let full = Compositor::default().flatten(&request).unwrap();
        assert_eq!(full.get_pixel(0, 0).0, [255, 255, 239, 255]);

        let tone = Compositor::new(EditorConfig::new().with_export_filters(ExportFilters::ToneOnly));
        assert_eq!(tone.flatten(&request).unwrap().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn rotate_then_crop_uses_rotated_frame() {
        let bytes = png(&RgbaImage::new(200, 100));
        let mut request = FlattenRequest::new(&bytes);
        request.orientation = Orientation::new(90, false, false);
        request.crop = Some(CropRect::new(0.0, 0.0, 100.0, 50.0));

        let out = Compositor::default().flatten(&request).unwrap();
        assert_eq!((out.width(), out.height()), (100, 100));
    }

    #[test]
    fn empty_crop_fails() {
        let bytes = png(&RgbaImage::new(10, 10));
        let mut request = FlattenRequest::new(&bytes);
        request.crop = Some(CropRect::new(50.0, 50.0, 0.0, 0.0));
        assert!(matches!(
            Compositor::default().flatten(&request),
            Err(EditorError::EmptyCrop { .. })
        ));
    }

    #[test]
    fn export_names_file_after_mime() {
        let bytes = png(&RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255])));
        let out = Compositor::default()
            .export(&FlattenRequest::new(&bytes), "image/png")
            .unwrap();
        assert_eq!(out.mime_type, "image/png");
        assert_eq!(out.file_name, "edited-image.png");
        assert_eq!((out.width, out.height), (3, 3));
        assert_eq!(&out.bytes[1..4], b"PNG");
    }
}
