//! Rotation and flips.

use image::{RgbaImage, imageops};
use resvg::tiny_skia::{FilterQuality, PixmapPaint};

use super::{Placement, RenderContext, Stage};
use crate::error::EditorResult;
use crate::geometry::Orientation;
use crate::surface::{SizePx, blank_pixmap, image_to_pixmap, pixmap_to_image};

/// Redraws the raster onto the rotated bounding box.
///
/// # Emitted Properties
///
/// - [`Placement`]: composed with the orientation transform.
#[derive(Debug, Clone, Copy)]
pub struct OrientStage {
    orientation: Orientation,
}

impl OrientStage {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }
}

impl Stage for OrientStage {
    fn name(&self) -> &'static str {
        "orient"
    }

    fn is_active(&self) -> bool {
        !self.orientation.is_identity()
    }

    fn transform(&self, ctx: &mut RenderContext) -> EditorResult<()> {
        ctx.image = orient(&ctx.image, self.orientation)?;
        Ok(())
    }

    fn emit(&self, ctx: &mut RenderContext) {
        let step = self.orientation.transform(ctx.input_size());
        let placement = Placement(ctx.placement()).then(step);
        ctx.set(placement);
    }
}

/// Returns `image` rotated and flipped. Quarter turns are exact pixel moves;
/// any other angle is resampled bilinearly onto a transparent surface.
pub fn orient(image: &RgbaImage, orientation: Orientation) -> EditorResult<RgbaImage> {
    match orientation.quarter_turns() {
        Some(turns) => {
            let mut out = image.clone();
            if orientation.flip_horizontal {
                out = imageops::flip_horizontal(&out);
            }
            if orientation.flip_vertical {
                out = imageops::flip_vertical(&out);
            }
            Ok(match turns {
                1 => imageops::rotate90(&out),
                2 => imageops::rotate180(&out),
                3 => imageops::rotate270(&out),
                _ => out,
            })
        }
        None => {
            let source = SizePx::of(image);
            let src = image_to_pixmap(image)?;
            let mut dst = blank_pixmap(orientation.output_size(source))?;
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            dst.draw_pixmap(0, 0, src.as_ref(), &paint, orientation.transform(source), None);
            pixmap_to_image(&dst)
        }
    }
}
