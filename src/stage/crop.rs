//! Crop to the committed rectangle.

use image::imageops;
use resvg::tiny_skia::Transform;

use super::{Placement, RenderContext, Stage};
use crate::error::{EditorError, EditorResult};
use crate::geometry::CropRect;
use crate::surface::RectPx;

/// Cuts the raster down to a percentage rectangle of its current (oriented)
/// size.
///
/// # Emitted Properties
///
/// - [`Placement`]: shifted by the crop origin.
#[derive(Debug, Clone, Copy)]
pub struct CropStage {
    rect: Option<CropRect>,
}

impl CropStage {
    pub fn new(rect: Option<CropRect>) -> Self {
        Self { rect }
    }

    fn bounds(&self, ctx: &RenderContext) -> Option<RectPx> {
        self.rect.map(|r| r.to_pixels(ctx.input_size()))
    }
}

impl Stage for CropStage {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn is_active(&self) -> bool {
        self.rect.is_some()
    }

    fn transform(&self, ctx: &mut RenderContext) -> EditorResult<()> {
        let Some(px) = self.bounds(ctx) else {
            return Ok(());
        };
        if px.is_empty() {
            return Err(EditorError::EmptyCrop {
                width: px.width,
                height: px.height,
            });
        }
        ctx.image = imageops::crop_imm(&ctx.image, px.x, px.y, px.width, px.height).to_image();
        Ok(())
    }

    fn emit(&self, ctx: &mut RenderContext) {
        if let Some(px) = self.bounds(ctx) {
            let shift = Transform::from_translate(-(px.x as f32), -(px.y as f32));
            let placement = Placement(ctx.placement()).then(shift);
            ctx.set(placement);
        }
    }
}
