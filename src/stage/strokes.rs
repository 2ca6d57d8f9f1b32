//! Freehand stroke compositing.

use resvg::tiny_skia::{FilterQuality, PixmapPaint, Transform};

use super::{RenderContext, Stage};
use crate::annotation::StrokeOverlay;
use crate::error::EditorResult;
use crate::surface::{image_to_pixmap, pixmap_to_image};

/// Draws the natural-resolution stroke overlay over the raster through the
/// current [`Placement`](super::Placement), so strokes follow rotation, flips
/// and crop exactly like the pixels under them.
#[derive(Debug, Clone, Copy)]
pub struct StrokeStage<'a> {
    overlay: Option<&'a StrokeOverlay>,
}

impl<'a> StrokeStage<'a> {
    pub fn new(overlay: Option<&'a StrokeOverlay>) -> Self {
        Self { overlay }
    }
}

impl Stage for StrokeStage<'_> {
    fn name(&self) -> &'static str {
        "strokes"
    }

    fn is_active(&self) -> bool {
        self.overlay.is_some_and(|o| !o.is_blank())
    }

    fn transform(&self, ctx: &mut RenderContext) -> EditorResult<()> {
        let Some(overlay) = self.overlay else {
            return Ok(());
        };

        let placement = ctx.placement();
        let paint = PixmapPaint {
            quality: if is_axis_aligned(&placement) {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            },
            ..PixmapPaint::default()
        };

        let mut surface = image_to_pixmap(&ctx.image)?;
        surface.draw_pixmap(0, 0, overlay.pixmap().as_ref(), &paint, placement, None);
        ctx.image = pixmap_to_image(&surface)?;
        Ok(())
    }
}

/// Quarter turns, flips and integer shifts map pixels onto pixels.
fn is_axis_aligned(t: &Transform) -> bool {
    let integral = |v: f32| v.fract() == 0.0;
    let unit_diagonal = t.kx == 0.0 && t.ky == 0.0 && t.sx.abs() == 1.0 && t.sy.abs() == 1.0;
    let unit_swap = t.sx == 0.0 && t.sy == 0.0 && t.kx.abs() == 1.0 && t.ky.abs() == 1.0;
    (unit_diagonal || unit_swap) && integral(t.tx) && integral(t.ty)
}
