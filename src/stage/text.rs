//! Text annotation rasterization.
//!
//! Labels are assembled into one SVG document the size of the current raster
//! and rendered with resvg. Each label keeps its display-space position; the
//! display scale and the current [`Placement`](super::Placement) carry it onto
//! the output surface.

use std::fmt::Write as _;
use std::sync::Arc;

use resvg::tiny_skia::Transform;
use resvg::usvg::{Options, Tree, fontdb};

use super::{RenderContext, Stage};
use crate::adjust::fmt_num;
use crate::annotation::TextAnnotation;
use crate::error::{EditorError, EditorResult};
use crate::surface::{Color, DisplayScale, SizePx, image_to_pixmap, pixmap_to_image};

pub struct TextStage<'a> {
    texts: &'a [TextAnnotation],
    scale: DisplayScale,
    font_family: &'a str,
    fonts: Arc<fontdb::Database>,
}

impl<'a> TextStage<'a> {
    pub fn new(
        texts: &'a [TextAnnotation],
        scale: DisplayScale,
        font_family: &'a str,
        fonts: Arc<fontdb::Database>,
    ) -> Self {
        Self {
            texts,
            scale,
            font_family,
            fonts,
        }
    }
}

impl Stage for TextStage<'_> {
    fn name(&self) -> &'static str {
        "text"
    }

    fn is_active(&self) -> bool {
        self.texts.iter().any(|t| !t.text.trim().is_empty())
    }

    fn transform(&self, ctx: &mut RenderContext) -> EditorResult<()> {
        let svg = build_text_svg(
            self.texts,
            self.scale,
            ctx.placement(),
            ctx.size(),
            self.font_family,
        );

        let mut opts = Options::default();
        opts.font_family = self.font_family.to_string();
        opts.fontdb = Arc::clone(&self.fonts);
        let tree = Tree::from_str(&svg, &opts)
            .map_err(|e| EditorError::surface(format!("text layer: {e}")))?;

        let mut pixmap = image_to_pixmap(&ctx.image)?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
        ctx.image = pixmap_to_image(&pixmap)?;
        Ok(())
    }
}

/// Builds the SVG for all labels in creation order (later labels on top).
///
/// A label at display `(x, y)` is anchored at natural `(x * sx, y * sy)` with
/// a font size of `font_size * sy`, then mapped through `placement`.
pub fn build_text_svg(
    texts: &[TextAnnotation],
    scale: DisplayScale,
    placement: Transform,
    size: SizePx,
    font_family: &str,
) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size.width,
        h = size.height
    );
    let t = placement;
    let _ = write!(
        svg,
        r#"<g transform="matrix({} {} {} {} {} {})">"#,
        t.sx, t.ky, t.kx, t.sy, t.tx, t.ty
    );

    for text in texts.iter().filter(|t| !t.text.trim().is_empty()) {
        let opacity = text.color.a as f32 / 255.0;
        let _ = write!(
            svg,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}""#,
            fmt_num(text.x * scale.x),
            fmt_num(text.y * scale.y),
            escape_xml(font_family),
            fmt_num(text.font_size * scale.y),
            Color::rgb(text.color.r, text.color.g, text.color.b).to_hex(),
        );
        if text.color.a < 255 {
            let _ = write!(svg, r#" fill-opacity="{}""#, fmt_num(opacity));
        }
        let _ = write!(svg, r#" xml:space="preserve">{}</text>"#, escape_xml(&text.text));
    }

    svg.push_str("</g></svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
