//! Freehand strokes and text annotations.
//!
//! Strokes are rasterized straight into a [`StrokeOverlay`] at the image's
//! natural resolution; no vector history is kept. Text annotations stay
//! editable records in display space until the compositor flattens them.

use resvg::tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use serde::{Deserialize, Serialize};

use crate::error::EditorResult;
use crate::surface::{Color, Point, SizePx, blank_pixmap};

// ============================================================================
// Text annotations
// ============================================================================

/// Stable identifier of a text annotation within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextId(pub u64);

/// A text label in display coordinates. `(x, y)` is the start of the
/// baseline; `width`/`height` are the measured box reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    pub id: TextId,
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub color: Color,
    pub font_size: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl TextAnnotation {
    pub const MIN_FONT_SIZE: f32 = 8.0;
    pub const MAX_FONT_SIZE: f32 = 400.0;

    pub fn clamp_font_size(size: f32) -> f32 {
        if size.is_finite() {
            size.clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE)
        } else {
            Self::MIN_FONT_SIZE
        }
    }

    /// Box used for hit testing: the measured size when known, otherwise an
    /// estimate from the font size and character count.
    fn hit_box(&self) -> (f32, f32, f32, f32) {
        let chars = self.text.chars().count().max(1) as f32;
        let w = self.width.unwrap_or(self.font_size * 0.6 * chars);
        let h = self.height.unwrap_or(self.font_size);
        (self.x, self.y - h, self.x + w, self.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        let (l, t, r, b) = self.hit_box();
        p.x >= l && p.x <= r && p.y >= t && p.y <= b
    }
}

// ============================================================================
// Brush & stroke overlay
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Brush {
    pub color: Color,
    /// Line width in display pixels.
    pub width: f32,
    /// 0.0-1.0
    pub opacity: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Color::RED,
            width: 4.0,
            opacity: 1.0,
        }
    }
}

impl Brush {
    pub fn new(color: Color, width: f32, opacity: f32) -> Self {
        Self {
            color,
            width: if width.is_finite() { width.clamp(1.0, 200.0) } else { 1.0 },
            opacity: if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 },
        }
    }
}

/// Raster surface holding every stroke drawn so far, at natural resolution.
#[derive(Clone)]
pub struct StrokeOverlay {
    pixmap: Pixmap,
    dirty: bool,
}

impl std::fmt::Debug for StrokeOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeOverlay")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl StrokeOverlay {
    pub fn new(size: SizePx) -> EditorResult<Self> {
        Ok(Self {
            pixmap: blank_pixmap(size)?,
            dirty: false,
        })
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.pixmap.width(), self.pixmap.height())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// True until the first stroke touches the surface.
    pub fn is_blank(&self) -> bool {
        !self.dirty
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(resvg::tiny_skia::Color::TRANSPARENT);
        self.dirty = false;
    }

    /// Draws one segment with round caps. `width` is already in natural pixels.
    pub fn draw_segment(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;

        if from == to {
            // A click without movement leaves a dot.
            if let Some(dot) = PathBuilder::from_circle(from.x, from.y, width / 2.0) {
                self.pixmap.fill_path(
                    &dot,
                    &paint,
                    resvg::tiny_skia::FillRule::Winding,
                    Transform::identity(),
                    None,
                );
                self.dirty = true;
            }
            return;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        let Some(path) = pb.finish() else {
            return;
        };

        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        self.dirty = true;
    }
}

// ============================================================================
// Tools & drawing sub-flow
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    None,
    Pen,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawState {
    #[default]
    NotDrawing,
    /// Holds the last point of the current path, in natural pixels.
    Drawing { last: Point },
}

// ============================================================================
// AnnotationLayer
// ============================================================================

#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    strokes: StrokeOverlay,
    texts: Vec<TextAnnotation>,
    selected: Option<TextId>,
    next_id: u64,
    pub brush: Brush,
    pub tool: Tool,
    draw: DrawState,
}

impl AnnotationLayer {
    /// Creates an empty layer whose stroke surface matches `natural` size.
    pub fn new(natural: SizePx) -> EditorResult<Self> {
        Ok(Self {
            strokes: StrokeOverlay::new(natural)?,
            texts: Vec::new(),
            selected: None,
            next_id: 1,
            brush: Brush::default(),
            tool: Tool::None,
            draw: DrawState::NotDrawing,
        })
    }

    pub fn strokes(&self) -> &StrokeOverlay {
        &self.strokes
    }

    pub fn texts(&self) -> &[TextAnnotation] {
        &self.texts
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_blank() && self.texts.is_empty()
    }

    /// Clears strokes, texts and selection. Ids keep increasing.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.texts.clear();
        self.selected = None;
        self.draw = DrawState::NotDrawing;
    }

    /// Replaces the stroke surface with an empty one of a new size.
    pub(crate) fn resize(&mut self, natural: SizePx) -> EditorResult<()> {
        self.strokes = StrokeOverlay::new(natural)?;
        self.draw = DrawState::NotDrawing;
        Ok(())
    }

    // ---- Drawing sub-flow ----

    pub fn draw_state(&self) -> DrawState {
        self.draw
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.draw, DrawState::Drawing { .. })
    }

    /// Starts a path at `at` (natural pixels). `width` is the brush width in
    /// natural pixels.
    pub fn begin_stroke(&mut self, at: Point, width: f32) {
        let color = self.brush.color.with_opacity(self.brush.opacity);
        self.strokes.draw_segment(at, at, color, width);
        self.draw = DrawState::Drawing { last: at };
    }

    /// Appends a segment to the current path. Ignored when not drawing.
    pub fn extend_stroke(&mut self, to: Point, width: f32) -> bool {
        let DrawState::Drawing { last } = self.draw else {
            return false;
        };
        let color = self.brush.color.with_opacity(self.brush.opacity);
        self.strokes.draw_segment(last, to, color, width);
        self.draw = DrawState::Drawing { last: to };
        true
    }

    pub fn end_stroke(&mut self) {
        self.draw = DrawState::NotDrawing;
    }

    // ---- Text annotations ----

    /// Appends a text annotation on top of the others and selects it.
    pub fn add_text(
        &mut self,
        at: Point,
        text: impl Into<String>,
        color: Color,
        font_size: f32,
    ) -> TextId {
        let id = TextId(self.next_id);
        self.next_id += 1;
        self.texts.push(TextAnnotation {
            id,
            x: at.x,
            y: at.y,
            text: text.into(),
            color,
            font_size: TextAnnotation::clamp_font_size(font_size),
            width: None,
            height: None,
        });
        self.selected = Some(id);
        id
    }

    /// Inserts annotations restored from a profile, keeping their order.
    pub(crate) fn restore_texts(&mut self, texts: Vec<TextAnnotation>) {
        self.texts = texts
            .into_iter()
            .map(|mut t| {
                t.font_size = TextAnnotation::clamp_font_size(t.font_size);
                t
            })
            .collect();
        self.next_id = self.texts.iter().map(|t| t.id.0 + 1).max().unwrap_or(1);
        self.selected = None;
    }

    /// Follows a change of display size: positions and measured boxes scale
    /// per axis, font sizes with the vertical factor.
    pub(crate) fn rescale_texts(&mut self, fx: f32, fy: f32) {
        for t in &mut self.texts {
            t.x *= fx;
            t.y *= fy;
            t.font_size = TextAnnotation::clamp_font_size(t.font_size * fy);
            t.width = t.width.map(|w| w * fx);
            t.height = t.height.map(|h| h * fy);
        }
    }

    pub fn text(&self, id: TextId) -> Option<&TextAnnotation> {
        self.texts.iter().find(|t| t.id == id)
    }

    fn text_mut(&mut self, id: TextId) -> Option<&mut TextAnnotation> {
        self.texts.iter_mut().find(|t| t.id == id)
    }

    pub fn selected(&self) -> Option<TextId> {
        self.selected
    }

    /// Selects `id`; returns false (and leaves the selection alone) when the
    /// id is unknown.
    pub fn select(&mut self, id: TextId) -> bool {
        if self.text(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Topmost annotation under `p` (display space).
    pub fn hit_test(&self, p: Point) -> Option<TextId> {
        self.texts.iter().rev().find(|t| t.contains(p)).map(|t| t.id)
    }

    pub fn move_text(&mut self, id: TextId, dx: f32, dy: f32) -> bool {
        let Some(t) = self.text_mut(id) else {
            return false;
        };
        t.x += dx;
        t.y += dy;
        true
    }

    /// Resizes by scaling the font; measured bounds scale along.
    pub fn scale_text(&mut self, id: TextId, factor: f32) -> Option<f32> {
        let t = self.text_mut(id)?;
        let new_size = TextAnnotation::clamp_font_size(t.font_size * factor);
        let applied = new_size / t.font_size;
        t.font_size = new_size;
        t.width = t.width.map(|w| w * applied);
        t.height = t.height.map(|h| h * applied);
        Some(new_size)
    }

    pub fn set_text_content(&mut self, id: TextId, text: impl Into<String>) -> bool {
        let Some(t) = self.text_mut(id) else {
            return false;
        };
        t.text = text.into();
        t.width = None;
        t.height = None;
        true
    }

    pub fn set_text_color(&mut self, id: TextId, color: Color) -> bool {
        let Some(t) = self.text_mut(id) else {
            return false;
        };
        t.color = color;
        true
    }

    /// Records the box the host measured for the rendered label.
    pub fn set_text_bounds(&mut self, id: TextId, width: f32, height: f32) -> bool {
        let Some(t) = self.text_mut(id) else {
            return false;
        };
        t.width = Some(width.max(0.0));
        t.height = Some(height.max(0.0));
        true
    }

    pub fn remove_text(&mut self, id: TextId) -> Option<TextAnnotation> {
        let index = self.texts.iter().position(|t| t.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.texts.remove(index))
    }
}
