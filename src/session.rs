//! Editing sessions and the host-facing editor.
//!
//! An [`EditSession`] owns one image and the three edit models. Every
//! mutation takes `&mut self`, so an export can never overlap another edit or
//! another export. [`Editor`] wraps the optional session a host starts with.

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::adjust::{Adjustment, AdjustmentSet, FilterPreset};
use crate::annotation::{AnnotationLayer, Brush, TextAnnotation, TextId, Tool};
use crate::codec;
use crate::compositor::{Compositor, ExportedImage, FlattenRequest};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::geometry::{CropMode, CropRect, Geometry, RotationStep};
use crate::preview::{PreviewStyle, preview};
use crate::profile::{Configurable, EditProfile};
use crate::surface::{Color, DisplayScale, DisplaySize, Point, SizePx};

/// Content of a label placed by clicking with the text tool.
pub const DEFAULT_TEXT: &str = "Text";

/// Font size (display pixels) of a label placed with the text tool.
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

// ============================================================================
// ImageHandoff
// ============================================================================

/// The image a host passes in: raw bytes plus their declared MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandoff {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageHandoff {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl fmt::Debug for ImageHandoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandoff")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    StrokeStarted,
    StrokeExtended,
    StrokeEnded,
    TextPlaced(TextId),
    TextSelected(TextId),
}

// ============================================================================
// EditSession
// ============================================================================

pub struct EditSession {
    /// The handed-over bytes; never modified.
    source: Arc<[u8]>,
    source_size: SizePx,
    mime_type: String,

    /// Current image after committed crops. Shares `source` until the first
    /// commit.
    working: Arc<[u8]>,
    natural: SizePx,
    display: DisplaySize,

    adjustments: AdjustmentSet,
    geometry: Geometry,
    annotations: AnnotationLayer,

    compositor: Compositor,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("mime_type", &self.mime_type)
            .field("natural", &self.natural)
            .field("display", &self.display)
            .field("adjustments", &self.adjustments)
            .field("geometry", &self.geometry)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Decodes the handoff once to learn its natural size and starts a
    /// session with default models. The display size starts equal to the
    /// natural size.
    pub fn open(handoff: ImageHandoff, config: EditorConfig) -> EditorResult<Self> {
        if !codec::is_image_mime(&handoff.mime_type) {
            return Err(EditorError::invalid_state(format!(
                "not an image MIME type: {}",
                handoff.mime_type
            )));
        }

        let source: Arc<[u8]> = handoff.bytes.into();
        let decoded = codec::decode_with_timeout(Arc::clone(&source), config.decode_timeout())?;
        let natural = SizePx::of(&decoded);
        info!(
            width = natural.width,
            height = natural.height,
            mime_type = %handoff.mime_type,
            "image loaded"
        );

        Ok(Self {
            working: Arc::clone(&source),
            source,
            source_size: natural,
            mime_type: handoff.mime_type,
            natural,
            display: natural.into(),
            adjustments: AdjustmentSet::default(),
            geometry: Geometry::default(),
            annotations: AnnotationLayer::new(natural)?,
            compositor: Compositor::new(config),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Natural size of the working image.
    pub fn natural_size(&self) -> SizePx {
        self.natural
    }

    /// Natural size of the handed-over image.
    pub fn source_size(&self) -> SizePx {
        self.source_size
    }

    pub fn display_size(&self) -> DisplaySize {
        self.display
    }

    pub fn config(&self) -> &EditorConfig {
        self.compositor.config()
    }

    pub fn adjustments(&self) -> &AdjustmentSet {
        &self.adjustments
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    /// Records the on-screen size of the (unrotated) image element. Text
    /// annotations are rescaled so they stay on the same image content.
    pub fn set_display_size(&mut self, size: DisplaySize) -> EditorResult<()> {
        if !size.is_valid() {
            return Err(EditorError::invalid_state(format!(
                "display size must be positive, got {}x{}",
                size.width, size.height
            )));
        }
        if self.display.is_valid() {
            self.annotations.rescale_texts(
                size.width / self.display.width,
                size.height / self.display.height,
            );
        }
        self.display = size;
        Ok(())
    }

    /// Display-to-natural factors for the current working image.
    pub fn display_scale(&self) -> DisplayScale {
        DisplayScale::between(self.natural, self.display)
    }

    pub fn preview(&self) -> PreviewStyle {
        preview(&self.adjustments, &self.geometry)
    }

    // ---- Adjustments ----

    /// Sets one slider; returns the clamped value that was stored.
    pub fn set_adjustment(&mut self, key: Adjustment, value: f32) -> f32 {
        self.adjustments.set(key, value)
    }

    pub fn set_preset(&mut self, preset: FilterPreset) {
        self.adjustments.preset = preset;
    }

    pub fn set_adjustments(&mut self, adjustments: AdjustmentSet) {
        self.adjustments = adjustments.clamped();
    }

    // ---- Orientation ----

    pub fn rotate(&mut self, step: RotationStep) -> i32 {
        self.geometry.rotate(step)
    }

    pub fn set_rotation(&mut self, degrees: i32) -> i32 {
        self.geometry.set_rotation(degrees)
    }

    pub fn toggle_flip_horizontal(&mut self) -> bool {
        self.geometry.toggle_flip_horizontal()
    }

    pub fn toggle_flip_vertical(&mut self) -> bool {
        self.geometry.toggle_flip_vertical()
    }

    // ---- Crop sub-flow ----

    pub fn begin_crop(&mut self) {
        if self.annotations.is_drawing() {
            self.annotations.end_stroke();
        }
        self.geometry.begin_crop();
    }

    pub fn set_crop_rect(&mut self, rect: CropRect) -> EditorResult<CropRect> {
        self.geometry.set_crop_rect(rect)
    }

    pub fn set_crop_zoom(&mut self, zoom: f32) -> EditorResult<f32> {
        self.geometry.set_crop_zoom(zoom)
    }

    /// Leaves crop mode without touching the working image.
    pub fn cancel_crop(&mut self) {
        self.geometry.end_crop();
    }

    /// Bakes orientation, annotations and the pending crop into a new working
    /// image, then resets orientation, clears the annotation layer and leaves
    /// crop mode. Adjustments stay live. Returns the new natural size.
    ///
    /// On error the session is unchanged and stays in crop mode.
    pub fn commit_crop(&mut self) -> EditorResult<SizePx> {
        let rect = self
            .geometry
            .pending_crop()
            .ok_or_else(|| EditorError::invalid_state("commit_crop requires crop mode"))?;
        let scale = self.display_scale();

        let request = FlattenRequest {
            image: &self.working,
            adjustments: None,
            orientation: self.geometry.orientation(),
            crop: Some(rect),
            strokes: Some(self.annotations.strokes()),
            texts: self.annotations.texts(),
            display_scale: scale,
        };
        let cropped = self.compositor.flatten(&request)?;
        let encoded = codec::encode(&cropped, "image/png", 100)?;

        let natural = SizePx::of(&cropped);
        self.annotations.clear();
        self.annotations.resize(natural)?;
        self.working = encoded.bytes.into();
        self.natural = natural;
        let mean = scale.mean();
        self.display = DisplaySize::new(natural.width as f32 / mean, natural.height as f32 / mean);
        self.geometry.clear_orientation();
        self.geometry.end_crop();

        info!(
            width = natural.width,
            height = natural.height,
            "crop committed"
        );
        Ok(natural)
    }

    // ---- Tools & pointer input ----

    pub fn set_tool(&mut self, tool: Tool) {
        if tool != Tool::Pen && self.annotations.is_drawing() {
            self.annotations.end_stroke();
        }
        self.annotations.tool = tool;
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.annotations.brush = Brush::new(brush.color, brush.width, brush.opacity);
    }

    /// Brush width converted to natural pixels.
    fn natural_brush_width(&self) -> f32 {
        self.annotations.brush.width * self.display_scale().mean()
    }

    /// Pointer pressed at `at` (display space).
    pub fn pointer_down(&mut self, at: Point) -> PointerOutcome {
        if self.geometry.mode() == CropMode::Cropping {
            debug!("pointer ignored during crop");
            return PointerOutcome::Ignored;
        }
        if !self.display.contains(at) {
            debug!(x = at.x, y = at.y, "pointer outside image");
            return PointerOutcome::Ignored;
        }

        match self.annotations.tool {
            Tool::Pen => {
                let width = self.natural_brush_width();
                let natural = self.display_scale().to_natural(at);
                self.annotations.begin_stroke(natural, width);
                PointerOutcome::StrokeStarted
            }
            Tool::Text => match self.annotations.hit_test(at) {
                Some(id) => {
                    self.annotations.select(id);
                    PointerOutcome::TextSelected(id)
                }
                None => {
                    let color = self.annotations.brush.color;
                    let id = self.annotations.add_text(at, DEFAULT_TEXT, color, DEFAULT_FONT_SIZE);
                    PointerOutcome::TextPlaced(id)
                }
            },
            Tool::None => PointerOutcome::Ignored,
        }
    }

    /// Pointer moved to `at` (display space). Leaving the image ends the
    /// current stroke.
    pub fn pointer_move(&mut self, at: Point) -> PointerOutcome {
        if !self.annotations.is_drawing() {
            return PointerOutcome::Ignored;
        }
        if !self.display.contains(at) {
            debug!(x = at.x, y = at.y, "stroke left the image");
            self.annotations.end_stroke();
            return PointerOutcome::StrokeEnded;
        }

        let width = self.natural_brush_width();
        let natural = self.display_scale().to_natural(at);
        self.annotations.extend_stroke(natural, width);
        PointerOutcome::StrokeExtended
    }

    pub fn pointer_up(&mut self) -> PointerOutcome {
        if self.annotations.is_drawing() {
            self.annotations.end_stroke();
            PointerOutcome::StrokeEnded
        } else {
            PointerOutcome::Ignored
        }
    }

    pub fn pointer_leave(&mut self) -> PointerOutcome {
        self.pointer_up()
    }

    // ---- Text annotations ----

    /// Places a label at `at` (display space). Returns `None` when the point
    /// lies outside the image.
    pub fn place_text(
        &mut self,
        at: Point,
        text: impl Into<String>,
        color: Color,
        font_size: f32,
    ) -> Option<TextId> {
        if !self.display.contains(at) {
            debug!(x = at.x, y = at.y, "text placement outside image");
            return None;
        }
        Some(self.annotations.add_text(at, text, color, font_size))
    }

    pub fn select_text(&mut self, id: TextId) -> bool {
        self.annotations.select(id)
    }

    pub fn clear_selection(&mut self) {
        self.annotations.clear_selection();
    }

    pub fn hit_test_text(&self, at: Point) -> Option<TextId> {
        self.annotations.hit_test(at)
    }

    pub fn move_text(&mut self, id: TextId, dx: f32, dy: f32) -> bool {
        self.annotations.move_text(id, dx, dy)
    }

    pub fn scale_text(&mut self, id: TextId, factor: f32) -> Option<f32> {
        self.annotations.scale_text(id, factor)
    }

    pub fn set_text_content(&mut self, id: TextId, text: impl Into<String>) -> bool {
        self.annotations.set_text_content(id, text)
    }

    pub fn set_text_color(&mut self, id: TextId, color: Color) -> bool {
        self.annotations.set_text_color(id, color)
    }

    pub fn set_text_bounds(&mut self, id: TextId, width: f32, height: f32) -> bool {
        self.annotations.set_text_bounds(id, width, height)
    }

    pub fn remove_text(&mut self, id: TextId) -> Option<TextAnnotation> {
        self.annotations.remove_text(id)
    }

    // ---- Reset & export ----

    /// Restores the handed-over image and default models. Calling it twice
    /// leaves the same state as calling it once.
    pub fn reset(&mut self) -> EditorResult<()> {
        if !Arc::ptr_eq(&self.working, &self.source) {
            self.working = Arc::clone(&self.source);
            self.natural = self.source_size;
            self.display = self.source_size.into();
        }
        self.adjustments.reset();
        self.geometry.reset();
        self.annotations = AnnotationLayer::new(self.natural)?;
        debug!("session reset");
        Ok(())
    }

    fn export_request(&self) -> FlattenRequest<'_> {
        FlattenRequest {
            image: &self.working,
            adjustments: Some(&self.adjustments),
            orientation: self.geometry.orientation(),
            crop: None,
            strokes: Some(self.annotations.strokes()),
            texts: self.annotations.texts(),
            display_scale: self.display_scale(),
        }
    }

    /// Flattens the current state without encoding it.
    pub fn flatten(&self) -> EditorResult<RgbaImage> {
        self.compositor.flatten(&self.export_request())
    }

    /// Flattens and encodes in the session's MIME type.
    pub fn export(&self) -> EditorResult<ExportedImage> {
        if self.geometry.mode() == CropMode::Cropping {
            debug!("exporting while cropping; the pending rectangle is not applied");
        }
        self.compositor.export(&self.export_request(), &self.mime_type)
    }
}

impl Configurable for EditSession {
    /// Clamps every value on the way in. Text annotations are replaced; the
    /// stroke overlay is kept.
    fn apply_profile(&mut self, profile: &EditProfile) {
        if let Some(size) = profile.display_size {
            if size.is_valid() {
                self.display = size;
            } else {
                warn!(width = size.width, height = size.height, "ignoring invalid display size");
            }
        }
        self.adjustments = profile.adjustments.clamped();
        self.geometry = profile.geometry.normalized();
        self.annotations.restore_texts(profile.texts.clone());
    }

    fn export_profile(&self) -> EditProfile {
        EditProfile {
            adjustments: self.adjustments,
            geometry: self.geometry,
            texts: self.annotations.texts().to_vec(),
            display_size: Some(self.display),
        }
    }
}

// ============================================================================
// Editor
// ============================================================================

/// Host-facing entry point: zero or one open session.
#[derive(Debug, Default)]
pub struct Editor {
    config: EditorConfig,
    session: Option<EditSession>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Starts from whatever the host handed over. An absent handoff or a
    /// non-image one leaves the editor empty.
    pub fn from_handoff(handoff: Option<ImageHandoff>, config: EditorConfig) -> EditorResult<Self> {
        let mut editor = Self::new(config);
        if let Some(handoff) = handoff {
            editor.load(handoff)?;
        }
        Ok(editor)
    }

    /// Replaces the current session with one for `handoff`. Returns
    /// `Ok(false)` when the MIME type is not an image; the current session
    /// is kept in that case and on decode errors.
    pub fn load(&mut self, handoff: ImageHandoff) -> EditorResult<bool> {
        if !codec::is_image_mime(&handoff.mime_type) {
            warn!(mime_type = %handoff.mime_type, "ignoring non-image handoff");
            return Ok(false);
        }
        self.session = Some(EditSession::open(handoff, self.config.clone())?);
        Ok(true)
    }

    pub fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("session closed");
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn has_image(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        self.session.as_mut()
    }

    /// Exports the open session; `Ok(None)` when no image is loaded.
    pub fn export(&self) -> EditorResult<Option<ExportedImage>> {
        match &self.session {
            Some(session) => session.export().map(Some),
            None => {
                debug!("export requested without an image");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_handoff(image: &RgbaImage) -> ImageHandoff {
        let encoded = codec::encode(image, "image/png", 100).unwrap();
        ImageHandoff::new(encoded.bytes, "image/png")
    }

    fn session(w: u32, h: u32) -> EditSession {
        let img = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
        EditSession::open(png_handoff(&img), EditorConfig::default()).unwrap()
    }

    #[test]
    fn open_reads_natural_size() {
        let s = session(40, 30);
        assert_eq!(s.natural_size(), SizePx::new(40, 30));
        assert_eq!(s.display_size(), DisplaySize::new(40.0, 30.0));
        assert_eq!(s.annotations().strokes().size(), SizePx::new(40, 30));
    }

    #[test]
    fn open_rejects_non_image_mime() {
        let handoff = ImageHandoff::new(vec![1, 2, 3], "text/plain");
        assert!(matches!(
            EditSession::open(handoff, EditorConfig::default()),
            Err(EditorError::InvalidState(_))
        ));
    }

    #[test]
    fn pen_strokes_are_scaled_to_natural_pixels() {
        let mut s = session(200, 100);
        s.set_display_size(DisplaySize::new(100.0, 50.0)).unwrap();
        s.set_tool(Tool::Pen);

        assert_eq!(s.pointer_down(Point::new(10.0, 10.0)), PointerOutcome::StrokeStarted);
        assert_eq!(s.pointer_move(Point::new(40.0, 10.0)), PointerOutcome::StrokeExtended);
        assert_eq!(s.pointer_up(), PointerOutcome::StrokeEnded);

        let pixmap = s.annotations().strokes().pixmap();
        assert_eq!(pixmap.pixel(50, 20).unwrap().alpha(), 255);
        assert_eq!(pixmap.pixel(50, 60).unwrap().alpha(), 0);
    }

    #[test]
    fn out_of_bounds_pointer_is_dropped() {
        let mut s = session(50, 50);
        s.set_tool(Tool::Pen);
        assert_eq!(s.pointer_down(Point::new(-1.0, 10.0)), PointerOutcome::Ignored);
        assert_eq!(s.pointer_move(Point::new(10.0, 10.0)), PointerOutcome::Ignored);
        assert!(s.annotations().strokes().is_blank());

        s.pointer_down(Point::new(10.0, 10.0));
        assert_eq!(s.pointer_move(Point::new(80.0, 10.0)), PointerOutcome::StrokeEnded);
        assert!(!s.annotations().is_drawing());
        assert_eq!(s.pointer_leave(), PointerOutcome::Ignored);
    }

    #[test]
    fn text_tool_places_then_selects() {
        let mut s = session(200, 200);
        s.set_tool(Tool::Text);

        let PointerOutcome::TextPlaced(id) = s.pointer_down(Point::new(20.0, 50.0)) else {
            panic!("expected a placed label");
        };
        assert_eq!(s.annotations().text(id).unwrap().text, DEFAULT_TEXT);

        s.clear_selection();
        assert_eq!(s.pointer_down(Point::new(25.0, 45.0)), PointerOutcome::TextSelected(id));
        assert_eq!(s.annotations().selected(), Some(id));
    }

    #[test]
    fn pointer_is_ignored_while_cropping() {
        let mut s = session(20, 20);
        s.set_tool(Tool::Pen);
        s.begin_crop();
        assert_eq!(s.pointer_down(Point::new(5.0, 5.0)), PointerOutcome::Ignored);
    }

    #[test]
    fn display_resize_moves_texts_along() {
        let mut s = session(100, 100);
        let id = s.place_text(Point::new(10.0, 20.0), "a", Color::BLACK, 20.0).unwrap();
        s.set_display_size(DisplaySize::new(50.0, 50.0)).unwrap();
        let t = s.annotations().text(id).unwrap();
        assert_eq!((t.x, t.y, t.font_size), (5.0, 10.0, 10.0));

        assert!(s.set_display_size(DisplaySize::new(0.0, 10.0)).is_err());
        assert!(s.place_text(Point::new(60.0, 10.0), "b", Color::BLACK, 20.0).is_none());
    }

    #[test]
    fn commit_crop_replaces_working_image() {
        let mut s = session(200, 100);
        s.rotate(RotationStep::Clockwise90);
        s.begin_crop();
        s.set_crop_rect(CropRect::new(0.0, 0.0, 100.0, 50.0)).unwrap();

        assert_eq!(s.commit_crop().unwrap(), SizePx::new(100, 100));
        assert_eq!(s.natural_size(), SizePx::new(100, 100));
        assert_eq!(s.display_size(), DisplaySize::new(100.0, 100.0));
        assert_eq!(s.geometry().rotation(), 0);
        assert_eq!(s.geometry().mode(), CropMode::Idle);
        assert_eq!(s.annotations().strokes().size(), SizePx::new(100, 100));
        assert_eq!(s.source_size(), SizePx::new(200, 100));
    }

    #[test]
    fn commit_without_crop_mode_fails() {
        let mut s = session(10, 10);
        assert!(matches!(s.commit_crop(), Err(EditorError::InvalidState(_))));
    }

    #[test]
    fn failed_commit_keeps_crop_mode() {
        let mut s = session(10, 10);
        s.begin_crop();
        s.set_crop_rect(CropRect::new(50.0, 50.0, 0.0, 0.0)).unwrap();
        assert!(matches!(s.commit_crop(), Err(EditorError::EmptyCrop { .. })));
        assert_eq!(s.geometry().mode(), CropMode::Cropping);
        assert_eq!(s.natural_size(), SizePx::new(10, 10));
    }

    #[test]
    fn cancel_crop_keeps_image() {
        let mut s = session(30, 10);
        s.begin_crop();
        s.set_crop_rect(CropRect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        s.cancel_crop();
        assert_eq!(s.geometry().mode(), CropMode::Idle);
        assert_eq!(s.natural_size(), SizePx::new(30, 10));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut s = session(40, 20);
        s.set_adjustment(Adjustment::Contrast, 150.0);
        s.toggle_flip_vertical();
        s.place_text(Point::new(1.0, 10.0), "x", Color::BLACK, 12.0);
        s.begin_crop();
        s.set_crop_rect(CropRect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        s.commit_crop().unwrap();

        s.reset().unwrap();
        let once = s.export_profile();
        let size_once = s.natural_size();
        s.reset().unwrap();

        assert_eq!(s.export_profile(), once);
        assert_eq!(s.natural_size(), size_once);
        assert_eq!(size_once, SizePx::new(40, 20));
        assert!(s.adjustments().is_neutral());
        assert!(s.annotations().is_empty());
    }

    #[test]
    fn profile_round_trip_clamps() {
        let mut s = session(10, 10);
        let mut profile = EditProfile::new();
        profile.adjustments.brightness = 900.0;
        s.apply_profile(&profile);
        assert_eq!(s.adjustments().brightness, 200.0);
        assert_eq!(s.export_profile().adjustments.brightness, 200.0);
    }

    #[test]
    fn editor_ignores_non_image_handoff() {
        let editor = Editor::from_handoff(
            Some(ImageHandoff::new(b"hello".to_vec(), "text/plain")),
            EditorConfig::default(),
        )
        .unwrap();
        assert!(!editor.has_image());
        assert_eq!(editor.export().unwrap(), None);
    }

    #[test]
    fn editor_close_drops_session() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let mut editor = Editor::from_handoff(Some(png_handoff(&img)), EditorConfig::default()).unwrap();
        assert!(editor.has_image());
        editor.close();
        assert!(editor.session().is_none());
    }
}
