//! Rotation, flips and the crop sub-flow.

use resvg::tiny_skia::Transform;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::surface::{RectPx, SizePx};

/// Normalizes degrees into `[0, 360)`.
pub fn normalize_rotation(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// Fixed rotation increments offered by the rotate buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationStep {
    Clockwise90,
    CounterClockwise90,
    Clockwise45,
    CounterClockwise45,
}

impl RotationStep {
    pub fn degrees(&self) -> i32 {
        match self {
            Self::Clockwise90 => 90,
            Self::CounterClockwise90 => -90,
            Self::Clockwise45 => 45,
            Self::CounterClockwise45 => -45,
        }
    }
}

// ============================================================================
// Orientation
// ============================================================================

/// Rotation plus flips: the part of [`Geometry`] baked by the orientation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    /// Clockwise degrees in `[0, 360)`.
    pub rotation: i32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Orientation {
    pub fn new(rotation: i32, flip_horizontal: bool, flip_vertical: bool) -> Self {
        Self {
            rotation: normalize_rotation(rotation),
            flip_horizontal,
            flip_vertical,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == 0 && !self.flip_horizontal && !self.flip_vertical
    }

    /// Number of clockwise quarter turns when the rotation is a multiple of 90.
    pub fn quarter_turns(&self) -> Option<u8> {
        (self.rotation % 90 == 0).then_some((self.rotation / 90) as u8)
    }

    fn cos_sin(&self) -> (f32, f32) {
        match self.quarter_turns() {
            Some(0) => (1.0, 0.0),
            Some(1) => (0.0, 1.0),
            Some(2) => (-1.0, 0.0),
            Some(3) => (0.0, -1.0),
            _ => {
                let rad = (self.rotation as f32).to_radians();
                (rad.cos(), rad.sin())
            }
        }
    }

    /// The 2x2 linear part `(a, b, c, d)` in CSS `matrix()` order:
    /// rotation applied after the flip scale.
    pub fn linear(&self) -> (f32, f32, f32, f32) {
        let (cos, sin) = self.cos_sin();
        let fx = if self.flip_horizontal { -1.0 } else { 1.0 };
        let fy = if self.flip_vertical { -1.0 } else { 1.0 };
        (cos * fx, sin * fx, -sin * fy, cos * fy)
    }

    /// Size of the surface that holds the rotated image without clipping.
    pub fn output_size(&self, source: SizePx) -> SizePx {
        match self.quarter_turns() {
            Some(turns) if turns % 2 == 1 => source.transposed(),
            Some(_) => source,
            None => {
                let (cos, sin) = self.cos_sin();
                let (w, h) = (source.width as f32, source.height as f32);
                let bw = cos.abs() * w + sin.abs() * h;
                let bh = sin.abs() * w + cos.abs() * h;
                SizePx::new((bw - 1e-3).ceil() as u32, (bh - 1e-3).ceil() as u32)
            }
        }
    }

    /// Maps `source`-sized pixel space onto the output surface: translate to
    /// the source center, flip, rotate, then translate to the output center.
    pub fn transform(&self, source: SizePx) -> Transform {
        let out = self.output_size(source);
        let (a, b, c, d) = self.linear();
        let (scx, scy) = (source.width as f32 / 2.0, source.height as f32 / 2.0);
        let (dcx, dcy) = (out.width as f32 / 2.0, out.height as f32 / 2.0);
        let tx = dcx - (a * scx + c * scy);
        let ty = dcy - (b * scx + d * scy);
        Transform::from_row(a, b, c, d, tx, ty)
    }
}

// ============================================================================
// CropRect
// ============================================================================

/// Crop rectangle in percent of the displayed (oriented) image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for CropRect {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CropRect {
    /// The inactive default: 90% of the image, centered.
    pub const DEFAULT: Self = Self {
        x: 5.0,
        y: 5.0,
        width: 90.0,
        height: 90.0,
    };

    /// Creates a rectangle clamped into `[0, 100]` on both axes.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        let x = finite(x).clamp(0.0, 100.0);
        let y = finite(y).clamp(0.0, 100.0);
        Self {
            x,
            y,
            width: finite(width).clamp(0.0, 100.0 - x),
            height: finite(height).clamp(0.0, 100.0 - y),
        }
    }

    pub fn clamped(&self) -> Self {
        Self::new(self.x, self.y, self.width, self.height)
    }

    /// Maps a rectangle drawn over a view zoomed about the image center back
    /// onto the unzoomed image.
    pub fn zoomed(&self, zoom: f32) -> Self {
        let zoom = Geometry::clamp_zoom(zoom);
        Self::new(
            50.0 + (self.x - 50.0) / zoom,
            50.0 + (self.y - 50.0) / zoom,
            self.width / zoom,
            self.height / zoom,
        )
    }

    /// Absolute pixel bounds within an image of `size`, clamped to it.
    pub fn to_pixels(&self, size: SizePx) -> RectPx {
        let (w, h) = (size.width as f32, size.height as f32);
        RectPx::new(
            (self.x / 100.0 * w).round() as u32,
            (self.y / 100.0 * h).round() as u32,
            (self.width / 100.0 * w).round() as u32,
            (self.height / 100.0 * h).round() as u32,
        )
        .clamp_to(size)
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Crop sub-flow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropMode {
    #[default]
    Idle,
    Cropping,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Geometry {
    rotation: i32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    crop: CropRect,
    zoom: f32,
    #[serde(skip)]
    mode: CropMode,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            rotation: 0,
            flip_horizontal: false,
            flip_vertical: false,
            crop: CropRect::DEFAULT,
            zoom: 1.0,
            mode: CropMode::Idle,
        }
    }
}

impl Geometry {
    pub const MIN_ZOOM: f32 = 1.0;
    pub const MAX_ZOOM: f32 = 4.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clamp_zoom(zoom: f32) -> f32 {
        if zoom.is_finite() {
            zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM)
        } else {
            Self::MIN_ZOOM
        }
    }

    /// Returns a copy with every field brought back into range.
    pub fn normalized(mut self) -> Self {
        self.rotation = normalize_rotation(self.rotation);
        self.crop = self.crop.clamped();
        self.zoom = Self::clamp_zoom(self.zoom);
        self
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn rotate(&mut self, step: RotationStep) -> i32 {
        self.rotate_by(step.degrees())
    }

    /// Adds `delta` degrees and returns the normalized rotation.
    pub fn rotate_by(&mut self, delta: i32) -> i32 {
        self.rotation = normalize_rotation(self.rotation.wrapping_add(normalize_rotation(delta)));
        self.rotation
    }

    /// Sets an absolute rotation (continuous straightening).
    pub fn set_rotation(&mut self, degrees: i32) -> i32 {
        self.rotation = normalize_rotation(degrees);
        self.rotation
    }

    pub fn toggle_flip_horizontal(&mut self) -> bool {
        self.flip_horizontal = !self.flip_horizontal;
        self.flip_horizontal
    }

    pub fn toggle_flip_vertical(&mut self) -> bool {
        self.flip_vertical = !self.flip_vertical;
        self.flip_vertical
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::new(self.rotation, self.flip_horizontal, self.flip_vertical)
    }

    /// Drops rotation and flips once they have been baked into pixels.
    pub(crate) fn clear_orientation(&mut self) {
        self.rotation = 0;
        self.flip_horizontal = false;
        self.flip_vertical = false;
    }

    // ---- Crop sub-flow ----

    pub fn mode(&self) -> CropMode {
        self.mode
    }

    pub fn crop_rect(&self) -> CropRect {
        self.crop
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Enters crop mode from the default rectangle. Previous rectangles are
    /// not remembered.
    pub fn begin_crop(&mut self) {
        self.crop = CropRect::DEFAULT;
        self.zoom = 1.0;
        self.mode = CropMode::Cropping;
    }

    fn require_cropping(&self, op: &str) -> EditorResult<()> {
        match self.mode {
            CropMode::Cropping => Ok(()),
            CropMode::Idle => Err(EditorError::invalid_state(format!(
                "{op} requires crop mode"
            ))),
        }
    }

    pub fn set_crop_rect(&mut self, rect: CropRect) -> EditorResult<CropRect> {
        self.require_cropping("set_crop_rect")?;
        self.crop = rect.clamped();
        Ok(self.crop)
    }

    pub fn set_crop_zoom(&mut self, zoom: f32) -> EditorResult<f32> {
        self.require_cropping("set_crop_zoom")?;
        self.zoom = Self::clamp_zoom(zoom);
        Ok(self.zoom)
    }

    /// The rectangle that a commit would apply, after undoing the view zoom.
    pub fn pending_crop(&self) -> Option<CropRect> {
        match self.mode {
            CropMode::Cropping => Some(self.crop.zoomed(self.zoom)),
            CropMode::Idle => None,
        }
    }

    /// Leaves crop mode and resets the rectangle and zoom.
    pub fn end_crop(&mut self) {
        self.crop = CropRect::DEFAULT;
        self.zoom = 1.0;
        self.mode = CropMode::Idle;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(t: &Transform, x: f32, y: f32) -> (f32, f32) {
        (t.sx * x + t.kx * y + t.tx, t.ky * x + t.sy * y + t.ty)
    }

    #[test]
    fn rotation_accumulates_modulo_360() {
        let mut g = Geometry::new();
        let deltas = [90, 90, 45, -90, -90, -90, 270, 720, -45];
        let mut sum = 0i32;
        for d in deltas {
            sum += d;
            g.rotate_by(d);
            assert_eq!(g.rotation(), sum.rem_euclid(360));
            assert!((0..360).contains(&g.rotation()));
        }

        g.rotate(RotationStep::CounterClockwise90);
        assert_eq!(g.rotation(), (sum - 90).rem_euclid(360));
        assert_eq!(g.set_rotation(-30), 330);
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let src = SizePx::new(200, 100);
        assert_eq!(Orientation::new(90, false, false).output_size(src), SizePx::new(100, 200));
        assert_eq!(Orientation::new(180, false, false).output_size(src), src);
        assert_eq!(Orientation::new(270, true, false).output_size(src), SizePx::new(100, 200));
        assert_eq!(Orientation::new(45, false, false).output_size(SizePx::new(100, 100)), SizePx::new(142, 142));
    }

    #[test]
    fn clockwise_quarter_turn_moves_top_left_to_top_right() {
        let t = Orientation::new(90, false, false).transform(SizePx::new(200, 100));
        assert_eq!(map(&t, 0.0, 0.0), (100.0, 0.0));
        assert_eq!(map(&t, 200.0, 100.0), (0.0, 200.0));
    }

    #[test]
    fn horizontal_flip_mirrors_x() {
        let t = Orientation::new(0, true, false).transform(SizePx::new(10, 4));
        assert_eq!(map(&t, 0.0, 0.0), (10.0, 0.0));
        assert_eq!(map(&t, 10.0, 4.0), (0.0, 4.0));
    }

    #[test]
    fn crop_rect_is_clamped() {
        let r = CropRect::new(-10.0, 50.0, 150.0, 80.0);
        assert_eq!(r, CropRect::new(0.0, 50.0, 100.0, 50.0));
    }

    #[test]
    fn crop_pixel_mapping() {
        let r = CropRect::new(25.0, 0.0, 50.0, 100.0);
        assert_eq!(r.to_pixels(SizePx::new(200, 100)), RectPx::new(50, 0, 100, 100));

        let r = CropRect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.to_pixels(SizePx::new(100, 200)), RectPx::new(10, 40, 30, 80));
    }

    #[test]
    fn zoom_maps_about_center() {
        let r = CropRect::new(0.0, 0.0, 100.0, 100.0).zoomed(2.0);
        assert_eq!(r, CropRect::new(25.0, 25.0, 50.0, 50.0));
    }

    #[test]
    fn crop_sub_flow() {
        let mut g = Geometry::new();
        assert!(g.set_crop_rect(CropRect::new(0.0, 0.0, 10.0, 10.0)).is_err());
        assert!(g.pending_crop().is_none());

        g.begin_crop();
        g.set_crop_rect(CropRect::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        assert_eq!(g.set_crop_zoom(9.0).unwrap(), Geometry::MAX_ZOOM);
        assert!(g.pending_crop().is_some());

        g.end_crop();
        assert_eq!(g.mode(), CropMode::Idle);
        assert_eq!(g.crop_rect(), CropRect::DEFAULT);

        // re-entering starts from the default again
        g.begin_crop();
        assert_eq!(g.crop_rect(), CropRect::DEFAULT);
        assert_eq!(g.zoom(), 1.0);
    }

    #[test]
    fn deserialized_geometry_is_normalized() {
        let g: Geometry = serde_json::from_str(r#"{"rotation": -90, "flipHorizontal": true}"#).unwrap();
        let g = g.normalized();
        assert_eq!(g.rotation(), 270);
        assert!(g.flip_horizontal);
        assert_eq!(g.mode(), CropMode::Idle);
    }
}
