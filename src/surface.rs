//! Pixel-space primitives and conversions between `image` buffers and
//! `tiny_skia` pixmaps.
//!
//! The compositor works on straight-alpha [`RgbaImage`] buffers for pixel
//! kernels and on premultiplied [`Pixmap`] surfaces whenever something has to
//! be drawn through an affine transform.

use std::fmt;

use image::RgbaImage;
use resvg::tiny_skia::Pixmap;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

/// A rectangle defined in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle starting at origin (0, 0) with the given dimensions.
    pub fn from_size(size: SizePx) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Shrinks the rectangle so it lies within `bounds` anchored at the origin.
    pub fn clamp_to(&self, bounds: SizePx) -> Self {
        let x = self.x.min(bounds.width);
        let y = self.y.min(bounds.height);
        let right = self.right().min(bounds.width);
        let bottom = self.bottom().min(bounds.height);
        Self::new(x, y, right - x, bottom - y)
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Returns the same size with width and height exchanged.
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A point in floating-point coordinates (display or natural space,
/// depending on the caller).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Size of the on-screen image element in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }
}

impl From<SizePx> for DisplaySize {
    fn from(size: SizePx) -> Self {
        Self::new(size.width as f32, size.height as f32)
    }
}

/// Independent horizontal/vertical factors from display to natural space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayScale {
    pub x: f32,
    pub y: f32,
}

impl DisplayScale {
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    /// `natural / display` per axis.
    pub fn between(natural: SizePx, display: DisplaySize) -> Self {
        if !display.is_valid() {
            return Self::IDENTITY;
        }
        Self {
            x: natural.width as f32 / display.width,
            y: natural.height as f32 / display.height,
        }
    }

    pub fn to_natural(&self, p: Point) -> Point {
        Point::new(p.x * self.x, p.y * self.y)
    }

    pub fn mean(&self) -> f32 {
        (self.x + self.y) / 2.0
    }
}

// ============================================================================
// Color
// ============================================================================

/// A straight-alpha RGBA color, serialized as a `#rrggbb` / `#rrggbbaa` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            6 => Some(Self::rgb(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
            )),
            8 => Some(Self::rgba(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
                channel(digits.get(6..8)?)?,
            )),
            _ => None,
        }
    }

    /// `#rrggbb` when opaque, `#rrggbbaa` otherwise.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Returns the color with its alpha multiplied by `opacity` (0.0-1.0).
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..*self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color `{value}`"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

// ============================================================================
// Pixmap conversions
// ============================================================================

/// Converts a straight-alpha image into a premultiplied pixmap.
pub fn image_to_pixmap(image: &RgbaImage) -> EditorResult<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height()).ok_or_else(|| {
        EditorError::surface(format!(
            "cannot allocate {}x{} surface",
            image.width(),
            image.height()
        ))
    })?;

    for (dst, src) in pixmap
        .data_mut()
        .chunks_exact_mut(4)
        .zip(image.as_raw().chunks_exact(4))
    {
        let a = src[3] as u32;
        dst[0] = premultiply(src[0], a);
        dst[1] = premultiply(src[1], a);
        dst[2] = premultiply(src[2], a);
        dst[3] = src[3];
    }

    Ok(pixmap)
}

/// Converts a premultiplied pixmap into a straight-alpha image.
pub fn pixmap_to_image(pixmap: &Pixmap) -> EditorResult<RgbaImage> {
    let mut raw = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.data().chunks_exact(4) {
        let (r, g, b, a) = unpremultiply(px[0], px[1], px[2], px[3]);
        raw.extend_from_slice(&[r, g, b, a]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .ok_or_else(|| EditorError::surface("pixmap buffer size mismatch"))
}

/// Allocates a fully transparent pixmap.
pub fn blank_pixmap(size: SizePx) -> EditorResult<Pixmap> {
    Pixmap::new(size.width, size.height).ok_or_else(|| {
        EditorError::surface(format!(
            "cannot allocate {}x{} surface",
            size.width, size.height
        ))
    })
}

fn premultiply(c: u8, a: u32) -> u8 {
    ((c as u32 * a + 127) / 255) as u8
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}
