//! Pixel kernels for the adjustment effect stack.
//!
//! Each [`Effect`] is applied with the same formula a browser uses for the
//! matching CSS filter function, so the export reproduces the preview.

use image::RgbaImage;
use palette::{Hsl, IntoColor, Srgb};
use tracing::trace;

use super::{RenderContext, Stage};
use crate::adjust::{AdjustmentSet, Effect};
use crate::config::ExportFilters;
use crate::error::{EditorError, EditorResult};
use crate::surface::{image_to_pixmap, pixmap_to_image};

// ============================================================================
// FilterStage
// ============================================================================

/// Bakes the adjustment set into the raster.
#[derive(Debug, Clone)]
pub struct FilterStage {
    effects: Vec<Effect>,
    /// Vignette strength, 0-100.
    vignette: f32,
}

impl FilterStage {
    /// Builds the stage for an export under the given filter policy.
    pub fn for_export(adjustments: &AdjustmentSet, filters: ExportFilters) -> Self {
        match filters {
            ExportFilters::Full => Self {
                effects: adjustments.effects(),
                vignette: adjustments.vignette,
            },
            ExportFilters::ToneOnly => Self {
                effects: adjustments.tone_effects(),
                vignette: 0.0,
            },
        }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }
}

impl Stage for FilterStage {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn is_active(&self) -> bool {
        self.vignette > 0.0 || self.effects.iter().any(|e| !e.is_identity())
    }

    fn transform(&self, ctx: &mut RenderContext) -> EditorResult<()> {
        for effect in self.effects.iter().filter(|e| !e.is_identity()) {
            trace!(effect = %effect.css(), "applying effect");
            apply_effect(&mut ctx.image, *effect)?;
        }
        if self.vignette > 0.0 {
            apply_vignette(&mut ctx.image, self.vignette);
        }
        Ok(())
    }
}

// ============================================================================
// Kernels
// ============================================================================

/// Applies one effect in place. Alpha is left untouched.
pub fn apply_effect(image: &mut RgbaImage, effect: Effect) -> EditorResult<()> {
    match effect {
        Effect::Brightness(p) => {
            let k = p.max(0.0) / 100.0;
            map_channels(image, |c| c * k);
        }
        Effect::Contrast(p) => {
            let k = p.max(0.0) / 100.0;
            map_channels(image, |c| (c - 0.5) * k + 0.5);
        }
        Effect::Saturate(p) => apply_matrix(image, &saturate_matrix(p.max(0.0) / 100.0)),
        Effect::Sepia(p) => apply_matrix(image, &sepia_matrix(p.clamp(0.0, 100.0) / 100.0)),
        Effect::Grayscale(p) => {
            apply_matrix(image, &grayscale_matrix(p.clamp(0.0, 100.0) / 100.0))
        }
        Effect::HueRotate(deg) => apply_hue_rotation(image, deg),
        Effect::Blur(sigma) => apply_blur(image, sigma)?,
    }
    Ok(())
}

fn map_channels(image: &mut RgbaImage, f: impl Fn(f32) -> f32) {
    for pixel in image.pixels_mut() {
        for c in &mut pixel.0[..3] {
            *c = to_u8(f(*c as f32 / 255.0));
        }
    }
}

type Matrix3 = [[f32; 3]; 3];

fn apply_matrix(image: &mut RgbaImage, m: &Matrix3) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        for (i, row) in m.iter().enumerate() {
            pixel.0[i] = to_u8(row[0] * r + row[1] * g + row[2] * b);
        }
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn saturate_matrix(s: f32) -> Matrix3 {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix3 {
    let k = 1.0 - amount;
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix3 {
    let k = 1.0 - amount;
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

/// Rotates the hue of every visible pixel through HSL.
pub fn apply_hue_rotation(image: &mut RgbaImage, degrees: f32) {
    let degrees = degrees.rem_euclid(360.0);
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }

        let rgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        let mut hsl: Hsl = rgb.into_color();
        hsl.hue += degrees;
        let rotated: Srgb = hsl.into_color();

        pixel.0 = [
            to_u8(rotated.red),
            to_u8(rotated.green),
            to_u8(rotated.blue),
            a,
        ];
    }
}

// ============================================================================
// Blur
// ============================================================================

/// Gaussian blur with standard deviation `sigma` in pixels. Runs on
/// premultiplied data so transparent edges do not bleed dark fringes.
pub fn apply_blur(image: &mut RgbaImage, sigma: f32) -> EditorResult<()> {
    let radius = (sigma * 3.0).ceil().max(0.0) as u32;
    if radius == 0 || image.width() == 0 || image.height() == 0 {
        return Ok(());
    }

    let mut pixmap = image_to_pixmap(image)?;
    let blurred = blur_rgba8_premul(pixmap.data(), image.width(), image.height(), radius, sigma)?;
    pixmap.data_mut().copy_from_slice(&blurred);
    *image = pixmap_to_image(&pixmap)?;
    Ok(())
}

fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> EditorResult<Vec<u8>> {
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> EditorResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(EditorError::surface("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // keep the kernel summing to exactly 1.0 in q16
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

// ============================================================================
// Vignette
// ============================================================================

/// Darkens toward the corners: no effect inside 55% of the center-to-corner
/// distance, ramping linearly to `strength / 100 * 0.8` black at the corners.
pub fn apply_vignette(image: &mut RgbaImage, strength: f32) {
    let max_alpha = strength.clamp(0.0, 100.0) / 100.0 * 0.8;
    let (w, h) = (image.width() as f32, image.height() as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    if cx <= 0.0 || cy <= 0.0 {
        return;
    }

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = (x as f32 + 0.5 - cx) / cx;
        let dy = (y as f32 + 0.5 - cy) / cy;
        let r = (dx * dx + dy * dy).sqrt() / std::f32::consts::SQRT_2;
        let t = ((r - 0.55) / 0.45).clamp(0.0, 1.0);
        let keep = 1.0 - max_alpha * t;
        for c in &mut pixel.0[..3] {
            *c = (*c as f32 * keep).round() as u8;
        }
    }
}
