//! Tone, color and stylistic adjustments.
//!
//! [`AdjustmentSet`] is the per-session parameter block. It does not know how
//! to render itself; instead it lowers into an ordered list of [`Effect`]s,
//! which the preview prints as CSS filter functions and the compositor runs
//! as pixel kernels. Both paths therefore agree on order and magnitude.

use serde::{Deserialize, Serialize};

// ============================================================================
// Adjustment keys
// ============================================================================

/// Identifies a single numeric field of an [`AdjustmentSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
    Highlights,
    Shadows,
    Clarity,
    Vibrance,
    Blur,
    Sharpen,
    Sepia,
    HueRotate,
    Vignette,
}

impl Adjustment {
    pub const ALL: [Adjustment; 12] = [
        Adjustment::Brightness,
        Adjustment::Contrast,
        Adjustment::Saturation,
        Adjustment::Highlights,
        Adjustment::Shadows,
        Adjustment::Clarity,
        Adjustment::Vibrance,
        Adjustment::Blur,
        Adjustment::Sharpen,
        Adjustment::Sepia,
        Adjustment::HueRotate,
        Adjustment::Vignette,
    ];

    /// Inclusive value range accepted by the model.
    pub fn range(&self) -> (f32, f32) {
        match self {
            Self::Brightness | Self::Contrast | Self::Saturation => (0.0, 200.0),
            Self::Highlights | Self::Shadows | Self::Clarity | Self::Vibrance => (-100.0, 100.0),
            Self::Blur => (0.0, 20.0),
            Self::Sharpen => (0.0, 50.0),
            Self::Sepia | Self::Vignette => (0.0, 100.0),
            Self::HueRotate => (0.0, 360.0),
        }
    }

    /// Value that leaves the image unchanged.
    pub fn neutral(&self) -> f32 {
        match self {
            Self::Brightness | Self::Contrast | Self::Saturation => 100.0,
            _ => 0.0,
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.neutral();
        }
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }
}

// ============================================================================
// FilterPreset
// ============================================================================

/// Named looks layered after the manual sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterPreset {
    #[default]
    None,
    Vintage,
    Noir,
    Warm,
    Cool,
    Dramatic,
    Fade,
}

impl FilterPreset {
    pub fn effects(&self) -> Vec<Effect> {
        use Effect::*;
        match self {
            Self::None => Vec::new(),
            Self::Vintage => vec![Sepia(50.0), Contrast(110.0), Brightness(110.0), Saturate(80.0)],
            Self::Noir => vec![Grayscale(100.0), Contrast(130.0), Brightness(90.0)],
            Self::Warm => vec![Sepia(30.0), Saturate(140.0), HueRotate(350.0)],
            Self::Cool => vec![Saturate(110.0), HueRotate(15.0), Brightness(105.0)],
            Self::Dramatic => vec![Contrast(150.0), Saturate(120.0), Brightness(90.0)],
            Self::Fade => vec![Contrast(80.0), Brightness(110.0), Saturate(70.0)],
        }
    }
}

// ============================================================================
// Effect
// ============================================================================

/// One primitive of the effect stack. Percentages follow CSS filter
/// semantics: `100` is identity for brightness/contrast/saturate, `0` for
/// sepia/grayscale. Blur is a standard deviation in pixels, hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Blur(f32),
    Sepia(f32),
    HueRotate(f32),
    Grayscale(f32),
}

impl Effect {
    /// CSS filter function for this effect.
    pub fn css(&self) -> String {
        match self {
            Self::Brightness(v) => format!("brightness({}%)", fmt_num(*v)),
            Self::Contrast(v) => format!("contrast({}%)", fmt_num(*v)),
            Self::Saturate(v) => format!("saturate({}%)", fmt_num(*v)),
            Self::Blur(v) => format!("blur({}px)", fmt_num(*v)),
            Self::Sepia(v) => format!("sepia({}%)", fmt_num(*v)),
            Self::HueRotate(v) => format!("hue-rotate({}deg)", fmt_num(*v)),
            Self::Grayscale(v) => format!("grayscale({}%)", fmt_num(*v)),
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Self::Brightness(v) | Self::Contrast(v) | Self::Saturate(v) => *v == 100.0,
            Self::Blur(v) | Self::Sepia(v) | Self::Grayscale(v) => *v == 0.0,
            Self::HueRotate(v) => v.rem_euclid(360.0) == 0.0,
        }
    }
}

/// Formats with at most two decimals and no trailing zeros.
pub(crate) fn fmt_num(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

// ============================================================================
// AdjustmentSet
// ============================================================================

/// All adjustment parameters of one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdjustmentSet {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub clarity: f32,
    pub vibrance: f32,
    pub blur: f32,
    pub sharpen: f32,
    pub sepia: f32,
    pub hue_rotate: f32,
    pub vignette: f32,
    pub preset: FilterPreset,
}

impl Default for AdjustmentSet {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            highlights: 0.0,
            shadows: 0.0,
            clarity: 0.0,
            vibrance: 0.0,
            blur: 0.0,
            sharpen: 0.0,
            sepia: 0.0,
            hue_rotate: 0.0,
            vignette: 0.0,
            preset: FilterPreset::None,
        }
    }
}

impl AdjustmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: Adjustment) -> &mut f32 {
        match key {
            Adjustment::Brightness => &mut self.brightness,
            Adjustment::Contrast => &mut self.contrast,
            Adjustment::Saturation => &mut self.saturation,
            Adjustment::Highlights => &mut self.highlights,
            Adjustment::Shadows => &mut self.shadows,
            Adjustment::Clarity => &mut self.clarity,
            Adjustment::Vibrance => &mut self.vibrance,
            Adjustment::Blur => &mut self.blur,
            Adjustment::Sharpen => &mut self.sharpen,
            Adjustment::Sepia => &mut self.sepia,
            Adjustment::HueRotate => &mut self.hue_rotate,
            Adjustment::Vignette => &mut self.vignette,
        }
    }

    pub fn get(&self, key: Adjustment) -> f32 {
        let mut copy = *self;
        *copy.slot(key)
    }

    /// Sets a field, clamping into its range. Returns the stored value.
    pub fn set(&mut self, key: Adjustment, value: f32) -> f32 {
        let clamped = key.clamp(value);
        *self.slot(key) = clamped;
        clamped
    }

    pub fn with(mut self, key: Adjustment, value: f32) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_preset(mut self, preset: FilterPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Returns a copy with every field clamped into range.
    pub fn clamped(mut self) -> Self {
        for key in Adjustment::ALL {
            let v = self.get(key);
            self.set(key, v);
        }
        self
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The brightness/contrast/saturation prefix of the stack.
    pub fn tone_effects(&self) -> Vec<Effect> {
        vec![
            Effect::Brightness(self.brightness),
            Effect::Contrast(self.contrast),
            Effect::Saturate(self.saturation),
        ]
    }

    /// The full ordered effect stack.
    ///
    /// brightness, contrast, saturation, blur, sepia, hue-rotate, sharpen,
    /// highlights, shadows, clarity, vibrance, then the preset's effects.
    pub fn effects(&self) -> Vec<Effect> {
        let mut stack = self.tone_effects();
        stack.extend([
            Effect::Blur(self.blur),
            Effect::Sepia(self.sepia),
            Effect::HueRotate(self.hue_rotate),
            // sharpen
            Effect::Contrast(100.0 + self.sharpen),
            Effect::Brightness(100.0 - self.sharpen / 5.0),
            // highlights
            Effect::Brightness(100.0 + self.highlights / 5.0),
            // shadows
            Effect::Brightness(100.0 + self.shadows / 10.0),
            // clarity
            Effect::Contrast(100.0 + self.clarity / 2.0),
            Effect::Brightness(100.0 - self.clarity / 10.0),
            // vibrance
            Effect::Saturate(100.0 + self.vibrance),
        ]);
        stack.extend(self.preset.effects());
        stack
    }
}
