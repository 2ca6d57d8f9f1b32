//! Stage infrastructure for the flatten pipeline.
//!
//! Each stage implements [`Stage`], which defines:
//! - How it changes the working raster
//! - What properties it emits for downstream stages
//! - What properties it consumes from upstream stages
//!
//! Properties flow through the pipeline via [`RenderContext`]. Geometric
//! stages keep [`Placement`] current so the annotation stages can map
//! natural-space content onto whatever surface the raster has become.

pub mod crop;
pub mod filter;
pub mod orient;
pub mod strokes;
pub mod text;

pub use crop::CropStage;
pub use filter::FilterStage;
pub use orient::OrientStage;
pub use strokes::StrokeStage;
pub use text::TextStage;

use std::any::{Any, TypeId};
use std::collections::HashMap;

use image::RgbaImage;
use resvg::tiny_skia::Transform;
use tracing::debug;

use crate::error::EditorResult;
use crate::surface::SizePx;

// ============================================================================
// Render Context
// ============================================================================

/// Context that flows through the flatten pipeline.
///
/// Stages can read properties set by upstream stages and emit new properties
/// for downstream stages to consume.
///
/// ```ignore
/// // Upstream stage emits a property
/// ctx.set(Placement(transform));
///
/// // Downstream stage reads the property
/// let placement = ctx.placement();
/// ```
pub struct RenderContext {
    /// The working raster.
    pub image: RgbaImage,

    /// Size of `image` before the current stage ran.
    input_size: SizePx,

    /// Typed property bag for inter-stage communication.
    properties: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RenderContext {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            input_size: SizePx::of(&image),
            image,
            properties: HashMap::new(),
        }
    }

    /// Sets a typed property that downstream stages can read.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.properties.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Gets a typed property set by an upstream stage.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.properties
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.properties.contains_key(&TypeId::of::<T>())
    }

    pub fn size(&self) -> SizePx {
        SizePx::of(&self.image)
    }

    /// Size of the raster as the current stage received it.
    pub fn input_size(&self) -> SizePx {
        self.input_size
    }

    /// Current natural-to-output mapping; identity until a geometric stage
    /// emits one.
    pub fn placement(&self) -> Transform {
        self.get::<Placement>()
            .map(|p| p.0)
            .unwrap_or_else(Transform::identity)
    }
}

// ============================================================================
// Common Properties
// ============================================================================

/// Affine map from the unedited image's natural pixel space to the current
/// raster.
///
/// Emitted by the orientation and crop stages. Consumed by the stroke and
/// text stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement(pub Transform);

impl Placement {
    /// Applies `outer` after the current mapping.
    pub fn then(&self, outer: Transform) -> Self {
        Self(concat(outer, self.0))
    }
}

/// Returns `outer ∘ inner`: maps a point through `inner`, then `outer`.
pub fn concat(outer: Transform, inner: Transform) -> Transform {
    let o = outer;
    let i = inner;
    Transform::from_row(
        o.sx * i.sx + o.kx * i.ky,
        o.ky * i.sx + o.sy * i.ky,
        o.sx * i.kx + o.kx * i.sy,
        o.ky * i.kx + o.sy * i.sy,
        o.sx * i.tx + o.kx * i.ty + o.tx,
        o.ky * i.tx + o.sy * i.ty + o.ty,
    )
}

// ============================================================================
// Stage Trait
// ============================================================================

/// One step of the flatten pipeline.
///
/// The separation of [`transform`](Self::transform) and [`emit`](Self::emit)
/// keeps property emission in one place and makes the data flow explicit.
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Inactive stages are skipped entirely, including [`emit`](Self::emit).
    fn is_active(&self) -> bool {
        true
    }

    /// Changes `ctx.image`, reading whatever upstream properties it needs.
    fn transform(&self, ctx: &mut RenderContext) -> EditorResult<()>;

    /// Emits properties for downstream stages. Called after
    /// [`transform`](Self::transform).
    fn emit(&self, _ctx: &mut RenderContext) {}
}

/// Runs `stages` in order over `image`.
pub fn run(image: RgbaImage, stages: &[&dyn Stage]) -> EditorResult<RenderContext> {
    let mut ctx = RenderContext::new(image);

    for stage in stages {
        if !stage.is_active() {
            debug!(stage = stage.name(), "stage skipped");
            continue;
        }

        ctx.input_size = ctx.size();
        stage.transform(&mut ctx)?;
        stage.emit(&mut ctx);

        let size = ctx.size();
        debug!(
            stage = stage.name(),
            width = size.width,
            height = size.height,
            "stage applied"
        );
    }

    Ok(ctx)
}
