//! photo-flatten: non-destructive photo editing core
//!
//! This crate holds the models behind a single-image editor (adjustments,
//! rotation/flip/crop geometry, freehand strokes and text labels), a
//! declarative preview descriptor for the host to render, and the compositor
//! that flattens everything into one exported raster.
//!
//! # Example
//!
//! ```no_run
//! use photo_flatten::{
//!     Adjustment, Editor, EditorConfig, ImageHandoff, RotationStep,
//! };
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let mut editor =
//!     Editor::from_handoff(Some(ImageHandoff::new(bytes, "image/jpeg")), EditorConfig::default())
//!         .unwrap();
//!
//! let session = editor.session_mut().unwrap();
//! session.set_adjustment(Adjustment::Brightness, 120.0);
//! session.rotate(RotationStep::Clockwise90);
//!
//! // what the host shows while editing
//! let style = session.preview();
//! println!("filter: {}", style.filter);
//!
//! // full-resolution output
//! let exported = editor.export().unwrap().unwrap();
//! std::fs::write(&exported.file_name, &exported.bytes).unwrap();
//! ```
//!
//! # Serializable Profiles
//!
//! For host handoff, use [`EditProfile`] with the [`Configurable`] trait:
//!
//! ```no_run
//! use photo_flatten::{Configurable, EditProfile, EditSession, EditorConfig, ImageHandoff};
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let mut session =
//!     EditSession::open(ImageHandoff::new(bytes, "image/png"), EditorConfig::default()).unwrap();
//!
//! let profile = EditProfile::from_json(r#"{"adjustments": {"sepia": 40}}"#).unwrap();
//! session.apply_profile(&profile);
//!
//! let json = session.export_profile().to_json().unwrap();
//! ```

mod adjust;
mod annotation;
pub mod codec;
mod compositor;
mod config;
mod error;
mod geometry;
mod preview;
mod profile;
mod session;
pub mod stage;
mod surface;

pub use adjust::{Adjustment, AdjustmentSet, Effect, FilterPreset};
pub use annotation::{
    AnnotationLayer, Brush, DrawState, StrokeOverlay, TextAnnotation, TextId, Tool,
};
pub use compositor::{Compositor, ExportedImage, FlattenRequest};
pub use config::{EditorConfig, ExportFilters};
pub use error::{EditorError, EditorResult};
pub use geometry::{CropMode, CropRect, Geometry, Orientation, RotationStep, normalize_rotation};
pub use preview::{PreviewStyle, preview};
pub use profile::{Configurable, EditProfile};
pub use session::{
    DEFAULT_FONT_SIZE, DEFAULT_TEXT, EditSession, Editor, ImageHandoff, PointerOutcome,
};
pub use surface::{Color, DisplayScale, DisplaySize, Point, RectPx, SizePx};
