//! 3D scene of the visualised network
//!
//! - [`camera`] - view and projection matrices driven by mouse input
//! - [`lod`] - glyph level of detail
//! - [`style`] - link colours, widths and highlight tiers
//! - [`batch`] - per-entity draw batches and their cache
//! - [`picking`] - colour-coded neuron picking
//! - [`renderer`] - frame construction and repaint limiting
//! - [`export`] - writing a frame out as an image
//!
//! The scene only reads the model and the controller's working set.
//! Painting the resulting [`Frame`] is the UI's job.

pub mod batch;
pub mod camera;
pub mod export;
pub mod lod;
pub mod picking;
pub mod renderer;
pub mod style;

pub use batch::{BatchCache, BatchStamp, ConnectionBatch, Glyph, Polyline, PopulationBatch};
pub use camera::{Camera, DragButton, ViewMode, Viewport, SCENE_OFFSET};
pub use export::{export_svg, frame_to_svg};
pub use lod::{glyph_outline, level_of_detail};
pub use picking::{decode_pick, encode_pick, PickBuffer, PickIndex};
pub use renderer::{
    ConnectionDraw, Frame, FrameStats, PickHit, PopulationDraw, RenderState, RepaintLimiter, SceneRenderer, SceneView,
};
pub use style::{classify_link, HighlightTier, LinkColumn, LinkStyle, SelectedCell, TableSelection};
