//! Geometry primitives shared by every edge and scene batch
//!
//! - [`bezier`] - cubic segments, general-degree evaluation, splitting
//! - [`box_edge`] - population footprints and ray/boundary intersection
//! - [`handle`] - a directed control handle with angle semantics
//!
//! All functions here are pure. 2D diagram space is y-up; angles are in
//! degrees and measured clockwise from +x.

pub mod bezier;
pub mod box_edge;
pub mod handle;

pub use bezier::{evaluate_bezier, evaluate_cubic, BezierCurve, CubicBezier};
pub use box_edge::{find_box_edge, FootprintShape, PopulationBounds};
pub use handle::Handle;

pub use glam::{Vec2, Vec3};

/// Tolerance for treating two diagram points as coincident
pub const POINT_EPSILON: f32 = 1e-6;
