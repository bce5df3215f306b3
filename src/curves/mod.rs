//! Edge geometry for projections and generic inputs
//!
//! Edges in the 2D diagram are [`EdgePath`]s: a start point plus chained
//! cubic segments. This module owns the editing operations on them:
//!
//! - [`add_curves`] - initial geometry for a new edge, including the
//!   self-connection and "back into my own projection" special cases
//! - [`move_selected_control_point`] - interactive drag of one point
//! - [`animate`] - follow an endpoint that is being dragged
//! - [`select_control_point`] - hit test against the control points
//!
//! Endpoints are described by an [`Anchor`] so none of these functions
//! need access to the model.

pub mod metadata;
pub mod path;

pub use metadata::{EdgeMetaRecord, MetaCurve, MetaDocument, MetaPoint};
pub use path::{ControlPoint, EdgePath, SAMPLES_PER_SEGMENT};

use glam::Vec2;

use crate::geometry::{find_box_edge, BezierCurve, Handle, PopulationBounds};
use crate::model::EntityId;

/// Length of the initial control handles of looped edges
const LOOP_HANDLE_LENGTH: f32 = 1.6;
/// Length of the ray used to snap a dragged endpoint onto a footprint
const SNAP_RAY_LENGTH: f32 = 1000.0;
/// Far-away target used to pick the top and top-right edge of a footprint
const FAR: f32 = 1.0e6;

/// One end of an edge as the curve code sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// A population footprint; the edge attaches to its boundary
    Population { id: EntityId, bounds: PopulationBounds },
    /// A projection; the edge attaches to `location` on its path
    Projection {
        id: EntityId,
        location: Vec2,
        /// Destination population of the projection
        destination: EntityId,
        /// Second control point of the projection's last segment
        tail_c2: Vec2,
    },
}

impl Anchor {
    pub fn id(&self) -> EntityId {
        match self {
            Anchor::Population { id, .. } | Anchor::Projection { id, .. } => *id,
        }
    }

    pub fn location(&self) -> Vec2 {
        match self {
            Anchor::Population { bounds, .. } => bounds.center,
            Anchor::Projection { location, .. } => *location,
        }
    }

    pub fn bounds(&self) -> Option<&PopulationBounds> {
        match self {
            Anchor::Population { bounds, .. } => Some(bounds),
            Anchor::Projection { .. } => None,
        }
    }

    pub fn is_population(&self) -> bool {
        matches!(self, Anchor::Population { .. })
    }
}

/// Initial geometry for an edge from `src` to `dst`.
///
/// The default is a single segment between the two locations with both
/// control points at the midpoint, clipped to population footprints.
pub fn add_curves(src: &Anchor, dst: &Anchor) -> EdgePath {
    if src.id() == dst.id() {
        return self_connection(src);
    }

    let mut start = src.location();
    let mut end = dst.location();
    let mid = (start + end) * 0.5;
    let mut c1 = mid;
    let mut c2 = mid;

    match (src, dst) {
        // input from a population into a projection that targets it
        (Anchor::Population { id, bounds }, Anchor::Projection { destination, .. })
            if destination == id =>
        {
            let handle = Handle::new(bounds.center, dst.location()).with_length(LOOP_HANDLE_LENGTH);
            c2 = handle.tip;
            let turned = handle.rotated(30.0);
            c1 = turned.tip;
            start = find_box_edge(bounds, turned.tip);
        }
        (Anchor::Population { bounds, .. }, _) => {
            start = find_box_edge(bounds, end);
        }
        _ => {}
    }
    if let Some(bounds) = dst.bounds() {
        end = find_box_edge(bounds, src.location());
    }

    EdgePath {
        start,
        curves: vec![BezierCurve::new(c1, c2, end)],
    }
}

fn self_connection(anchor: &Anchor) -> EdgePath {
    match anchor {
        Anchor::Population { bounds, .. } => {
            let center = bounds.center;
            let end = find_box_edge(bounds, Vec2::new(center.x, FAR));
            let start = find_box_edge(bounds, Vec2::new(FAR, FAR));
            EdgePath {
                start,
                curves: vec![BezierCurve::new(
                    center + Vec2::new(1.0, 1.0),
                    center + Vec2::new(0.0, 1.4),
                    end,
                )],
            }
        }
        Anchor::Projection { location, tail_c2, .. } => {
            let handle = Handle::new(*location, *tail_c2)
                .with_length(LOOP_HANDLE_LENGTH)
                .rotated(20.0);
            let c2 = handle.tip;
            let c1 = handle.rotated(70.0).tip;
            EdgePath {
                start: *location,
                curves: vec![BezierCurve::new(c1, c2, *location)],
            }
        }
    }
}

/// Snap a dragged endpoint onto a population boundary and swing the
/// adjacent control handle to the same angle.
fn snap_to_boundary(bounds: &PopulationBounds, cursor: Vec2, handle_tip: Vec2) -> (Vec2, Vec2) {
    let ray = Handle::new(bounds.center, cursor).with_length(SNAP_RAY_LENGTH);
    let edge = find_box_edge(bounds, ray.tip);
    let mut handle = Handle::new(bounds.center, handle_tip);
    handle.set_angle(ray.angle());
    (edge, handle.tip)
}

/// Drag control point `cp` of `path` to `cursor`.
///
/// Endpoints attached to a projection do not move. Endpoints attached to
/// a population slide along its boundary. An interior joint carries both
/// neighbouring control points with it.
pub fn move_selected_control_point(
    path: &mut EdgePath,
    cp: ControlPoint,
    cursor: Vec2,
    src: &Anchor,
    dst: &Anchor,
) {
    let last = path.curves.len().saturating_sub(1);
    match cp {
        ControlPoint::Start => {
            let Some(bounds) = src.bounds() else {
                return;
            };
            let Some(first) = path.curves.first_mut() else {
                return;
            };
            let (edge, c1) = snap_to_boundary(bounds, cursor, first.c1);
            first.c1 = c1;
            path.start = edge;
        }
        ControlPoint::End(i) if i == last => {
            let Some(bounds) = dst.bounds() else {
                return;
            };
            let Some(tail) = path.curves.last_mut() else {
                return;
            };
            let (edge, c2) = snap_to_boundary(bounds, cursor, tail.c2);
            tail.c2 = c2;
            tail.end = edge;
        }
        ControlPoint::C1(i) => {
            if let Some(c) = path.curves.get_mut(i) {
                c.c1 = cursor;
            }
        }
        ControlPoint::C2(i) => {
            if let Some(c) = path.curves.get_mut(i) {
                c.c2 = cursor;
            }
        }
        ControlPoint::End(i) => {
            if i + 1 >= path.curves.len() {
                return;
            }
            let end = path.curves[i].end;
            let next_c1 = path.curves[i + 1].c1;
            path.curves[i + 1].c1 = cursor - (end - next_c1);
            let c2 = path.curves[i].c2;
            path.curves[i].c2 = cursor - (end - c2);
            path.curves[i].end = cursor;
        }
    }
}

/// Follow endpoint `moving` by `delta`.
///
/// A self-connection receives this call once for each end, so each call
/// moves it by half of `delta`.
pub fn animate(path: &mut EdgePath, moving: EntityId, src: EntityId, dst: EntityId, delta: Vec2) {
    if path.curves.is_empty() {
        return;
    }
    let delta = if src == dst { delta * 0.5 } else { delta };
    if moving == src {
        path.start += delta;
        if let Some(first) = path.curves.first_mut() {
            first.c1 += delta;
        }
    }
    if moving == dst {
        if let Some(last) = path.curves.last_mut() {
            last.end += delta;
            last.c2 += delta;
        }
    }
}

/// Control point nearest to `cursor` within `tolerance`.
///
/// Joints win ties against control points so that a handle lying on top
/// of its joint does not hide it.
pub fn select_control_point(path: &EdgePath, cursor: Vec2, tolerance: f32) -> Option<ControlPoint> {
    let mut best: Option<(ControlPoint, f32)> = None;
    for (cp, point) in path.control_points() {
        let d = point.distance(cursor);
        if d > tolerance {
            continue;
        }
        let is_joint = matches!(cp, ControlPoint::Start | ControlPoint::End(_));
        let better = match best {
            None => true,
            Some((_, best_d)) => d < best_d || (is_joint && d <= best_d),
        };
        if better {
            best = Some((cp, d));
        }
    }
    best.map(|(cp, _)| cp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FootprintShape;
    use proptest::prelude::*;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-3, "{:?} != {:?}", a, b);
    }

    fn pop(i: u32, center: Vec2) -> Anchor {
        Anchor::Population {
            id: EntityId::new(i, 0),
            bounds: PopulationBounds::new(center, Vec2::new(2.0, 1.0), FootprintShape::Rectangle),
        }
    }

    #[test]
    fn test_add_curves_between_populations() {
        let a = pop(0, Vec2::ZERO);
        let b = pop(1, Vec2::new(10.0, 0.0));
        let path = add_curves(&a, &b);
        assert_close(path.start, Vec2::new(1.0, 0.0));
        assert_close(path.end(), Vec2::new(9.0, 0.0));
        assert_close(path.curves[0].c1, Vec2::new(5.0, 0.0));
        assert_close(path.curves[0].c2, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_add_curves_population_self_loop() {
        let a = pop(0, Vec2::new(2.0, 3.0));
        let path = add_curves(&a, &a);
        assert_close(path.end(), Vec2::new(2.0, 3.5));
        // toward the top-right: the top edge is hit first for a 2x1 box
        assert_close(path.start, Vec2::new(2.5, 3.5));
        assert_close(path.curves[0].c1, Vec2::new(3.0, 4.0));
        assert_close(path.curves[0].c2, Vec2::new(2.0, 4.4));
    }

    #[test]
    fn test_add_curves_into_own_projection() {
        let a = pop(0, Vec2::ZERO);
        let proj = Anchor::Projection {
            id: EntityId::new(5, 0),
            location: Vec2::new(10.0, 0.0),
            destination: a.id(),
            tail_c2: Vec2::new(8.0, 0.0),
        };
        let path = add_curves(&a, &proj);
        assert_close(path.curves[0].c2, Vec2::new(1.6, 0.0));
        let rotated = Handle::new(Vec2::ZERO, Vec2::new(1.6, 0.0)).rotated(30.0).tip;
        assert_close(path.curves[0].c1, rotated);
        assert_close(path.end(), Vec2::new(10.0, 0.0));
        let bounds = a.bounds().copied().expect("population");
        assert_close(path.start, find_box_edge(&bounds, rotated));
    }

    #[test]
    fn test_add_curves_projection_self_loop() {
        let proj = Anchor::Projection {
            id: EntityId::new(5, 0),
            location: Vec2::ZERO,
            destination: EntityId::new(1, 0),
            tail_c2: Vec2::new(3.0, 0.0),
        };
        let path = add_curves(&proj, &proj);
        assert_eq!(path.start, Vec2::ZERO);
        assert_eq!(path.end(), Vec2::ZERO);
        let c2 = path.curves[0].c2;
        let c1 = path.curves[0].c1;
        assert!((c2.length() - 1.6).abs() < 1e-4);
        assert!((Handle::new(Vec2::ZERO, c2).angle() - 20.0).abs() < 1e-3);
        assert!((Handle::new(Vec2::ZERO, c1).angle() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_move_start_snaps_to_boundary() {
        let a = pop(0, Vec2::ZERO);
        let b = pop(1, Vec2::new(10.0, 0.0));
        let mut path = add_curves(&a, &b);
        move_selected_control_point(&mut path, ControlPoint::Start, Vec2::new(0.0, 5.0), &a, &b);
        assert_close(path.start, Vec2::new(0.0, 0.5));
        // handle swung to point straight up, length kept at 5
        assert_close(path.curves[0].c1, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_move_end_on_projection_is_ignored() {
        let a = pop(0, Vec2::ZERO);
        let proj = Anchor::Projection {
            id: EntityId::new(5, 0),
            location: Vec2::new(10.0, 0.0),
            destination: EntityId::new(1, 0),
            tail_c2: Vec2::ZERO,
        };
        let mut path = add_curves(&a, &proj);
        let before = path.clone();
        move_selected_control_point(&mut path, ControlPoint::End(0), Vec2::new(3.0, 3.0), &a, &proj);
        assert_eq!(path, before);
        move_selected_control_point(&mut path, ControlPoint::Start, Vec2::new(3.0, 3.0), &proj, &a);
        assert_eq!(path, before);
    }

    #[test]
    fn test_move_interior_joint_carries_handles() {
        let a = pop(0, Vec2::ZERO);
        let b = pop(1, Vec2::new(10.0, 0.0));
        let mut path = add_curves(&a, &b);
        path.split_segment(0, 0.5);
        let joint = path.curves[0].end;
        let c2_offset = path.curves[0].c2 - joint;
        let c1_offset = path.curves[1].c1 - joint;

        let cursor = joint + Vec2::new(0.0, 2.0);
        move_selected_control_point(&mut path, ControlPoint::End(0), cursor, &a, &b);
        assert_close(path.curves[0].end, cursor);
        assert_close(path.curves[0].c2 - cursor, c2_offset);
        assert_close(path.curves[1].c1 - cursor, c1_offset);
    }

    #[test]
    fn test_animate_moves_attached_ends() {
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        let mut path = EdgePath::straight(Vec2::ZERO, Vec2::new(4.0, 0.0));
        animate(&mut path, a, a, b, Vec2::new(0.0, 1.0));
        assert_eq!(path.start, Vec2::new(0.0, 1.0));
        assert_eq!(path.curves[0].c1, Vec2::new(2.0, 1.0));
        assert_eq!(path.curves[0].c2, Vec2::new(2.0, 0.0));
        assert_eq!(path.end(), Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_animate_self_connection_moves_half_per_call() {
        let a = EntityId::new(0, 0);
        let mut path = EdgePath::straight(Vec2::ZERO, Vec2::new(1.0, 0.0));
        let delta = Vec2::new(2.0, 0.0);
        animate(&mut path, a, a, a, delta);
        assert_eq!(path.start, Vec2::new(1.0, 0.0));
        animate(&mut path, a, a, a, delta);
        assert_eq!(path.start, Vec2::new(2.0, 0.0));
        assert_eq!(path.end(), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_select_control_point_prefers_joints() {
        let path = EdgePath {
            start: Vec2::ZERO,
            curves: vec![BezierCurve::new(Vec2::ZERO, Vec2::new(2.0, 2.0), Vec2::new(4.0, 0.0))],
        };
        assert_eq!(
            select_control_point(&path, Vec2::new(0.05, 0.0), 0.2),
            Some(ControlPoint::Start)
        );
        assert_eq!(
            select_control_point(&path, Vec2::new(2.1, 2.0), 0.2),
            Some(ControlPoint::C2(0))
        );
        assert_eq!(select_control_point(&path, Vec2::new(9.0, 9.0), 0.2), None);
    }

    proptest! {
        #[test]
        fn prop_joint_drag_keeps_handle_offsets(
            t in 0.1f32..0.9,
            dx in -5.0f32..5.0,
            dy in -5.0f32..5.0,
        ) {
            let a = pop(0, Vec2::ZERO);
            let b = pop(1, Vec2::new(10.0, 4.0));
            let mut path = add_curves(&a, &b);
            path.split_segment(0, t);
            let before = path.clone();
            let cursor = before.curves[0].end + Vec2::new(dx, dy);
            move_selected_control_point(&mut path, ControlPoint::End(0), cursor, &a, &b);

            let delta = cursor - before.curves[0].end;
            prop_assert!((path.curves[0].c2 - (before.curves[0].c2 + delta)).length() < 1e-3);
            prop_assert!((path.curves[1].c1 - (before.curves[1].c1 + delta)).length() < 1e-3);
            prop_assert_eq!(path.start, before.start);
            prop_assert_eq!(path.end(), before.end());
        }
    }
}
