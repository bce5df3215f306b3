//! Population footprints and boundary intersection

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::POINT_EPSILON;

/// Outline drawn for a population in the 2D diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FootprintShape {
    #[default]
    Rectangle,
    Ellipse,
}

/// Visual footprint of a population in diagram space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationBounds {
    pub center: Vec2,
    pub half_extents: Vec2,
    pub shape: FootprintShape,
}

impl PopulationBounds {
    pub fn new(center: Vec2, size: Vec2, shape: FootprintShape) -> Self {
        Self {
            center,
            half_extents: size * 0.5,
            shape,
        }
    }

    /// Point used when the ray direction is undefined: top edge midpoint
    pub fn default_edge_point(&self) -> Vec2 {
        self.center + Vec2::new(0.0, self.half_extents.y.max(0.0))
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let d = point - self.center;
        let h = self.half_extents;
        if h.x <= 0.0 || h.y <= 0.0 {
            return false;
        }
        match self.shape {
            FootprintShape::Rectangle => d.x.abs() <= h.x && d.y.abs() <= h.y,
            FootprintShape::Ellipse => (d.x / h.x).powi(2) + (d.y / h.y).powi(2) <= 1.0,
        }
    }
}

/// Where the ray from the population center toward `toward` leaves the footprint.
///
/// Degenerate inputs never produce NaN: a target on the center (or a
/// non-finite target) yields [`PopulationBounds::default_edge_point`], and a
/// footprint with no area yields its center.
pub fn find_box_edge(bounds: &PopulationBounds, toward: Vec2) -> Vec2 {
    let h = bounds.half_extents;
    if !(h.x > 0.0 && h.y > 0.0) {
        return bounds.center;
    }

    let d = toward - bounds.center;
    if !d.is_finite() || d.length_squared() <= POINT_EPSILON * POINT_EPSILON {
        return bounds.default_edge_point();
    }

    let scale = match bounds.shape {
        FootprintShape::Rectangle => {
            let sx = if d.x.abs() > POINT_EPSILON {
                h.x / d.x.abs()
            } else {
                f32::INFINITY
            };
            let sy = if d.y.abs() > POINT_EPSILON {
                h.y / d.y.abs()
            } else {
                f32::INFINITY
            };
            sx.min(sy)
        }
        FootprintShape::Ellipse => {
            1.0 / ((d.x / h.x).powi(2) + (d.y / h.y).powi(2)).sqrt()
        }
    };

    bounds.center + d * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rect() -> PopulationBounds {
        PopulationBounds::new(Vec2::new(2.0, 3.0), Vec2::new(1.0, 0.6), FootprintShape::Rectangle)
    }

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-4, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_rectangle_axis_hits() {
        let b = rect();
        assert_close(find_box_edge(&b, Vec2::new(100.0, 3.0)), Vec2::new(2.5, 3.0));
        assert_close(find_box_edge(&b, Vec2::new(2.0, -50.0)), Vec2::new(2.0, 2.7));
    }

    #[test]
    fn test_rectangle_diagonal_hits_shorter_side() {
        let b = rect();
        // direction (1, 1): the top edge is reached first
        let p = find_box_edge(&b, Vec2::new(1e6, 1e6));
        assert_close(p, Vec2::new(2.3, 3.3));
    }

    #[test]
    fn test_ellipse_hit() {
        let b = PopulationBounds::new(Vec2::ZERO, Vec2::new(4.0, 2.0), FootprintShape::Ellipse);
        assert_close(find_box_edge(&b, Vec2::new(10.0, 0.0)), Vec2::new(2.0, 0.0));
        assert_close(find_box_edge(&b, Vec2::new(0.0, 10.0)), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_target_on_center_is_deterministic() {
        let b = rect();
        let p = find_box_edge(&b, b.center);
        assert!(p.is_finite());
        assert_close(p, Vec2::new(2.0, 3.3));
        assert_eq!(p, find_box_edge(&b, b.center));
    }

    #[test]
    fn test_degenerate_footprint_returns_center() {
        let b = PopulationBounds::new(Vec2::ONE, Vec2::ZERO, FootprintShape::Rectangle);
        assert_eq!(find_box_edge(&b, Vec2::new(5.0, 5.0)), Vec2::ONE);
    }

    #[test]
    fn test_non_finite_target() {
        let b = rect();
        let p = find_box_edge(&b, Vec2::new(f32::NAN, 1.0));
        assert_close(p, b.default_edge_point());
    }

    proptest! {
        #[test]
        fn prop_edge_point_lies_on_boundary(x in -100.0f32..100.0, y in -100.0f32..100.0, ellipse in any::<bool>()) {
            let shape = if ellipse { FootprintShape::Ellipse } else { FootprintShape::Rectangle };
            let b = PopulationBounds::new(Vec2::new(2.0, 3.0), Vec2::new(1.0, 0.6), shape);
            let p = find_box_edge(&b, Vec2::new(x, y));
            prop_assert!(p.is_finite());
            let d = p - b.center;
            let h = b.half_extents;
            let on_boundary = match shape {
                FootprintShape::Rectangle => {
                    ((d.x.abs() - h.x).abs() < 1e-3 && d.y.abs() <= h.y + 1e-3)
                        || ((d.y.abs() - h.y).abs() < 1e-3 && d.x.abs() <= h.x + 1e-3)
                }
                FootprintShape::Ellipse => {
                    ((d.x / h.x).powi(2) + (d.y / h.y).powi(2) - 1.0).abs() < 1e-3
                }
            };
            prop_assert!(on_boundary, "{:?} not on boundary", p);
        }
    }
}
