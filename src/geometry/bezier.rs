//! Bezier segments and evaluation
//!
//! An edge is drawn as a chain of cubic segments. Each [`BezierCurve`]
//! stores its two control points and its end point; its start is the end
//! of the previous segment (or the path start for the first segment).

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// One cubic segment of an edge path, start point implicit
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BezierCurve {
    pub c1: Vec2,
    pub c2: Vec2,
    pub end: Vec2,
}

impl BezierCurve {
    pub fn new(c1: Vec2, c2: Vec2, end: Vec2) -> Self {
        Self { c1, c2, end }
    }

    /// Attach an explicit start point to get an evaluable cubic
    pub fn with_start(&self, start: Vec2) -> CubicBezier {
        CubicBezier {
            p0: start,
            p1: self.c1,
            p2: self.c2,
            p3: self.end,
        }
    }

    /// Translate every point of the segment
    pub fn translate(&mut self, delta: Vec2) {
        self.c1 += delta;
        self.c2 += delta;
        self.end += delta;
    }
}

/// A fully specified cubic Bezier curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Split at `t` with de Casteljau, both halves trace the same shape
    pub fn split(&self, t: f32) -> (CubicBezier, CubicBezier) {
        let t = t.clamp(0.0, 1.0);
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);
        (
            CubicBezier::new(self.p0, p01, p012, mid),
            CubicBezier::new(mid, p123, p23, self.p3),
        )
    }

    /// Evenly spaced samples in parameter space, both ends included
    pub fn sample(&self, segments: usize) -> Vec<Vec2> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| evaluate_cubic(self, i as f32 / segments as f32))
            .collect()
    }

    /// Drop the implicit start again
    pub fn to_segment(&self) -> BezierCurve {
        BezierCurve::new(self.p1, self.p2, self.p3)
    }
}

/// Evaluate a cubic Bezier at `t`, clamped to `[0, 1]`
pub fn evaluate_cubic(curve: &CubicBezier, t: f32) -> Vec2 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    let b0 = u * u * u;
    let b1 = 3.0 * u * u * t;
    let b2 = 3.0 * u * t * t;
    let b3 = t * t * t;
    curve.p0 * b0 + curve.p1 * b1 + curve.p2 * b2 + curve.p3 * b3
}

/// Evaluate a Bezier curve of any degree with de Casteljau.
///
/// Used for 3D connection links that bend through repeated auxiliary
/// control points. Returns `None` for an empty control polygon.
pub fn evaluate_bezier(points: &[Vec3], t: f32) -> Option<Vec3> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return Some(*first);
    }
    let t = t.clamp(0.0, 1.0);
    let mut work = points.to_vec();
    for level in (1..work.len()).rev() {
        for i in 0..level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
    }
    Some(work[0])
}

/// Sample a general Bezier curve into a polyline of `segments + 1` points
pub fn sample_bezier(points: &[Vec3], segments: usize) -> Vec<Vec3> {
    let segments = segments.max(1);
    (0..=segments)
        .filter_map(|i| evaluate_bezier(points, i as f32 / segments as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-4, "{:?} != {:?}", a, b);
    }

    fn sample_curve() -> CubicBezier {
        CubicBezier::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(3.0, 2.0),
            Vec2::new(4.0, 0.0),
        )
    }

    #[test]
    fn test_evaluate_cubic_endpoints() {
        let c = sample_curve();
        assert_close(evaluate_cubic(&c, 0.0), c.p0);
        assert_close(evaluate_cubic(&c, 1.0), c.p3);
        // symmetric curve peaks in the middle
        assert_close(evaluate_cubic(&c, 0.5), Vec2::new(2.0, 1.5));
    }

    #[test]
    fn test_evaluate_cubic_clamps_parameter() {
        let c = sample_curve();
        assert_close(evaluate_cubic(&c, -1.0), c.p0);
        assert_close(evaluate_cubic(&c, 7.0), c.p3);
    }

    #[test]
    fn test_split_preserves_shape() {
        let c = sample_curve();
        let (a, b) = c.split(0.5);
        assert_close(a.p3, b.p0);
        assert_close(a.p3, evaluate_cubic(&c, 0.5));
        assert_close(evaluate_cubic(&a, 0.5), evaluate_cubic(&c, 0.25));
        assert_close(evaluate_cubic(&b, 0.5), evaluate_cubic(&c, 0.75));
    }

    #[test]
    fn test_segment_roundtrip() {
        let seg = BezierCurve::new(Vec2::X, Vec2::Y, Vec2::ONE);
        let cubic = seg.with_start(Vec2::ZERO);
        assert_eq!(cubic.to_segment(), seg);
    }

    #[test]
    fn test_evaluate_bezier_degenerate_inputs() {
        assert!(evaluate_bezier(&[], 0.5).is_none());
        let single = [Vec3::new(1.0, 2.0, 3.0)];
        assert_eq!(evaluate_bezier(&single, 0.3), Some(single[0]));
    }

    #[test]
    fn test_evaluate_bezier_through_repeated_center() {
        let center = Vec3::new(0.0, 5.0, 0.0);
        let pts = [Vec3::ZERO, center, center, Vec3::new(10.0, 0.0, 0.0)];
        let mid = evaluate_bezier(&pts, 0.5).unwrap_or(Vec3::ZERO);
        // only the end point pulls on x, with weight t^3
        assert!((mid.x - 1.25).abs() < 1e-4);
        assert!((mid.y - 3.75).abs() < 1e-4);

        let line = sample_bezier(&pts, 30);
        assert_eq!(line.len(), 31);
        assert_eq!(line[0], Vec3::ZERO);
    }

    proptest! {
        #[test]
        fn prop_cubic_matches_general(t in 0.0f32..=1.0) {
            let c = sample_curve();
            let general = [
                c.p0.extend(0.0),
                c.p1.extend(0.0),
                c.p2.extend(0.0),
                c.p3.extend(0.0),
            ];
            let a = evaluate_cubic(&c, t);
            let b = evaluate_bezier(&general, t).unwrap_or(Vec3::NAN);
            prop_assert!((a - b.truncate()).length() < 1e-3);
        }
    }
}
