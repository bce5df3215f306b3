//! Multi-segment edge paths

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::{evaluate_cubic, BezierCurve, CubicBezier, POINT_EPSILON};

/// Samples per segment when flattening a path for drawing or hit testing
pub const SAMPLES_PER_SEGMENT: usize = 24;

/// Addressable point on an [`EdgePath`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPoint {
    Start,
    C1(usize),
    C2(usize),
    End(usize),
}

/// A start point followed by cubic segments.
///
/// Segment `i` starts at the end of segment `i - 1`, the first segment
/// starts at [`EdgePath::start`]. A path always has at least one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePath {
    pub start: Vec2,
    pub curves: Vec<BezierCurve>,
}

impl EdgePath {
    /// Single straight-looking segment with both control points at the midpoint
    pub fn straight(start: Vec2, end: Vec2) -> Self {
        let mid = (start + end) * 0.5;
        Self {
            start,
            curves: vec![BezierCurve::new(mid, mid, end)],
        }
    }

    pub fn end(&self) -> Vec2 {
        self.curves.last().map(|c| c.end).unwrap_or(self.start)
    }

    pub fn segment_start(&self, index: usize) -> Vec2 {
        if index == 0 {
            self.start
        } else {
            self.curves.get(index - 1).map(|c| c.end).unwrap_or(self.start)
        }
    }

    /// Evaluable cubic for segment `index`
    pub fn segment(&self, index: usize) -> Option<CubicBezier> {
        self.curves
            .get(index)
            .map(|c| c.with_start(self.segment_start(index)))
    }

    pub fn segments(&self) -> impl Iterator<Item = CubicBezier> + '_ {
        (0..self.curves.len()).filter_map(move |i| self.segment(i))
    }

    /// Second control point of the last segment
    pub fn last_c2(&self) -> Vec2 {
        self.curves.last().map(|c| c.c2).unwrap_or(self.start)
    }

    /// Flatten into a polyline, shared joints emitted once
    pub fn sample(&self, per_segment: usize) -> Vec<Vec2> {
        let mut points = vec![self.start];
        for seg in self.segments() {
            points.extend(seg.sample(per_segment).into_iter().skip(1));
        }
        points
    }

    /// Point halfway along the segment list in parameter space
    pub fn midpoint(&self) -> Vec2 {
        let n = self.curves.len();
        if n == 0 {
            return self.start;
        }
        let t = n as f32 * 0.5;
        let index = (t.floor() as usize).min(n - 1);
        match self.segment(index) {
            Some(seg) => evaluate_cubic(&seg, t - index as f32),
            None => self.start,
        }
    }

    pub fn control_point(&self, cp: ControlPoint) -> Option<Vec2> {
        match cp {
            ControlPoint::Start => Some(self.start),
            ControlPoint::C1(i) => self.curves.get(i).map(|c| c.c1),
            ControlPoint::C2(i) => self.curves.get(i).map(|c| c.c2),
            ControlPoint::End(i) => self.curves.get(i).map(|c| c.end),
        }
    }

    /// Every control point in drawing order
    pub fn control_points(&self) -> Vec<(ControlPoint, Vec2)> {
        let mut out = vec![(ControlPoint::Start, self.start)];
        for (i, c) in self.curves.iter().enumerate() {
            out.push((ControlPoint::C1(i), c.c1));
            out.push((ControlPoint::C2(i), c.c2));
            out.push((ControlPoint::End(i), c.end));
        }
        out
    }

    /// Split segment `index` at `t`, inserting a joint.
    ///
    /// The path traces the same shape afterwards.
    pub fn split_segment(&mut self, index: usize, t: f32) -> bool {
        let Some(seg) = self.segment(index) else {
            return false;
        };
        let (a, b) = seg.split(t);
        self.curves[index] = a.to_segment();
        self.curves.insert(index + 1, b.to_segment());
        true
    }

    /// Merge the joint at the end of segment `index` with the next segment
    pub fn remove_joint(&mut self, index: usize) -> bool {
        if index + 1 >= self.curves.len() {
            return false;
        }
        let next = self.curves.remove(index + 1);
        let seg = &mut self.curves[index];
        seg.c2 = next.c2;
        seg.end = next.end;
        true
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        for c in &mut self.curves {
            c.translate(delta);
        }
    }

    /// Arrow head triangle at the path end: `[tip, left, right]`.
    ///
    /// The direction comes from the last sampled stretch of the path, so a
    /// control point sitting on the end does not break it. `None` when the
    /// whole path is a single point.
    pub fn arrow_head(&self, size: f32) -> Option<[Vec2; 3]> {
        let points = self.sample(SAMPLES_PER_SEGMENT);
        let tip = *points.last()?;
        let back = points
            .iter()
            .rev()
            .find(|p| (tip - **p).length() > POINT_EPSILON)?;
        let dir = (tip - *back).normalize();
        let normal = dir.perp();
        let base = tip - dir * size;
        Some([tip, base + normal * size * 0.5, base - normal * size * 0.5])
    }

    /// Shortest distance from `point` to the flattened path
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let points = self.sample(SAMPLES_PER_SEGMENT);
        points
            .windows(2)
            .map(|w| distance_to_segment(point, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= POINT_EPSILON * POINT_EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_segment_path() -> EdgePath {
        EdgePath {
            start: Vec2::ZERO,
            curves: vec![
                BezierCurve::new(Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)),
                BezierCurve::new(Vec2::new(1.0, -1.0), Vec2::new(2.0, -1.0), Vec2::new(2.0, 0.0)),
            ],
        }
    }

    #[test]
    fn test_straight_path() {
        let p = EdgePath::straight(Vec2::ZERO, Vec2::new(4.0, 0.0));
        assert_eq!(p.curves.len(), 1);
        assert_eq!(p.curves[0].c1, Vec2::new(2.0, 0.0));
        assert_eq!(p.end(), Vec2::new(4.0, 0.0));
        assert!((p.midpoint() - Vec2::new(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_segments_chain() {
        let p = two_segment_path();
        let s1 = p.segment(1).expect("second segment");
        assert_eq!(s1.p0, Vec2::new(1.0, 0.0));
        assert!(p.segment(2).is_none());
        assert_eq!(p.last_c2(), Vec2::new(2.0, -1.0));
    }

    #[test]
    fn test_sample_has_no_duplicate_joints() {
        let p = two_segment_path();
        let pts = p.sample(10);
        assert_eq!(pts.len(), 21);
        assert_eq!(pts[10], Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_midpoint_of_two_segments_is_joint() {
        let p = two_segment_path();
        assert!((p.midpoint() - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_split_and_remove_joint() {
        let mut p = EdgePath::straight(Vec2::ZERO, Vec2::new(4.0, 0.0));
        let before = p.sample(8);
        assert!(p.split_segment(0, 0.5));
        assert_eq!(p.curves.len(), 2);
        assert!((p.curves[0].end - Vec2::new(2.0, 0.0)).length() < 1e-5);
        assert!(p.distance_to(before[3]) < 1e-3);
        assert!(!p.split_segment(5, 0.5));

        assert!(p.remove_joint(0));
        assert_eq!(p.curves.len(), 1);
        assert!(!p.remove_joint(0));
    }

    #[test]
    fn test_arrow_head_points_along_path() {
        let p = EdgePath::straight(Vec2::ZERO, Vec2::new(4.0, 0.0));
        let [tip, left, right] = p.arrow_head(1.0).expect("arrow");
        assert_eq!(tip, Vec2::new(4.0, 0.0));
        assert!((left.x - 3.0).abs() < 1e-4 && (right.x - 3.0).abs() < 1e-4);
        assert!((left.y + right.y).abs() < 1e-4);

        let point = EdgePath::straight(Vec2::ONE, Vec2::ONE);
        assert!(point.arrow_head(1.0).is_none());
    }

    #[test]
    fn test_control_points_order() {
        let p = two_segment_path();
        let cps = p.control_points();
        assert_eq!(cps.len(), 7);
        assert_eq!(cps[0].0, ControlPoint::Start);
        assert_eq!(cps[6], (ControlPoint::End(1), Vec2::new(2.0, 0.0)));
        assert_eq!(p.control_point(ControlPoint::C2(0)), Some(Vec2::new(1.0, 1.0)));
        assert_eq!(p.control_point(ControlPoint::C1(4)), None);
    }
}
