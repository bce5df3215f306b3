//! Directed control handles
//!
//! A [`Handle`] is a segment with a fixed origin that can be re-angled or
//! re-lengthened about that origin. Edge special cases are described in
//! terms of handles ("a 1.6 unit handle rotated 30 degrees").

use glam::Vec2;

use super::POINT_EPSILON;

/// A segment from `origin` to `tip`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub origin: Vec2,
    pub tip: Vec2,
}

impl Handle {
    pub fn new(origin: Vec2, tip: Vec2) -> Self {
        Self { origin, tip }
    }

    pub fn delta(&self) -> Vec2 {
        self.tip - self.origin
    }

    pub fn length(&self) -> f32 {
        self.delta().length()
    }

    /// Angle in degrees within `[0, 360)`, clockwise from +x in a y-up frame
    pub fn angle(&self) -> f32 {
        let d = self.delta();
        if d.length_squared() <= POINT_EPSILON * POINT_EPSILON {
            return 0.0;
        }
        let deg = (-d.y).atan2(d.x).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }

    /// Keep origin and length, point the tip at `degrees`
    pub fn set_angle(&mut self, degrees: f32) {
        let len = self.length();
        let rad = degrees.to_radians();
        self.tip = self.origin + Vec2::new(rad.cos(), -rad.sin()) * len;
    }

    /// Rotate the tip about the origin by `degrees` (same sense as [`Handle::angle`])
    pub fn rotated(&self, degrees: f32) -> Handle {
        let mut out = *self;
        out.set_angle(self.angle() + degrees);
        out
    }

    /// Keep origin and direction, change the length.
    ///
    /// A zero-length handle points along +x afterwards.
    pub fn set_length(&mut self, length: f32) {
        let d = self.delta();
        let dir = if d.length_squared() <= POINT_EPSILON * POINT_EPSILON {
            Vec2::X
        } else {
            d.normalize()
        };
        self.tip = self.origin + dir * length;
    }

    pub fn with_length(&self, length: f32) -> Handle {
        let mut out = *self;
        out.set_length(length);
        out
    }

    /// Handle of length one in the same direction
    pub fn unit(&self) -> Handle {
        self.with_length(1.0)
    }
}
