//! Core data types for SpikeViz-RS
//!
//! Small value types shared by the resolver, the scene renderer and the
//! sync controller.
//!
//! # Main Types
//!
//! - [`Link`] - one resolved neuron-to-neuron connection
//! - [`Rgba`] - floating point colour used by draw batches
//! - [`Bounds3`] - axis-aligned bounding box in scene space
//! - [`NeuronSide`] - which end of a connection a neuron index refers to

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A single resolved connection between two neuron indices
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Link {
    pub src: u32,
    pub dst: u32,
    /// Pattern-specific weight or delay, 0 when the pattern has none
    pub metric: f32,
}

impl Link {
    pub fn new(src: u32, dst: u32) -> Self {
        Self {
            src,
            dst,
            metric: 0.0,
        }
    }

    pub fn with_metric(src: u32, dst: u32, metric: f32) -> Self {
        Self { src, dst, metric }
    }

    /// Both indices fall inside layouts of the given sizes
    pub fn in_range(&self, src_len: usize, dst_len: usize) -> bool {
        (self.src as usize) < src_len && (self.dst as usize) < dst_len
    }
}

/// Which side of a connection a neuron index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronSide {
    Source,
    Destination,
}

/// RGBA colour with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT_WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.0);
    /// Glyph colour while previewing a layout
    pub const PREVIEW_GREY: Rgba = Rgba::new(100.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds3 {
    /// Bounds of a point set, `None` when empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Bounds3 {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.include(*p);
        }
        Some(bounds)
    }

    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(self, other: Bounds3) -> Bounds3 {
        Bounds3 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(self, offset: Vec3) -> Bounds3 {
        Bounds3 {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Longest edge of the box
    pub fn max_extent(&self) -> f32 {
        (self.max - self.min).max_element()
    }
}
