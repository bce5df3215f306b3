//! Neuron layout strategies
//!
//! A layout assigns each neuron of a population a 3D position relative to
//! the population's scene position. Layout problems are never fatal: the
//! generator returns whatever positions it could produce along with
//! human-readable errors, and the caller pads or truncates to the neuron
//! count.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Positions plus non-fatal problems from one generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutOutput {
    pub positions: Vec<Vec3>,
    pub errors: Vec<String>,
}

/// Pluggable layout strategy
#[cfg_attr(test, mockall::automock)]
pub trait LayoutGenerator {
    fn generate(&self, count: usize) -> LayoutOutput;
}

/// Built-in layout strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutKind {
    /// Neurons along +x
    Linear { spacing: f32 },
    /// Square-ish grid in the xy plane
    Grid2D { spacing: f32 },
    /// Cube-ish grid
    Grid3D { spacing: f32 },
    /// Uniform random positions inside a box centred on the origin
    RandomBox { extent: [f32; 3], seed: u64 },
}

impl Default for LayoutKind {
    fn default() -> Self {
        LayoutKind::Grid2D { spacing: 1.0 }
    }
}

impl LayoutKind {
    fn spacing_or_default(spacing: f32, errors: &mut Vec<String>) -> f32 {
        if spacing.is_finite() && spacing > 0.0 {
            spacing
        } else {
            errors.push(format!("invalid spacing {}, using 1.0", spacing));
            1.0
        }
    }
}

impl LayoutGenerator for LayoutKind {
    fn generate(&self, count: usize) -> LayoutOutput {
        let mut errors = Vec::new();
        let positions = match *self {
            LayoutKind::Linear { spacing } => {
                let s = Self::spacing_or_default(spacing, &mut errors);
                (0..count).map(|i| Vec3::new(i as f32 * s, 0.0, 0.0)).collect()
            }
            LayoutKind::Grid2D { spacing } => {
                let s = Self::spacing_or_default(spacing, &mut errors);
                let cols = (count as f64).sqrt().ceil().max(1.0) as usize;
                (0..count)
                    .map(|i| Vec3::new((i % cols) as f32 * s, (i / cols) as f32 * s, 0.0))
                    .collect()
            }
            LayoutKind::Grid3D { spacing } => {
                let s = Self::spacing_or_default(spacing, &mut errors);
                let side = (count as f64).cbrt().ceil().max(1.0) as usize;
                (0..count)
                    .map(|i| {
                        Vec3::new(
                            (i % side) as f32 * s,
                            ((i / side) % side) as f32 * s,
                            (i / (side * side)) as f32 * s,
                        )
                    })
                    .collect()
            }
            LayoutKind::RandomBox { extent, seed } => {
                let extent = Vec3::from(extent);
                if !extent.is_finite() || extent.min_element() < 0.0 {
                    errors.push(format!("invalid random box extent {:?}", extent));
                    vec![Vec3::ZERO; count]
                } else {
                    let mut rng = StdRng::seed_from_u64(seed);
                    (0..count)
                        .map(|_| {
                            let r = Vec3::new(
                                rng.random::<f32>(),
                                rng.random::<f32>(),
                                rng.random::<f32>(),
                            );
                            (r - Vec3::splat(0.5)) * extent
                        })
                        .collect()
                }
            }
        };
        LayoutOutput { positions, errors }
    }
}

/// Run `generator` and force the result to exactly `count` positions.
///
/// Missing positions are placed at the origin, extras are dropped. Both
/// cases are reported in the returned errors.
pub fn generate_layout(generator: &dyn LayoutGenerator, count: usize) -> LayoutOutput {
    let mut out = generator.generate(count);
    if out.positions.len() != count {
        out.errors.push(format!(
            "layout produced {} positions for {} neurons",
            out.positions.len(),
            count
        ));
        out.positions.resize(count, Vec3::ZERO);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid2d_layout() {
        let out = LayoutKind::Grid2D { spacing: 2.0 }.generate(5);
        assert!(out.errors.is_empty());
        assert_eq!(out.positions.len(), 5);
        // 3 columns for 5 neurons
        assert_eq!(out.positions[3], Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(out.positions[4], Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn test_grid3d_layout() {
        let out = LayoutKind::Grid3D { spacing: 1.0 }.generate(8);
        assert_eq!(out.positions[7], Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_random_box_is_seeded() {
        let kind = LayoutKind::RandomBox {
            extent: [10.0, 10.0, 2.0],
            seed: 5,
        };
        let a = kind.generate(20);
        let b = kind.generate(20);
        assert_eq!(a, b);
        assert!(a
            .positions
            .iter()
            .all(|p| p.x.abs() <= 5.0 && p.y.abs() <= 5.0 && p.z.abs() <= 1.0));
    }

    #[test]
    fn test_invalid_spacing_reported() {
        let out = LayoutKind::Linear { spacing: -1.0 }.generate(3);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.positions[2], Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_generate_layout_pads_short_output() {
        let mut mock = MockLayoutGenerator::new();
        mock.expect_generate().returning(|_| LayoutOutput {
            positions: vec![Vec3::ONE],
            errors: vec!["ran out of room".into()],
        });
        let out = generate_layout(&mock, 3);
        assert_eq!(out.positions, vec![Vec3::ONE, Vec3::ZERO, Vec3::ZERO]);
        assert_eq!(out.errors.len(), 2);
    }

    #[test]
    fn test_layout_kind_serde() {
        let kind = LayoutKind::RandomBox {
            extent: [1.0, 2.0, 3.0],
            seed: 11,
        };
        let json = serde_json::to_string(&kind).expect("serializes");
        assert!(json.contains("\"kind\":\"random_box\""));
        let back: LayoutKind = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, kind);
    }
}
