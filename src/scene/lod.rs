//! Neuron glyph level of detail

use glam::Vec2;

pub const MIN_LOD: u32 = 4;
pub const MAX_LOD: u32 = 32;
/// Fixed detail used for image export
pub const EXPORT_LOD: u32 = 64;

/// Glyph tessellation for `total_neurons` drawn at `quality`.
///
/// `round(250 / total * 2^quality)` clamped to `[MIN_LOD, MAX_LOD]`, so
/// dense scenes get coarse glyphs. Export always uses [`EXPORT_LOD`].
pub fn level_of_detail(total_neurons: usize, quality: u32, export: bool) -> u32 {
    if export {
        return EXPORT_LOD;
    }
    if total_neurons == 0 {
        return MAX_LOD;
    }
    let lod = (250.0 / total_neurons as f64 * 2f64.powi(quality.min(30) as i32)).round();
    (lod.min(MAX_LOD as f64) as u32).clamp(MIN_LOD, MAX_LOD)
}

/// Unit-radius polygon with `lod` vertices, counter-clockwise from +x
pub fn glyph_outline(lod: u32) -> Vec<Vec2> {
    let n = lod.max(3);
    (0..n)
        .map(|i| {
            let a = i as f32 / n as f32 * std::f32::consts::TAU;
            Vec2::new(a.cos(), a.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_of_detail_clamps() {
        // 250 / 20 * 32 = 400
        assert_eq!(level_of_detail(20, 5, false), MAX_LOD);
        // 250 / 10000 * 32 = 0.8
        assert_eq!(level_of_detail(10_000, 5, false), MIN_LOD);
        // 250 / 1000 * 32 = 8
        assert_eq!(level_of_detail(1000, 5, false), 8);
        assert_eq!(level_of_detail(1000, 5, true), EXPORT_LOD);
        assert_eq!(level_of_detail(0, 5, false), MAX_LOD);
    }

    #[test]
    fn test_level_of_detail_rounds() {
        // 250 / 600 * 32 = 13.33
        assert_eq!(level_of_detail(600, 5, false), 13);
        // 250 / 400 * 32 = 20
        assert_eq!(level_of_detail(400, 5, false), 20);
    }

    #[test]
    fn test_glyph_outline() {
        let outline = glyph_outline(8);
        assert_eq!(outline.len(), 8);
        assert!(outline.iter().all(|p| (p.length() - 1.0).abs() < 1e-5));
        assert_eq!(glyph_outline(1).len(), 3);
    }
}
