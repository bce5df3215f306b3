//! Image export
//!
//! An export frame is rendered with [`ExportTarget`](crate::config::ExportTarget)
//! set (finest glyphs, scaled line widths, transparent background) and
//! written out as SVG at the target size.

use std::fmt::Write as _;
use std::path::Path;

use glam::Vec2;

use crate::error::{Result, ResultExt, SpikeVizError};
use crate::scene::batch::Polyline;
use crate::scene::renderer::Frame;
use crate::types::Rgba;

fn svg_colour(colour: Rgba) -> (String, f32) {
    let [r, g, b, _] = colour.to_rgba8();
    (format!("#{:02x}{:02x}{:02x}", r, g, b), colour.a.clamp(0.0, 1.0))
}

fn write_polyline(out: &mut String, frame: &Frame, line: &Polyline) {
    let points: Option<Vec<Vec2>> = line.points.iter().map(|p| frame.project(*p).map(|(s, _)| s)).collect();
    let Some(points) = points.filter(|p| p.len() >= 2) else {
        return;
    };
    let (stroke, opacity) = svg_colour(line.colour);
    let _ = write!(out, "<polyline fill=\"none\" stroke=\"{}\" stroke-opacity=\"{:.3}\" stroke-width=\"{:.2}\" points=\"", stroke, opacity, line.width);
    for p in points {
        let _ = write!(out, "{:.2},{:.2} ", p.x, p.y);
    }
    out.push_str("\"/>\n");
}

/// Serialise `frame` as an SVG document
pub fn frame_to_svg(frame: &Frame) -> String {
    let (w, h) = (frame.viewport.width, frame.viewport.height);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    );
    let (fill, opacity) = svg_colour(frame.clear);
    let _ = writeln!(
        out,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\" fill-opacity=\"{:.3}\"/>",
        fill, opacity
    );

    for draw in &frame.connections {
        for line in &draw.batch.polylines {
            write_polyline(&mut out, frame, line);
        }
    }

    // far glyphs first
    let mut glyphs = Vec::new();
    for draw in &frame.populations {
        for glyph in &draw.batch.glyphs {
            let world = draw.translation + glyph.position;
            let (Some((screen, depth)), Some(radius)) = (frame.project(world), frame.glyph_screen_radius(world)) else {
                continue;
            };
            glyphs.push((depth, screen, radius, glyph.colour));
        }
    }
    glyphs.sort_by(|a, b| b.0.total_cmp(&a.0));
    for (_, c, r, colour) in glyphs {
        let (fill, opacity) = svg_colour(colour);
        let _ = writeln!(
            out,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.3}\"/>",
            c.x, c.y, r, fill, opacity
        );
    }

    for line in &frame.overlay {
        write_polyline(&mut out, frame, line);
    }
    out.push_str("</svg>\n");
    out
}

/// Write `frame` to `path` as SVG
pub fn export_svg(frame: &Frame, path: &Path) -> Result<()> {
    std::fs::write(path, frame_to_svg(frame))
        .map_err(SpikeVizError::from)
        .with_context(|| format!("Failed to write image {}", path.display()))?;
    tracing::info!("Exported image to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::{Mat4, Vec3};

    use crate::model::EntityId;
    use crate::scene::batch::{ConnectionBatch, Glyph, PopulationBatch};
    use crate::scene::lod::glyph_outline;
    use crate::scene::renderer::{ConnectionDraw, FrameStats, PopulationDraw, GLYPH_RADIUS};
    use crate::scene::Viewport;

    fn frame() -> Frame {
        let projection = Mat4::orthographic_rh_gl(-10.0, 10.0, -10.0, 10.0, -100.0, 100.0);
        let glyph = |x: f32| Glyph {
            position: Vec3::new(x, 0.0, 0.0),
            colour: Rgba::BLACK,
            pick: None,
        };
        let line = Polyline {
            points: vec![Vec3::ZERO, Vec3::new(5.0, 5.0, 0.0)],
            colour: Rgba::new(0.0, 0.0, 1.0, 0.8),
            width: 3.0,
        };
        Frame {
            view: Mat4::IDENTITY,
            projection,
            view_proj: projection,
            viewport: Viewport::new(200.0, 200.0),
            clear: Rgba::TRANSPARENT_WHITE,
            lod: 64,
            line_scale: 2.0,
            glyph_radius: GLYPH_RADIUS,
            preview: false,
            populations: vec![PopulationDraw {
                id: EntityId::INVALID,
                translation: Vec3::ZERO,
                batch: Arc::new(PopulationBatch {
                    glyphs: vec![glyph(0.0), glyph(1.0)],
                    outline: glyph_outline(64),
                }),
            }],
            connections: vec![ConnectionDraw {
                id: EntityId::INVALID,
                batch: Arc::new(ConnectionBatch {
                    polylines: vec![line.clone()],
                }),
            }],
            overlay: vec![line],
            stats: FrameStats::default(),
        }
    }

    #[test]
    fn test_svg_contents() {
        let svg = frame_to_svg(&frame());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("fill=\"#ffffff\" fill-opacity=\"0.000\""));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<polyline").count(), 2);
        // glyph at the origin lands in the middle of the image
        assert!(svg.contains("cx=\"100.00\" cy=\"100.00\" r=\"5.00\""));
        assert!(svg.contains("stroke=\"#0000ff\" stroke-opacity=\"0.800\" stroke-width=\"3.00\""));
    }

    #[test]
    fn test_export_svg_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scene.svg");
        export_svg(&frame(), &path).expect("export");
        let svg = std::fs::read_to_string(&path).expect("read");
        assert!(svg.ends_with("</svg>\n"));
    }
}
