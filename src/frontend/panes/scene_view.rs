//! 3D view pane
//!
//! Paints the renderer's last [`Frame`] with the egui painter and turns
//! pointer input into camera and pick actions. Primary drag pans,
//! secondary drag orbits, the wheel zooms and a click picks a neuron.

use egui::{Color32, Pos2, Rect, Sense, Shape, Stroke, Ui};
use glam::Vec2;

use crate::frontend::pane_trait::Pane;
use crate::frontend::state::{AppAction, SharedState};
use crate::frontend::widgets::to_color32;
use crate::frontend::workspace::PaneKind;
use crate::scene::{DragButton, Frame, Polyline, Viewport};

/// Glyphs smaller than this are painted as plain circles
const MIN_POLYGON_RADIUS: f32 = 2.0;

#[derive(Default)]
pub struct SceneViewState {
    last_size: Option<Viewport>,
}

fn to_pos(rect: Rect, p: Vec2) -> Pos2 {
    rect.min + egui::vec2(p.x, p.y)
}

fn paint_polyline(painter: &egui::Painter, rect: Rect, frame: &Frame, line: &Polyline) {
    let points: Option<Vec<Pos2>> = line
        .points
        .iter()
        .map(|p| frame.project(*p).map(|(s, _)| to_pos(rect, s)))
        .collect();
    if let Some(points) = points.filter(|p| p.len() >= 2) {
        painter.add(Shape::line(points, Stroke::new(line.width, to_color32(line.colour))));
    }
}

/// Paint `frame` into `rect`: links, then glyphs far to near, then the
/// highlight overlay
pub fn paint_frame(painter: &egui::Painter, rect: Rect, frame: &Frame) {
    painter.rect_filled(rect, 0.0, to_color32(frame.clear));

    for draw in &frame.connections {
        for line in &draw.batch.polylines {
            paint_polyline(painter, rect, frame, line);
        }
    }

    let mut glyphs = Vec::new();
    for draw in &frame.populations {
        for glyph in &draw.batch.glyphs {
            let world = draw.translation + glyph.position;
            let (Some((screen, depth)), Some(radius)) = (frame.project(world), frame.glyph_screen_radius(world)) else {
                continue;
            };
            glyphs.push((depth, to_pos(rect, screen), radius, to_color32(glyph.colour), &draw.batch.outline));
        }
    }
    glyphs.sort_by(|a, b| b.0.total_cmp(&a.0));
    for (_, center, radius, colour, outline) in glyphs {
        if radius < MIN_POLYGON_RADIUS || outline.len() < 3 {
            painter.circle_filled(center, radius.max(0.5), colour);
        } else {
            let points = outline.iter().map(|p| center + egui::vec2(p.x, -p.y) * radius).collect();
            painter.add(Shape::convex_polygon(points, colour, Stroke::new(0.5, Color32::from_black_alpha(80))));
        }
    }

    for line in &frame.overlay {
        paint_polyline(painter, rect, frame, line);
    }
}

impl Pane for SceneViewState {
    fn kind(&self) -> PaneKind {
        PaneKind::SceneView
    }

    fn render(&mut self, shared: &mut SharedState, ui: &mut Ui) -> Vec<AppAction> {
        let mut actions = Vec::new();

        ui.horizontal(|ui| {
            let mut ortho = shared.camera.orthographic;
            if ui.checkbox(&mut ortho, "Orthographic").changed() {
                actions.push(AppAction::SetOrthographic(ortho));
            }
            if ui.button("Reset view").clicked() {
                actions.push(AppAction::ResetCamera);
            }
            if ui.button("Export image").clicked() {
                actions.push(AppAction::ExportImage);
            }
            if let Some(frame) = shared.frame {
                ui.separator();
                let stats = frame.stats;
                ui.label(
                    egui::RichText::new(format!(
                        "{} neurons, {} links, LoD {}",
                        stats.neurons, stats.links, frame.lod
                    ))
                    .small(),
                );
                if stats.skipped_links > 0 {
                    ui.colored_label(Color32::YELLOW, format!("{} links skipped", stats.skipped_links));
                }
            }
        });

        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let size = Viewport::new(rect.width(), rect.height());
        if self.last_size != Some(size) {
            self.last_size = Some(size);
            actions.push(AppAction::ResizeViewport(size));
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                actions.push(AppAction::Zoom(-scroll));
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            let d = response.drag_delta();
            actions.push(AppAction::Drag {
                button: DragButton::Primary,
                delta: Vec2::new(d.x, d.y),
            });
        } else if response.dragged_by(egui::PointerButton::Secondary) {
            let d = response.drag_delta();
            actions.push(AppAction::Drag {
                button: DragButton::Secondary,
                delta: Vec2::new(d.x, d.y),
            });
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - rect.min;
                actions.push(AppAction::Pick(Vec2::new(local.x, local.y)));
            }
        }

        match shared.frame {
            Some(frame) => paint_frame(&painter.with_clip_rect(rect), rect, frame),
            None => {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Nothing visualised",
                    egui::FontId::proportional(14.0),
                    Color32::GRAY,
                );
            }
        }
        if shared.frame.is_some_and(|f| f.preview) {
            painter.text(
                rect.left_top() + egui::vec2(8.0, 8.0),
                egui::Align2::LEFT_TOP,
                "Layout preview",
                egui::FontId::proportional(13.0),
                Color32::DARK_GRAY,
            );
        }
        actions
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
