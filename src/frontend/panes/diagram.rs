//! Diagram pane - 2D network editor
//!
//! Draws population footprints and edge paths. Dragging a control point
//! of the selected edge reshapes it, dragging a population moves it with
//! its attached edge ends, dragging empty space pans.

use egui::{Color32, Pos2, Sense, Shape, Stroke, Ui};
use glam::Vec2;

use crate::curves::{select_control_point, ControlPoint, EdgePath, SAMPLES_PER_SEGMENT};
use crate::frontend::pane_trait::Pane;
use crate::frontend::state::{AppAction, SharedState};
use crate::frontend::workspace::PaneKind;
use crate::geometry::{FootprintShape, PopulationBounds};
use crate::model::{EntityId, NetworkModel};

/// Pick tolerance in screen pixels
const PICK_TOLERANCE_PX: f32 = 8.0;
const ARROW_SIZE: f32 = 0.25;
const MIN_ZOOM: f32 = 5.0;
const MAX_ZOOM: f32 = 400.0;

/// Maps y-up diagram space onto y-down screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagramTransform {
    pub origin: Pos2,
    /// Pixels per diagram unit
    pub zoom: f32,
}

impl DiagramTransform {
    pub fn to_screen(&self, p: Vec2) -> Pos2 {
        Pos2::new(self.origin.x + p.x * self.zoom, self.origin.y - p.y * self.zoom)
    }

    pub fn to_diagram(&self, p: Pos2) -> Vec2 {
        Vec2::new((p.x - self.origin.x) / self.zoom, (self.origin.y - p.y) / self.zoom)
    }

    /// Screen distance expressed in diagram units
    pub fn diagram_len(&self, pixels: f32) -> f32 {
        pixels / self.zoom
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DiagramDrag {
    ControlPoint { edge: EntityId, point: ControlPoint },
    Population { id: EntityId, last: Vec2 },
    Pan,
}

pub struct DiagramState {
    /// Screen offset of the diagram origin from the pane centre
    pub pan: egui::Vec2,
    pub zoom: f32,
    drag: Option<DiagramDrag>,
}

impl Default for DiagramState {
    fn default() -> Self {
        Self {
            pan: egui::Vec2::ZERO,
            zoom: 60.0,
            drag: None,
        }
    }
}

/// Every drawable edge path with its id
fn edge_paths(model: &NetworkModel) -> Vec<(EntityId, &EdgePath)> {
    model
        .projections()
        .map(|(id, p)| (id, &p.path))
        .chain(model.connections().filter_map(|(id, e)| e.path().map(|p| (id, p))))
        .collect()
}

/// Population under `p`, topmost (last drawn) first
pub fn population_at(model: &NetworkModel, p: Vec2) -> Option<EntityId> {
    let pops: Vec<_> = model.populations().collect();
    pops.into_iter()
        .rev()
        .find(|(_, pop)| pop.bounds().contains(p))
        .map(|(id, _)| id)
}

/// Edge whose path passes within `tolerance` of `p`, closest first
pub fn edge_at(model: &NetworkModel, p: Vec2, tolerance: f32) -> Option<EntityId> {
    edge_paths(model)
        .into_iter()
        .map(|(id, path)| (id, path.distance_to(p)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

fn footprint_outline(bounds: &PopulationBounds, xf: &DiagramTransform) -> Vec<Pos2> {
    let c = bounds.center;
    let h = bounds.half_extents;
    match bounds.shape {
        FootprintShape::Rectangle => [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .iter()
            .map(|(sx, sy)| xf.to_screen(c + Vec2::new(sx * h.x, sy * h.y)))
            .collect(),
        FootprintShape::Ellipse => (0..48)
            .map(|i| {
                let a = i as f32 / 48.0 * std::f32::consts::TAU;
                xf.to_screen(c + Vec2::new(a.cos() * h.x, a.sin() * h.y))
            })
            .collect(),
    }
}

fn draw_edge(painter: &egui::Painter, xf: &DiagramTransform, path: &EdgePath, stroke: Stroke, handles: bool) {
    let points: Vec<Pos2> = path.sample(SAMPLES_PER_SEGMENT).into_iter().map(|p| xf.to_screen(p)).collect();
    painter.add(Shape::line(points, stroke));
    if let Some(head) = path.arrow_head(ARROW_SIZE) {
        let head: Vec<Pos2> = head.iter().map(|p| xf.to_screen(*p)).collect();
        painter.add(Shape::convex_polygon(head, stroke.color, Stroke::NONE));
    }
    if !handles {
        return;
    }
    let handle_stroke = Stroke::new(1.0, Color32::LIGHT_BLUE);
    for (i, seg) in path.curves.iter().enumerate() {
        let start = xf.to_screen(path.segment_start(i));
        painter.line_segment([start, xf.to_screen(seg.c1)], handle_stroke);
        painter.line_segment([xf.to_screen(seg.c2), xf.to_screen(seg.end)], handle_stroke);
    }
    for (cp, p) in path.control_points() {
        let joint = matches!(cp, ControlPoint::Start | ControlPoint::End(_));
        let colour = if joint { Color32::WHITE } else { Color32::LIGHT_BLUE };
        painter.circle_filled(xf.to_screen(p), 4.0, colour);
    }
}

impl Pane for DiagramState {
    fn kind(&self) -> PaneKind {
        PaneKind::Diagram
    }

    fn render(&mut self, shared: &mut SharedState, ui: &mut Ui) -> Vec<AppAction> {
        let mut actions = Vec::new();
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let xf = DiagramTransform {
            origin: rect.center() + self.pan,
            zoom: self.zoom,
        };
        let model = shared.model;
        let selected = shared.controller.selected();
        let tolerance = xf.diagram_len(PICK_TOLERANCE_PX);
        let show_indices = shared.app_state.show_population_indices;

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.zoom = (self.zoom * (scroll * 0.002).exp()).clamp(MIN_ZOOM, MAX_ZOOM);
            }
        }

        let pointer = response.interact_pointer_pos().map(|p| xf.to_diagram(p));

        if response.drag_started() {
            if let Some(p) = pointer {
                let on_point = selected.and_then(|edge| {
                    model
                        .edge_path(edge)
                        .and_then(|path| select_control_point(path, p, tolerance))
                        .map(|point| DiagramDrag::ControlPoint { edge, point })
                });
                self.drag = Some(
                    on_point
                        .or_else(|| population_at(model, p).map(|id| DiagramDrag::Population { id, last: p }))
                        .unwrap_or(DiagramDrag::Pan),
                );
            }
        }
        if response.dragged() {
            match (&mut self.drag, pointer) {
                (Some(DiagramDrag::ControlPoint { edge, point }), Some(p)) => {
                    actions.push(AppAction::MoveControlPoint {
                        edge: *edge,
                        point: *point,
                        cursor: p,
                    });
                }
                (Some(DiagramDrag::Population { id, last }), Some(p)) => {
                    let delta = p - *last;
                    if delta != Vec2::ZERO {
                        actions.push(AppAction::MovePopulation { id: *id, delta });
                        *last = p;
                    }
                }
                (Some(DiagramDrag::Pan), _) => self.pan += response.drag_delta(),
                _ => {}
            }
        }
        if response.drag_stopped() {
            self.drag = None;
        }
        if response.clicked() {
            if let Some(p) = pointer {
                let hit = population_at(model, p).or_else(|| edge_at(model, p, tolerance));
                actions.push(AppAction::Select(hit));
            }
        }

        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);

        for (id, path) in edge_paths(model) {
            let is_selected = selected == Some(id);
            let stroke = if is_selected {
                Stroke::new(2.5, Color32::from_rgb(255, 170, 0))
            } else {
                Stroke::new(1.5, ui.visuals().text_color())
            };
            draw_edge(&painter, &xf, path, stroke, is_selected);
        }

        for (id, pop) in model.populations() {
            let bounds = pop.bounds();
            let [r, g, b] = pop.colour;
            let outline = footprint_outline(&bounds, &xf);
            let stroke = if selected == Some(id) {
                Stroke::new(2.5, Color32::from_rgb(255, 170, 0))
            } else {
                Stroke::new(1.0, Color32::BLACK)
            };
            painter.add(Shape::convex_polygon(outline, Color32::from_rgb(r, g, b), stroke));
            let label = match model.population_index(id) {
                Some(index) if show_indices => format!("{} [{}]", pop.name, index),
                _ => pop.name.clone(),
            };
            painter.text(
                xf.to_screen(bounds.center),
                egui::Align2::CENTER_CENTER,
                label,
                egui::FontId::proportional(13.0),
                Color32::BLACK,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityPattern;

    #[test]
    fn test_transform_round_trip_flips_y() {
        let xf = DiagramTransform {
            origin: Pos2::new(100.0, 50.0),
            zoom: 10.0,
        };
        assert_eq!(xf.to_screen(Vec2::new(1.0, 2.0)), Pos2::new(110.0, 30.0));
        assert_eq!(xf.to_diagram(Pos2::new(110.0, 30.0)), Vec2::new(1.0, 2.0));
        assert_eq!(xf.diagram_len(5.0), 0.5);
    }

    #[test]
    fn test_hit_testing() {
        let mut model = NetworkModel::new();
        let a = model.add_population("A", 4, Vec2::ZERO);
        let b = model.add_population("B", 4, Vec2::new(10.0, 0.0));
        let proj = model.add_projection("p", a, b).expect("projection");
        model.add_synapse(proj, ConnectivityPattern::OneToOne).expect("synapse");

        assert_eq!(population_at(&model, Vec2::ZERO), Some(a));
        assert_eq!(population_at(&model, Vec2::new(10.0, 0.0)), Some(b));
        assert_eq!(population_at(&model, Vec2::new(5.0, 0.0)), None);
        assert_eq!(edge_at(&model, Vec2::new(5.0, 0.0), 0.1), Some(proj));
        assert_eq!(edge_at(&model, Vec2::new(5.0, 3.0), 0.1), None);
    }
}
