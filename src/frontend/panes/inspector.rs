//! Inspector pane - properties of the selected entity
//!
//! Populations: neuron count, layout strategy with preview, an uncommitted
//! scene position and the log time cursor. Connections: strength.

use egui::{Color32, Ui};
use glam::Vec3;

use crate::frontend::pane_trait::Pane;
use crate::frontend::state::{AppAction, SharedState};
use crate::frontend::workspace::PaneKind;
use crate::model::{Entity, EntityId, LayoutKind, Population};

#[derive(Default)]
pub struct InspectorState {
    /// Entity the edit buffers below belong to
    editing: Option<EntityId>,
    layout: LayoutKind,
    position: Vec3,
}

fn layout_name(kind: &LayoutKind) -> &'static str {
    match kind {
        LayoutKind::Linear { .. } => "Linear",
        LayoutKind::Grid2D { .. } => "Grid 2D",
        LayoutKind::Grid3D { .. } => "Grid 3D",
        LayoutKind::RandomBox { .. } => "Random box",
    }
}

fn layout_editor(ui: &mut Ui, layout: &mut LayoutKind) {
    let spacing = match layout {
        LayoutKind::Linear { spacing } | LayoutKind::Grid2D { spacing } | LayoutKind::Grid3D { spacing } => *spacing,
        LayoutKind::RandomBox { .. } => 1.0,
    };
    egui::ComboBox::from_id_salt("layout_kind")
        .selected_text(layout_name(layout))
        .show_ui(ui, |ui| {
            let choices = [
                LayoutKind::Linear { spacing },
                LayoutKind::Grid2D { spacing },
                LayoutKind::Grid3D { spacing },
                LayoutKind::RandomBox {
                    extent: [10.0, 10.0, 10.0],
                    seed: 1,
                },
            ];
            for choice in choices {
                let name = layout_name(&choice);
                if ui.selectable_label(layout_name(layout) == name, name).clicked() {
                    *layout = choice;
                }
            }
        });
    match layout {
        LayoutKind::Linear { spacing } | LayoutKind::Grid2D { spacing } | LayoutKind::Grid3D { spacing } => {
            ui.add(egui::DragValue::new(spacing).speed(0.05).range(0.01..=100.0).prefix("spacing "));
        }
        LayoutKind::RandomBox { extent, seed } => {
            for (axis, v) in ["x ", "y ", "z "].iter().zip(extent.iter_mut()) {
                ui.add(egui::DragValue::new(v).speed(0.1).range(0.0..=1000.0).prefix(*axis));
            }
            ui.add(egui::DragValue::new(seed).prefix("seed "));
        }
    }
}

impl InspectorState {
    fn population(&mut self, ui: &mut Ui, shared: &SharedState<'_>, id: EntityId, pop: &Population) -> Vec<AppAction> {
        let mut actions = Vec::new();
        if self.editing != Some(id) {
            self.editing = Some(id);
            self.layout = pop.layout;
            self.position = pop.position;
        }
        let settings = shared.controller.settings();

        ui.heading(&pop.name);
        egui::Grid::new("inspector_population").num_columns(2).show(ui, |ui| {
            ui.label("Neurons");
            let mut count = pop.neuron_count;
            if ui.add(egui::DragValue::new(&mut count).range(0..=1_000_000)).changed() {
                actions.push(AppAction::SetNeuronCount { id, count });
            }
            ui.end_row();

            ui.label("Layout");
            ui.horizontal(|ui| layout_editor(ui, &mut self.layout));
            ui.end_row();
        });
        ui.horizontal(|ui| {
            if ui.button("Apply layout").clicked() {
                actions.push(AppAction::SetLayout { id, layout: self.layout });
            }
            if ui.button("Preview").clicked() {
                actions.push(AppAction::PreviewLayout { id, layout: self.layout });
            }
            if settings.is_previewing_layout() && ui.button("End preview").clicked() {
                actions.push(AppAction::ClearLayoutPreview);
            }
        });

        ui.separator();
        ui.label("Scene position");
        ui.horizontal(|ui| {
            let mut changed = false;
            for (axis, v) in ["x ", "y ", "z "].iter().zip([&mut self.position.x, &mut self.position.y, &mut self.position.z]) {
                changed |= ui.add(egui::DragValue::new(v).speed(0.1).prefix(*axis)).changed();
            }
            if changed {
                actions.push(AppAction::SetPreviewOffset(Some(self.position)));
            }
        });
        if settings.preview_offset.is_some() {
            ui.horizontal(|ui| {
                if ui.button("Commit").clicked() {
                    actions.push(AppAction::CommitPreviewOffset);
                }
                if ui.button("Revert").clicked() {
                    self.position = pop.position;
                    actions.push(AppAction::SetPreviewOffset(None));
                }
            });
        }

        let log = shared
            .controller
            .working_set()
            .population(id)
            .and_then(|e| e.log.clone());
        if let Some(log) = log {
            ui.separator();
            ui.label(format!("Log {}", log.name()));
            let mut time = shared.controller.log_time();
            let last = log.rows().saturating_sub(1);
            if ui.add(egui::Slider::new(&mut time, 0..=last).text("time step")).changed() {
                actions.push(AppAction::SetLogTime(time));
            }
        }
        actions
    }
}

impl Pane for InspectorState {
    fn kind(&self) -> PaneKind {
        PaneKind::Inspector
    }

    fn render(&mut self, shared: &mut SharedState, ui: &mut Ui) -> Vec<AppAction> {
        let Some(id) = shared.controller.selected() else {
            self.editing = None;
            ui.colored_label(Color32::GRAY, "Nothing selected");
            return Vec::new();
        };
        let model = shared.model;
        match model.entity(id) {
            Some(Entity::Population(pop)) => self.population(ui, shared, id, pop),
            Some(Entity::Synapse(_)) | Some(Entity::GenericInput(_)) => {
                let mut actions = Vec::new();
                let (pattern, strength) = match model.entity(id) {
                    Some(Entity::Synapse(s)) => (s.pattern.label(), s.strength),
                    Some(Entity::GenericInput(g)) => (g.pattern.label(), g.strength),
                    _ => return actions,
                };
                ui.heading(pattern);
                let mut strength = strength;
                ui.horizontal(|ui| {
                    ui.label("Curve strength");
                    if ui.add(egui::DragValue::new(&mut strength).range(0..=16)).changed() {
                        actions.push(AppAction::SetStrength { id, strength });
                    }
                });
                actions
            }
            Some(Entity::Projection(p)) => {
                ui.heading(&p.name);
                ui.label(format!("{} synapses", p.synapses.len()));
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
