//! Network pane - entity list with visibility toggles
//!
//! Populations first, then projections with their synapses nested under
//! them, then generic inputs. Clicking a name selects the entity.

use egui::{Color32, RichText, Ui};

use crate::frontend::pane_trait::Pane;
use crate::frontend::state::{AppAction, SharedState};
use crate::frontend::widgets::ColorSwatch;
use crate::frontend::workspace::PaneKind;
use crate::model::{Entity, EntityId};

#[derive(Default)]
pub struct EntityListState {
    /// Case-insensitive name filter
    pub filter: String,
}

fn visibility_row(ui: &mut Ui, shared: &SharedState<'_>, id: EntityId, label: String, actions: &mut Vec<AppAction>) {
    let Some(entity) = shared.model.entity(id) else {
        return;
    };
    ui.horizontal(|ui| {
        if let Some(mut on) = entity.visualised() {
            if ui.checkbox(&mut on, "").on_hover_text("Show in 3D view").changed() {
                actions.push(AppAction::SetVisualised { id, on });
            }
        }
        let selected = shared.controller.selected() == Some(id);
        if ui.selectable_label(selected, label).clicked() {
            actions.push(AppAction::Select(if selected { None } else { Some(id) }));
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                actions.push(AppAction::Delete(id));
            }
        });
    });
}

impl Pane for EntityListState {
    fn kind(&self) -> PaneKind {
        PaneKind::EntityList
    }

    fn render(&mut self, shared: &mut SharedState, ui: &mut Ui) -> Vec<AppAction> {
        let mut actions = Vec::new();
        ui.horizontal(|ui| {
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.filter);
        });
        ui.separator();

        let needle = self.filter.to_lowercase();
        let matches = |name: &str| needle.is_empty() || name.to_lowercase().contains(&needle);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.strong("Populations");
                let mut any = false;
                for (id, pop) in shared.model.populations() {
                    if !matches(&pop.name) {
                        continue;
                    }
                    any = true;
                    ui.horizontal(|ui| {
                        let [r, g, b] = pop.colour;
                        ui.add(ColorSwatch::new(Color32::from_rgb(r, g, b)));
                        visibility_row(ui, shared, id, format!("{} ({})", pop.name, pop.neuron_count), &mut actions);
                    });
                }
                if !any {
                    ui.colored_label(Color32::GRAY, "No populations");
                }

                ui.add_space(6.0);
                ui.strong("Projections");
                for (id, proj) in shared.model.projections() {
                    if !matches(&proj.name) {
                        continue;
                    }
                    egui::CollapsingHeader::new(RichText::new(&proj.name))
                        .id_salt(id)
                        .default_open(true)
                        .show(ui, |ui| {
                            visibility_row(ui, shared, id, "projection".to_string(), &mut actions);
                            for (i, syn) in proj.synapses.iter().enumerate() {
                                let label = shared
                                    .model
                                    .synapse(*syn)
                                    .map(|s| format!("synapse {} [{}]", i, s.pattern.label()))
                                    .unwrap_or_default();
                                visibility_row(ui, shared, *syn, label, &mut actions);
                            }
                        });
                }

                let inputs: Vec<(EntityId, String)> = shared
                    .model
                    .connections()
                    .filter_map(|(id, e)| match e {
                        Entity::GenericInput(g) => Some((id, format!("{} → {}", g.source_port, g.destination_port))),
                        _ => None,
                    })
                    .collect();
                if !inputs.is_empty() {
                    ui.add_space(6.0);
                    ui.strong("Generic inputs");
                    for (id, label) in inputs {
                        if matches(&label) {
                            visibility_row(ui, shared, id, label, &mut actions);
                        }
                    }
                }
            });
        actions
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
