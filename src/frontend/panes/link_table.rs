//! Links pane - resolved links of the selected connection
//!
//! One row per link. Clicking a cell adds it to the table selection,
//! which the 3D view highlights; the neuron focus controls highlight every
//! link touching one neuron.

use egui::{Color32, Ui};

use crate::config::NeuronFocus;
use crate::frontend::pane_trait::Pane;
use crate::frontend::state::{AppAction, SharedState};
use crate::frontend::workspace::PaneKind;
use crate::scene::{LinkColumn, SelectedCell};
use crate::types::NeuronSide;

const ROW_HEIGHT: f32 = 18.0;

#[derive(Default)]
pub struct LinkTableState {
    focus_side_destination: bool,
    focus_index: u32,
}

impl Pane for LinkTableState {
    fn kind(&self) -> PaneKind {
        PaneKind::LinkTable
    }

    fn render(&mut self, shared: &mut SharedState, ui: &mut Ui) -> Vec<AppAction> {
        let mut actions = Vec::new();
        let controller = shared.controller;
        let Some(entry) = controller
            .selected()
            .and_then(|id| controller.working_set().connection(id))
        else {
            ui.colored_label(Color32::GRAY, "Select a visualised synapse or input");
            return actions;
        };
        let is_explicit = shared
            .model
            .entity(entry.id)
            .and_then(|e| e.pattern())
            .is_some_and(|p| p.explicit().is_some());

        ui.horizontal(|ui| {
            ui.label(format!("{} links", entry.links.len()));
            if entry.skipped > 0 {
                ui.colored_label(Color32::YELLOW, format!("({} skipped)", entry.skipped));
            }
            if is_explicit && ui.button("Regenerate").clicked() {
                actions.push(AppAction::RegenerateConnection(entry.id));
            }
            if !controller.settings().table_selection.is_empty() && ui.button("Clear selection").clicked() {
                actions.push(AppAction::ClearTableSelection);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Focus neuron");
            egui::ComboBox::from_id_salt("focus_side")
                .selected_text(if self.focus_side_destination { "destination" } else { "source" })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.focus_side_destination, false, "source");
                    ui.selectable_value(&mut self.focus_side_destination, true, "destination");
                });
            ui.add(egui::DragValue::new(&mut self.focus_index));
            if ui.button("Apply").clicked() {
                let side = if self.focus_side_destination {
                    NeuronSide::Destination
                } else {
                    NeuronSide::Source
                };
                actions.push(AppAction::SetNeuronFocus(Some(NeuronFocus {
                    side,
                    index: self.focus_index,
                })));
            }
            if controller.settings().neuron_focus.is_some() && ui.button("Clear").clicked() {
                actions.push(AppAction::SetNeuronFocus(None));
            }
        });
        ui.separator();

        let selection = &controller.settings().table_selection;
        let is_picked = |row: usize, column: LinkColumn| selection.cells().contains(&SelectedCell { row, column });

        egui::Grid::new("link_table_header").num_columns(4).show(ui, |ui| {
            ui.strong("#");
            ui.strong("Source");
            ui.strong("Destination");
            ui.strong("Metric");
            ui.end_row();
        });
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show_rows(ui, ROW_HEIGHT, entry.links.len(), |ui, range| {
                egui::Grid::new("link_table").num_columns(4).striped(true).show(ui, |ui| {
                    for row in range {
                        let link = entry.links[row];
                        ui.label(row.to_string());
                        let cells = [
                            (LinkColumn::Source, link.src.to_string()),
                            (LinkColumn::Destination, link.dst.to_string()),
                            (LinkColumn::Metric, format!("{:.3}", link.metric)),
                        ];
                        for (column, text) in cells {
                            if ui.selectable_label(is_picked(row, column), text).clicked() {
                                actions.push(AppAction::SelectTableCell { row, column });
                            }
                        }
                        ui.end_row();
                    }
                });
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
