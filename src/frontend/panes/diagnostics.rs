//! Diagnostics pane - recoverable problems and pending confirmations

use egui::{Color32, Ui};

use crate::frontend::pane_trait::Pane;
use crate::frontend::state::{AppAction, SharedState};
use crate::frontend::widgets::SeverityIndicator;
use crate::frontend::workspace::PaneKind;

#[derive(Default)]
pub struct DiagnosticsState;

impl Pane for DiagnosticsState {
    fn kind(&self) -> PaneKind {
        PaneKind::Diagnostics
    }

    fn render(&mut self, shared: &mut SharedState, ui: &mut Ui) -> Vec<AppAction> {
        let mut actions = Vec::new();

        for pending in shared.pending {
            ui.horizontal(|ui| {
                let name = shared.model.name(pending.connection).unwrap_or("connection");
                ui.colored_label(
                    Color32::YELLOW,
                    format!("Regenerate {} list of {} {}?", pending.kind, name, pending.connection),
                );
                if ui.button("Regenerate").clicked() {
                    actions.push(AppAction::ApproveRegeneration(pending.connection));
                }
                if ui.button("Keep links").clicked() {
                    actions.push(AppAction::DismissRegeneration(pending.connection));
                }
            });
        }
        if !shared.pending.is_empty() {
            ui.separator();
        }

        let diagnostics = shared.controller.diagnostics();
        ui.label(format!("{} links skipped", diagnostics.skipped_links()));
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if diagnostics.is_empty() {
                    ui.colored_label(Color32::GRAY, "No problems reported");
                }
                for entry in diagnostics.entries() {
                    let text = match entry.entity {
                        Some(id) => format!("{}: {}", id, entry.message),
                        None => entry.message.clone(),
                    };
                    ui.add(SeverityIndicator::new(entry.severity, text));
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
