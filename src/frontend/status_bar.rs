//! Status bar panel - bottom bar showing selection, frame and diagnostic info.
//!
//! Sits below the dock workspace area.

use egui::{Color32, RichText, Ui};

use crate::error::Severity;
use crate::frontend::widgets::severity_color;
use crate::model::NetworkModel;
use crate::scene::{Frame, RenderState};
use crate::sync::{worst_severity, SelectionController};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub model: &'a NetworkModel,
    pub controller: &'a SelectionController,
    pub frame: Option<&'a Frame>,
    pub render_state: RenderState,
    /// Redraw requests folded into an already pending one
    pub coalesced: u64,
    pub pending_confirmations: usize,
    pub last_status: Option<(Severity, &'a str)>,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Selection ===
        let selection = ctx
            .controller
            .selected()
            .and_then(|id| ctx.model.name(id).map(|name| format!("{} ({})", name, id)))
            .unwrap_or_else(|| "No selection".to_string());
        ui.label(RichText::new(selection).small());

        ui.separator();

        // === Scene ===
        let working = ctx.controller.working_set();
        ui.label(
            RichText::new(format!(
                "Visualised: {} populations, {} connections",
                working.populations().len(),
                working.connections().len()
            ))
            .small(),
        );

        if let Some(frame) = ctx.frame {
            ui.separator();
            ui.label(RichText::new(format!("Neurons: {}", frame.stats.neurons)).small());
            ui.label(RichText::new(format!("Links: {}", frame.stats.links)).small());
            if frame.stats.skipped_links > 0 {
                ui.colored_label(
                    Color32::YELLOW,
                    RichText::new(format!("Skipped: {}", frame.stats.skipped_links)).small(),
                );
            }
        }

        ui.separator();

        // === Render state ===
        let (state_color, state_text) = match ctx.render_state {
            RenderState::Idle => (Color32::GRAY, "Idle"),
            RenderState::RateLimited => (Color32::YELLOW, "Rate limited"),
            RenderState::Rendering => (Color32::GREEN, "Rendering"),
        };
        ui.colored_label(state_color, "●");
        ui.label(RichText::new(format!("{} ({} coalesced)", state_text, ctx.coalesced)).small());

        if ctx.pending_confirmations > 0 {
            ui.separator();
            ui.colored_label(
                Color32::YELLOW,
                RichText::new(format!("{} regeneration(s) awaiting confirmation", ctx.pending_confirmations)).small(),
            );
        }

        // === Right side: last message ===
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let Some((severity, message)) = ctx.last_status {
                ui.colored_label(severity_color(severity), RichText::new(message).small());
            } else if let Some(worst) = worst_severity(ctx.controller.diagnostics()) {
                let count = ctx.controller.diagnostics().entries().len();
                ui.colored_label(severity_color(worst), RichText::new(format!("{} diagnostics", count)).small());
            }
        });
    });
}
