//! Small reusable widgets and colour helpers
//!
//! - [`SeverityIndicator`] - coloured dot with a message
//! - [`ColorSwatch`] - small coloured square for colour preview

use egui::{Color32, Response, Ui, Widget};

use crate::error::Severity;
use crate::types::Rgba;

pub fn to_color32(colour: Rgba) -> Color32 {
    let [r, g, b, a] = colour.to_rgba8();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => Color32::GRAY,
        Severity::Warning => Color32::YELLOW,
        Severity::Error => Color32::LIGHT_RED,
    }
}

/// A coloured dot followed by a message
pub struct SeverityIndicator {
    severity: Severity,
    label: String,
}

impl SeverityIndicator {
    pub fn new(severity: Severity, label: impl Into<String>) -> Self {
        Self {
            severity,
            label: label.into(),
        }
    }
}

impl Widget for SeverityIndicator {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.horizontal(|ui| {
            ui.colored_label(severity_color(self.severity), "●");
            ui.label(&self.label);
        })
        .response
    }
}

/// Small filled square
pub struct ColorSwatch {
    color: Color32,
    size: f32,
}

impl ColorSwatch {
    pub fn new(color: Color32) -> Self {
        Self { color, size: 12.0 }
    }
}

impl Widget for ColorSwatch {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(egui::vec2(self.size, self.size), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, self.color);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_color32() {
        assert_eq!(to_color32(Rgba::BLACK), Color32::from_rgba_unmultiplied(0, 0, 0, 255));
        assert_eq!(to_color32(Rgba::TRANSPARENT_WHITE).a(), 0);
    }
}
