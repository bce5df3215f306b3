//! Runtime view settings
//!
//! State that changes while the application runs and is never persisted:
//! which neuron is focused, whether a frame is being rendered for image
//! export, and the layout preview overrides.

use glam::Vec3;

use crate::scene::TableSelection;
use crate::types::NeuronSide;

/// A single neuron whose links should be highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeuronFocus {
    pub side: NeuronSide,
    pub index: u32,
}

/// Output size of an image export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTarget {
    pub width: u32,
    pub height: u32,
}

impl ExportTarget {
    /// Line widths scale with the larger image side, 1.0 at 1000 pixels
    pub fn line_scale(&self) -> f32 {
        self.width.max(self.height) as f32 / 1000.0
    }
}

/// Non-persisted view state shared by the controller and the renderer
#[derive(Debug, Clone, Default)]
pub struct RuntimeSettings {
    /// Highlight every link touching this neuron of the selected connection
    pub neuron_focus: Option<NeuronFocus>,

    /// Rows and columns picked in the connection table
    pub table_selection: TableSelection,

    /// Set while a frame is rendered for image export
    pub export: Option<ExportTarget>,

    /// Candidate neuron positions shown instead of the scene
    pub layout_preview: Option<Vec<Vec3>>,

    /// Uncommitted scene position of the selected population
    pub preview_offset: Option<Vec3>,
}

impl RuntimeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    pub fn line_scale(&self) -> f32 {
        self.export.map(|e| e.line_scale()).unwrap_or(1.0)
    }

    pub fn is_previewing_layout(&self) -> bool {
        self.layout_preview.as_ref().map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// Drop every transient override
    pub fn reset_view_overrides(&mut self) {
        self.neuron_focus = None;
        self.table_selection.clear();
        self.layout_preview = None;
        self.preview_offset = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_scale() {
        let mut settings = RuntimeSettings::new();
        assert_eq!(settings.line_scale(), 1.0);
        settings.export = Some(ExportTarget {
            width: 1200,
            height: 3000,
        });
        assert_eq!(settings.line_scale(), 3.0);
        assert!(settings.is_exporting());
    }

    #[test]
    fn test_preview_flags() {
        let mut settings = RuntimeSettings::new();
        assert!(!settings.is_previewing_layout());
        settings.layout_preview = Some(Vec::new());
        assert!(!settings.is_previewing_layout());
        settings.layout_preview = Some(vec![Vec3::ZERO]);
        assert!(settings.is_previewing_layout());

        settings.preview_offset = Some(Vec3::ONE);
        settings.reset_view_overrides();
        assert!(settings.layout_preview.is_none());
        assert!(settings.preview_offset.is_none());
    }
}
