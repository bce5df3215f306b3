//! Pane registry, the data-driven list of pane kinds.
//!
//! Display names, singleton flags and factory functions for every pane.
//! The View menu and workspace pane creation are driven from this data.

use crate::frontend::pane_trait::Pane;
use crate::frontend::panes::{
    DiagnosticsState, DiagramState, EntityListState, InspectorState, LinkTableState, SceneViewState,
};
use crate::frontend::workspace::PaneKind;

/// Metadata for a pane kind, including its factory function.
pub struct PaneKindInfo {
    pub kind: PaneKind,
    pub display_name: &'static str,
    pub is_singleton: bool,
    pub factory: fn() -> Box<dyn Pane>,
}

/// Build the pane registry with all known pane kinds.
pub fn build_registry() -> Vec<PaneKindInfo> {
    vec![
        PaneKindInfo {
            kind: PaneKind::EntityList,
            display_name: "Network",
            is_singleton: true,
            factory: || Box::new(EntityListState::default()),
        },
        PaneKindInfo {
            kind: PaneKind::Inspector,
            display_name: "Inspector",
            is_singleton: true,
            factory: || Box::new(InspectorState::default()),
        },
        PaneKindInfo {
            kind: PaneKind::LinkTable,
            display_name: "Links",
            is_singleton: true,
            factory: || Box::new(LinkTableState::default()),
        },
        PaneKindInfo {
            kind: PaneKind::Diagnostics,
            display_name: "Diagnostics",
            is_singleton: true,
            factory: || Box::new(DiagnosticsState::default()),
        },
        // Views (multiple instances allowed)
        PaneKindInfo {
            kind: PaneKind::Diagram,
            display_name: "Diagram",
            is_singleton: false,
            factory: || Box::new(DiagramState::default()),
        },
        PaneKindInfo {
            kind: PaneKind::SceneView,
            display_name: "3D View",
            is_singleton: true,
            factory: || Box::new(SceneViewState::default()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_kinds_are_unique_and_match_factories() {
        let registry = build_registry();
        let kinds: HashSet<_> = registry.iter().map(|i| i.kind).collect();
        assert_eq!(kinds.len(), registry.len());
        for info in &registry {
            assert_eq!((info.factory)().kind(), info.kind);
        }
    }
}
