//! Default workspace layout

use egui_dock::{DockState, NodeIndex};

use super::{PaneId, PaneKind, Workspace};

/// Build the default dock layout and return the DockState.
///
/// Layout:
/// ```text
/// ┌──────────────┬──────────────────────┬──────────────┐
/// │  Network     │ [3D View] [Diagram]  │  Inspector   │
/// │              │                      ├──────────────┤
/// │              ├──────────────────────┤  Links       │
/// │              │ Diagnostics          │              │
/// └──────────────┴──────────────────────┴──────────────┘
/// ```
pub fn build_default_layout(workspace: &mut Workspace) -> DockState<PaneId> {
    let mut register = |kind: PaneKind, title: &str| workspace.register_pane(kind, title);
    let scene = register(PaneKind::SceneView, "3D View");
    let diagram = register(PaneKind::Diagram, "Diagram");
    let entities = register(PaneKind::EntityList, "Network");
    let inspector = register(PaneKind::Inspector, "Inspector");
    let links = register(PaneKind::LinkTable, "Links");
    let diagnostics = register(PaneKind::Diagnostics, "Diagnostics");

    let mut dock = DockState::new(scene.into_iter().chain(diagram).collect());
    let surface = dock.main_surface_mut();

    let [center, _left] = surface.split_left(NodeIndex::root(), 0.22, entities.into_iter().collect());
    let [center, right] = surface.split_right(center, 0.72, inspector.into_iter().collect());
    surface.split_below(right, 0.5, links.into_iter().collect());
    surface.split_below(center, 0.78, diagnostics.into_iter().collect());

    dock
}
