//! Shared state types for the frontend
//!
//! Panes receive a [`SharedState`] of borrowed, read-only views onto the
//! model and controller and return [`AppAction`]s. Only the app mutates
//! the model, so every edit goes through the controller's notifications.

use glam::{Vec2, Vec3};

use crate::config::{AppConfig, AppState, NeuronFocus};
use crate::curves::ControlPoint;
use crate::frontend::gate::PendingRegeneration;
use crate::model::{EntityId, LayoutKind, NetworkModel};
use crate::scene::{Camera, DragButton, Frame, LinkColumn, Viewport};
use crate::sync::SelectionController;

use super::workspace::{PaneId, PaneKind};

/// Shared state accessible by all panes (borrowed, not owned).
pub struct SharedState<'a> {
    pub model: &'a NetworkModel,
    pub controller: &'a SelectionController,
    /// Last frame built by the renderer
    pub frame: Option<&'a Frame>,
    pub camera: &'a Camera,
    pub config: &'a AppConfig,
    pub app_state: &'a mut AppState,
    pub pending: &'a [PendingRegeneration],
}

/// Actions that panes can emit
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    // Model edits
    /// Toggle whether an entity is drawn in the 3D scene
    SetVisualised { id: EntityId, on: bool },
    /// Drag a control point of an edge to a diagram position
    MoveControlPoint {
        edge: EntityId,
        point: ControlPoint,
        cursor: Vec2,
    },
    /// Move a population footprint in the diagram
    MovePopulation { id: EntityId, delta: Vec2 },
    SetNeuronCount { id: EntityId, count: usize },
    SetLayout { id: EntityId, layout: LayoutKind },
    SetStrength { id: EntityId, strength: u32 },
    /// Delete an entity and everything hanging off it
    Delete(EntityId),

    // Selection
    Select(Option<EntityId>),
    SelectTableCell { row: usize, column: LinkColumn },
    ClearTableSelection,
    SetNeuronFocus(Option<NeuronFocus>),

    // 3D view
    /// Size of the 3D viewport in pixels changed
    ResizeViewport(Viewport),
    Zoom(f32),
    Drag { button: DragButton, delta: Vec2 },
    /// Pick the neuron under a viewport-relative cursor
    Pick(Vec2),
    ResetCamera,
    SetOrthographic(bool),
    ExportImage,

    // Layout preview
    PreviewLayout { id: EntityId, layout: LayoutKind },
    ClearLayoutPreview,
    SetPreviewOffset(Option<Vec3>),
    /// Write the preview offset into the selected population's position
    CommitPreviewOffset,

    // Explicit connections
    RegenerateConnection(EntityId),
    ApproveRegeneration(EntityId),
    DismissRegeneration(EntityId),

    // Logs
    SetLogTime(usize),

    // Workspace actions
    /// Open/focus a singleton pane, or create if not exists
    OpenPane(PaneKind),
    /// Close a pane (remove from dock and clean up state)
    ClosePane(PaneId),
}
