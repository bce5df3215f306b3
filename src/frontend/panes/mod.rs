//! Pane modules for the workspace
//!
//! Each pane state implements [`Pane`](crate::frontend::pane_trait::Pane),
//! reads through `SharedState` and returns `Vec<AppAction>` instead of
//! mutating state directly.

pub mod diagnostics;
pub mod diagram;
pub mod entity_list;
pub mod inspector;
pub mod link_table;
pub mod scene_view;

pub use diagnostics::DiagnosticsState;
pub use diagram::DiagramState;
pub use entity_list::EntityListState;
pub use inspector::InspectorState;
pub use link_table::LinkTableState;
pub use scene_view::SceneViewState;
