//! TabViewer implementation for the workspace
//!
//! Dispatches rendering to the pane state behind each tab.

use std::collections::HashMap;

use egui::{Ui, WidgetText};

use crate::config::{AppConfig, AppState};
use crate::frontend::gate::PendingRegeneration;
use crate::frontend::pane_trait::Pane;
use crate::frontend::state::{AppAction, SharedState};
use crate::model::NetworkModel;
use crate::scene::{Camera, Frame};
use crate::sync::SelectionController;

use super::{PaneEntry, PaneId};

/// Tab viewer that bridges egui_dock with our pane system.
///
/// Holds borrows of everything a pane may look at so that
/// SharedState can be constructed per tab inside ui().
pub struct WorkspaceTabViewer<'a> {
    pub model: &'a NetworkModel,
    pub controller: &'a SelectionController,
    pub frame: Option<&'a Frame>,
    pub camera: &'a Camera,
    pub config: &'a AppConfig,
    pub app_state: &'a mut AppState,
    pub pending: &'a [PendingRegeneration],
    // Workspace state
    pub pane_states: &'a mut HashMap<PaneId, Box<dyn Pane>>,
    pub pane_entries: &'a HashMap<PaneId, PaneEntry>,
    pub actions: Vec<AppAction>,
}

impl egui_dock::TabViewer for WorkspaceTabViewer<'_> {
    type Tab = PaneId;

    fn title(&mut self, tab: &mut PaneId) -> WidgetText {
        self.pane_entries
            .get(tab)
            .map(|e| WidgetText::from(&e.title))
            .unwrap_or_else(|| WidgetText::from("Unknown"))
    }

    fn ui(&mut self, ui: &mut Ui, tab: &mut PaneId) {
        let Some(state) = self.pane_states.get_mut(tab) else {
            ui.label("Pane state not found");
            return;
        };

        let mut shared = SharedState {
            model: self.model,
            controller: self.controller,
            frame: self.frame,
            camera: self.camera,
            config: self.config,
            app_state: self.app_state,
            pending: self.pending,
        };

        let pane_actions = state.render(&mut shared, ui);
        self.actions.extend(pane_actions);
    }

    fn on_close(&mut self, tab: &mut PaneId) -> egui_dock::widgets::tab_viewer::OnCloseResponse {
        self.actions.push(AppAction::ClosePane(*tab));
        egui_dock::widgets::tab_viewer::OnCloseResponse::Close
    }

    fn closeable(&mut self, _tab: &mut PaneId) -> bool {
        true
    }
}
