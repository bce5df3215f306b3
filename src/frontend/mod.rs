//! Frontend module for egui UI
//!
//! This module provides the editor's UI using eframe/egui. The app owns
//! the [`NetworkModel`] and the [`SelectionController`]; panes only read
//! them and hand back [`AppAction`]s, which the app applies after the dock
//! area has been drawn.
//!
//! # Architecture
//!
//! The frontend uses an egui_dock workspace where every UI element is a pane:
//! entity list, diagram, 3D view, inspector, link table and diagnostics.
//! Panes can be rearranged via drag-and-drop docking.
//!
//! # Main Types
//!
//! - [`SpikeVizApp`] - Main application state implementing [`eframe::App`]
//! - [`Workspace`] - Dock state and pane management
//! - [`ConfirmGate`] - Non-blocking regeneration confirmation
//!
//! # Submodules
//!
//! - `workspace` - Dock workspace, tab viewer, default layout
//! - `panes` - Individual pane states and render functions
//! - `status_bar` - Bottom status bar
//! - `widgets` - Custom UI widgets (severity indicators, swatches)

pub mod gate;
pub mod pane_registry;
pub mod pane_trait;
pub mod panes;
pub mod state;
pub mod status_bar;
pub mod widgets;
pub mod workspace;

pub use gate::{ConfirmGate, PendingRegeneration};
pub use state::{AppAction, SharedState};
pub use widgets::*;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use status_bar::{render_status_bar, StatusBarContext};
use workspace::tab_viewer::WorkspaceTabViewer;
use workspace::Workspace;

use crate::config::{ensure_app_data_dir, AppConfig, AppState, ExportTarget};
use crate::connectivity::GenerationWorker;
use crate::error::{Result, ResultExt, Severity, SpikeVizError};
use crate::model::{EntityId, NetworkModel};
use crate::scene::{export_svg, Frame, SceneRenderer, Viewport};
use crate::sync::{view_channel, LogData, SelectionController, ViewEvent, ViewEventReceiver};

/// Viewport used until the 3D pane reports its size
const INITIAL_VIEWPORT: Viewport = Viewport {
    width: 800.0,
    height: 600.0,
};

/// Main application state for the network editor
pub struct SpikeVizApp {
    // === Model and sync ===
    model: NetworkModel,
    controller: SelectionController,
    events: ViewEventReceiver,
    gate: ConfirmGate,

    // === Scene ===
    renderer: SceneRenderer,
    frame: Option<Frame>,
    viewport: Viewport,
    redraw_requested: bool,

    // === Shared State ===
    config: AppConfig,
    app_state: AppState,
    last_status: Option<(Severity, String)>,
    last_log_poll: Instant,

    // === Workspace ===
    workspace: Workspace,
}

impl SpikeVizApp {
    /// Create a new application instance
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        model: NetworkModel,
        config: AppConfig,
        app_state: AppState,
        logs: Vec<Arc<dyn LogData>>,
    ) -> Self {
        if app_state.dark_mode {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
        } else {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
        }
        Self::with_model(model, config, app_state, logs)
    }

    /// Everything but the egui context setup
    pub fn with_model(model: NetworkModel, config: AppConfig, app_state: AppState, logs: Vec<Arc<dyn LogData>>) -> Self {
        let (tx, events) = view_channel();
        let mut controller = SelectionController::new(tx);

        // Confirmation only applies to inline regeneration, so the
        // background worker is used when nobody needs to be asked.
        let gate = ConfirmGate::new(config.generation.confirm_regeneration);
        if !config.generation.confirm_regeneration {
            match GenerationWorker::spawn(config.generation.channel_capacity) {
                Ok(worker) => controller = controller.with_worker(worker),
                Err(e) => tracing::warn!("Failed to start generation worker, generating inline: {}", e),
            }
        }
        controller.attach_logs(&model, logs);
        controller.sync_visibility(&model, &gate);

        let mut renderer = SceneRenderer::new(&config);
        renderer.camera.orthographic = app_state.orthographic;

        let mut workspace = Workspace::new();
        let dock_state = workspace::default_layout::build_default_layout(&mut workspace);
        workspace.dock_state = dock_state;

        Self {
            model,
            controller,
            events,
            gate,
            renderer,
            frame: None,
            viewport: INITIAL_VIEWPORT,
            redraw_requested: true,
            config,
            app_state,
            last_status: None,
            last_log_poll: Instant::now(),
            workspace,
        }
    }

    pub fn model(&self) -> &NetworkModel {
        &self.model
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    fn process_view_events(&mut self) {
        for event in self.events.drain() {
            match event {
                ViewEvent::RedrawRequested => self.redraw_requested = true,
                ViewEvent::SelectionChanged(id) => {
                    tracing::debug!("Selection changed to {:?}", id);
                    self.redraw_requested = true;
                }
                ViewEvent::NeuronPicked { population, neuron } => {
                    let name = self.model.name(population).unwrap_or("?").to_string();
                    self.last_status = Some((Severity::Info, format!("Picked neuron {} of {}", neuron, name)));
                }
                ViewEvent::Status { severity, message } => {
                    self.last_status = Some((severity, message));
                }
            }
        }
    }

    /// Advance background work: finished generations and the log cursor
    fn poll_background(&mut self) {
        self.controller.poll_generation_events(&self.model, &self.gate);

        let now = Instant::now();
        if now.saturating_duration_since(self.last_log_poll) >= self.config.logs.poll_interval() {
            self.last_log_poll = now;
            if self.controller.update_logs(&self.model) {
                self.redraw_requested = true;
            }
        }
    }

    /// Build a new frame if one was requested and the limiter allows it
    fn refresh_frame(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let start = if std::mem::take(&mut self.redraw_requested) {
            self.renderer.limiter_mut().request(now)
        } else {
            self.renderer.limiter_mut().poll(now)
        };
        if start {
            let view = self.controller.scene_view(&self.model);
            self.frame = Some(self.renderer.render(&view, self.viewport));
            self.renderer.limiter_mut().finish(Instant::now());
        }
        if let Some(wait) = self.renderer.limiter().time_until_ready(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }

    fn report(&mut self, what: &str, err: SpikeVizError) {
        tracing::warn!("{}: {}", what, err);
        self.last_status = Some((Severity::Error, format!("{}: {}", what, err)));
    }

    fn handle_action(&mut self, action: AppAction) {
        let gate = &self.gate;
        match action {
            AppAction::SetVisualised { id, on } => {
                if let Err(e) = self.controller.set_visualised(&mut self.model, id, on, gate) {
                    self.report("Failed to toggle visibility", e);
                }
            }
            AppAction::MoveControlPoint { edge, point, cursor } => {
                if let Err(e) = self.model.move_control_point(edge, point, cursor) {
                    self.report("Failed to move control point", e);
                }
            }
            AppAction::MovePopulation { id, delta } => {
                if let Err(e) = self.model.move_population(id, delta) {
                    self.report("Failed to move population", e);
                }
            }
            AppAction::SetNeuronCount { id, count } => match self.model.set_neuron_count(id, count) {
                Ok(()) => self.controller.population_changed(&self.model, id, gate),
                Err(e) => self.report("Failed to set neuron count", e),
            },
            AppAction::SetLayout { id, layout } => match self.model.set_layout(id, layout) {
                Ok(()) => {
                    self.controller.clear_layout_preview();
                    self.controller.population_changed(&self.model, id, gate);
                }
                Err(e) => self.report("Failed to set layout", e),
            },
            AppAction::SetStrength { id, strength } => match self.model.set_strength(id, strength) {
                Ok(()) => self.controller.connection_changed(&self.model, id, gate),
                Err(e) => self.report("Failed to set curve strength", e),
            },
            AppAction::Delete(id) => self.delete(id),

            AppAction::Select(id) => self.controller.select(&self.model, id),
            AppAction::SelectTableCell { row, column } => self.controller.select_table_cell(row, column),
            AppAction::ClearTableSelection => self.controller.clear_table_selection(),
            AppAction::SetNeuronFocus(focus) => self.controller.set_neuron_focus(focus),

            AppAction::ResizeViewport(viewport) => {
                self.viewport = viewport;
                self.redraw_requested = true;
            }
            AppAction::Zoom(delta) => {
                self.renderer.camera.wheel(delta);
                self.redraw_requested = true;
            }
            AppAction::Drag { button, delta } => {
                self.renderer.camera.drag(button, delta);
                self.redraw_requested = true;
            }
            AppAction::Pick(cursor) => {
                let hit = self.frame.as_ref().and_then(|frame| self.renderer.pick(frame, cursor));
                if let Some(hit) = hit {
                    self.controller.neuron_picked(hit.population, hit.neuron);
                }
            }
            AppAction::ResetCamera => {
                self.renderer.camera.reset();
                self.redraw_requested = true;
            }
            AppAction::SetOrthographic(on) => {
                self.renderer.camera.orthographic = on;
                self.app_state.orthographic = on;
                self.redraw_requested = true;
            }
            AppAction::ExportImage => match self.export_image() {
                Ok(path) => {
                    self.last_status = Some((Severity::Info, format!("Exported {}", path.display())));
                }
                Err(e) => self.report("Image export failed", e),
            },

            AppAction::PreviewLayout { id, layout } => self.controller.preview_layout(&self.model, id, layout),
            AppAction::ClearLayoutPreview => self.controller.clear_layout_preview(),
            AppAction::SetPreviewOffset(offset) => self.controller.set_preview_offset(offset),
            AppAction::CommitPreviewOffset => self.commit_preview_offset(),

            AppAction::RegenerateConnection(id) => {
                // A button press is the user's confirmation
                gate.approve(id);
                if let Err(e) = self.controller.regenerate_connection(&self.model, id, gate) {
                    self.report("Failed to regenerate connection", e);
                }
            }
            AppAction::ApproveRegeneration(id) => {
                gate.approve(id);
                self.controller.connection_changed(&self.model, id, gate);
            }
            AppAction::DismissRegeneration(id) => gate.dismiss(id),

            AppAction::SetLogTime(index) => {
                self.controller.set_log_time(index);
                if self.controller.update_logs(&self.model) {
                    self.redraw_requested = true;
                }
            }

            AppAction::OpenPane(kind) => self.workspace.open(kind),
            AppAction::ClosePane(id) => self.workspace.remove_pane(id),
        }
    }

    fn delete(&mut self, id: EntityId) {
        if self.controller.selected() == Some(id) {
            self.controller.select(&self.model, None);
        }
        let removed = self.model.remove(id);
        if removed.is_empty() {
            return;
        }
        tracing::info!("Deleted {} entities", removed.len());
        self.controller.on_deleted(&self.model, &removed);
        for dead in &removed {
            self.gate.dismiss(*dead);
        }
    }

    fn commit_preview_offset(&mut self) {
        let (Some(id), Some(offset)) = (self.controller.selected(), self.controller.settings().preview_offset) else {
            return;
        };
        match self.model.set_scene_position(id, offset) {
            Ok(()) => {
                self.controller.set_preview_offset(None);
                self.controller.population_changed(&self.model, id, &self.gate);
            }
            Err(e) => self.report("Failed to move population", e),
        }
    }

    /// Render one frame at export size and write it under the data directory
    fn export_image(&mut self) -> Result<PathBuf> {
        let target = ExportTarget {
            width: self.config.render.export_width,
            height: self.config.render.export_height,
        };
        self.controller.settings_mut().export = Some(target);
        let frame = {
            let view = self.controller.scene_view(&self.model);
            self.renderer
                .render(&view, Viewport::new(target.width as f32, target.height as f32))
        };
        self.controller.settings_mut().export = None;
        // Cached batches were built with export line widths
        self.renderer.invalidate_all();
        self.redraw_requested = true;

        let dir = ensure_app_data_dir()?.join("exports");
        std::fs::create_dir_all(&dir)
            .map_err(SpikeVizError::from)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = dir.join(format!("scene-{}.svg", stamp));
        export_svg(&frame, &path)?;
        Ok(path)
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::Key;

        // Leave keys alone while a text field has focus
        if ctx.wants_keyboard_input() {
            return;
        }

        let mut actions = Vec::new();
        ctx.input(|i| {
            if i.key_pressed(Key::Delete) {
                if let Some(id) = self.controller.selected() {
                    actions.push(AppAction::Delete(id));
                }
            }
            if i.key_pressed(Key::Escape) {
                actions.push(AppAction::ClearTableSelection);
                actions.push(AppAction::Select(None));
            }
            if i.key_pressed(Key::Home) {
                actions.push(AppAction::ResetCamera);
            }
            if i.key_pressed(Key::E) && i.modifiers.command_only() {
                actions.push(AppAction::ExportImage);
            }
        });

        for action in actions {
            self.handle_action(action);
        }
    }

    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export Image").clicked() {
                        actions.push(AppAction::ExportImage);
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    for (kind, name) in self.workspace.menu_entries() {
                        if ui.button(name).clicked() {
                            actions.push(AppAction::OpenPane(kind));
                            ui.close();
                        }
                    }

                    ui.separator();

                    if ui.checkbox(&mut self.app_state.dark_mode, "Dark mode").changed() {
                        let visuals = if self.app_state.dark_mode {
                            egui::Visuals::dark()
                        } else {
                            egui::Visuals::light()
                        };
                        ui.ctx().set_visuals(visuals);
                    }
                    ui.checkbox(&mut self.app_state.show_population_indices, "Population indices");
                    if ui.button("Reset 3D view").clicked() {
                        actions.push(AppAction::ResetCamera);
                        ui.close();
                    }
                });

                ui.menu_button("Scene", |ui| {
                    if ui.button("Refresh all").clicked() {
                        self.controller.refresh_all(&self.model, &self.gate);
                        ui.close();
                    }
                    let mut confirm = self.config.generation.confirm_regeneration;
                    if ui.checkbox(&mut confirm, "Confirm regeneration").changed() {
                        self.config.generation.confirm_regeneration = confirm;
                        self.gate.set_ask(confirm);
                    }
                });
            });
        });

        for action in actions {
            self.handle_action(action);
        }
    }
}

impl eframe::App for SpikeVizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_view_events();
        self.poll_background();
        self.handle_keyboard_shortcuts(ctx);
        self.refresh_frame(ctx);

        // Keep polling for finished background generations
        if !self.controller.working_set().is_empty() {
            ctx.request_repaint_after(self.config.logs.poll_interval());
        }

        self.render_menu_bar(ctx);

        // Status bar
        let pending = self.gate.pending();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let status_ctx = StatusBarContext {
                model: &self.model,
                controller: &self.controller,
                frame: self.frame.as_ref(),
                render_state: self.renderer.limiter().state(),
                coalesced: self.renderer.limiter().coalesced(),
                pending_confirmations: pending.len(),
                last_status: self.last_status.as_ref().map(|(s, m)| (*s, m.as_str())),
            };
            render_status_bar(ui, &status_ctx);
        });

        // Dock workspace
        {
            let mut viewer = WorkspaceTabViewer {
                model: &self.model,
                controller: &self.controller,
                frame: self.frame.as_ref(),
                camera: &self.renderer.camera,
                config: &self.config,
                app_state: &mut self.app_state,
                pending: &pending,
                pane_states: &mut self.workspace.pane_states,
                pane_entries: &self.workspace.pane_entries,
                actions: Vec::new(),
            };

            egui_dock::DockArea::new(&mut self.workspace.dock_state)
                .style(egui_dock::Style::from_egui(ctx.style().as_ref()))
                .show(ctx, &mut viewer);

            let actions = viewer.actions;
            if !actions.is_empty() {
                ctx.request_repaint();
            }
            for action in actions {
                self.handle_action(action);
            }
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.app_state.orthographic = self.renderer.camera.orthographic;
        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to save app state: {}", e);
        }
    }
}
