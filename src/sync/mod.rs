//! Selection & sync controller
//!
//! Keeps the renderer's [`WorkingSet`] consistent with the live
//! [`NetworkModel`]. Entities enter the working set when toggled visible
//! (their layout is generated, or their pattern resolved) and leave it on
//! toggle-off, on a deletion notification, or when [`refresh_all`] finds
//! that the id no longer passes the model's liveness check.
//!
//! Nothing here fails the render path: problems become [`Diagnostics`]
//! entries and status events, and the previous cached geometry stays in
//! place.
//!
//! # Submodules
//!
//! - [`working_set`] - one record per visualised entity
//! - [`logs`] - recorded logs and their colour remap
//! - [`bridge`] - event channel to the UI thread
//!
//! [`refresh_all`]: SelectionController::refresh_all

pub mod bridge;
pub mod logs;
pub mod working_set;

pub use bridge::{view_channel, ViewEvent, ViewEventReceiver, ViewEventSender};
pub use logs::{find_log, log_file_name, remap_row, remap_value, LogData, VecLog};
pub use working_set::{ConnectionEntry, PopulationEntry, WorkingSet};

use std::sync::Arc;

use glam::Vec3;

use crate::config::{NeuronFocus, RuntimeSettings};
use crate::connectivity::{
    GenerationEvent, GenerationJob, GenerationWorker, GeneratorKind, RegenerationGate, Resolver,
};
use crate::error::{Diagnostics, Result, Severity, SpikeVizError};
use crate::model::{generate_layout, Entity, EntityId, LayoutKind, NetworkModel};
use crate::scene::{LinkColumn, SceneView};

/// Time cursor into the attached logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LogCursor {
    /// Step the colours currently reflect, `None` before the first update
    current: Option<usize>,
    requested: usize,
}

pub struct SelectionController {
    working: WorkingSet,
    selected: Option<EntityId>,
    settings: RuntimeSettings,
    diagnostics: Diagnostics,
    logs: Vec<Arc<dyn LogData>>,
    cursor: LogCursor,
    worker: Option<GenerationWorker>,
    events: ViewEventSender,
}

impl SelectionController {
    pub fn new(events: ViewEventSender) -> Self {
        Self {
            working: WorkingSet::new(),
            selected: None,
            settings: RuntimeSettings::new(),
            diagnostics: Diagnostics::new(),
            logs: Vec::new(),
            cursor: LogCursor::default(),
            worker: None,
            events,
        }
    }

    /// Regenerate stale explicit lists on `worker` instead of inline
    pub fn with_worker(mut self, worker: GenerationWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RuntimeSettings {
        &mut self.settings
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Everything the renderer needs for one frame
    pub fn scene_view<'a>(&'a self, model: &'a NetworkModel) -> SceneView<'a> {
        SceneView {
            model,
            working: &self.working,
            selected: self.selected,
            settings: &self.settings,
        }
    }

    // ==================== Visibility ====================

    /// Toggle an entity's visibility and bring the working set along.
    ///
    /// Fails only when the model rejects the toggle (stale id, or a
    /// projection, which has no visibility of its own).
    pub fn set_visualised(
        &mut self,
        model: &mut NetworkModel,
        id: EntityId,
        on: bool,
        gate: &dyn RegenerationGate,
    ) -> Result<()> {
        model.set_visualised(id, on)?;
        if on {
            tracing::info!("Visualising {}", id);
            self.add(model, id, gate);
        } else if self.working.remove(id) {
            tracing::info!("Stopped visualising {}", id);
        }
        self.events.request_redraw();
        Ok(())
    }

    /// Add every visualised entity missing from the working set and drop
    /// records whose entity is no longer visualised
    pub fn sync_visibility(&mut self, model: &NetworkModel, gate: &dyn RegenerationGate) {
        let wanted: Vec<EntityId> = model
            .populations()
            .filter(|(_, p)| p.visualised)
            .map(|(id, _)| id)
            .chain(
                model
                    .connections()
                    .filter(|(_, e)| e.visualised().unwrap_or(false))
                    .map(|(id, _)| id),
            )
            .collect();
        self.working.retain(|id| wanted.contains(&id));
        for id in wanted {
            if !self.working.contains(id) {
                self.add(model, id, gate);
            }
        }
        self.events.request_redraw();
    }

    fn add(&mut self, model: &NetworkModel, id: EntityId, gate: &dyn RegenerationGate) {
        match model.entity(id) {
            Some(Entity::Population(_)) => self.rebuild_population(model, id),
            Some(Entity::Synapse(_)) | Some(Entity::GenericInput(_)) => self.resolve_connection(model, id, gate),
            Some(Entity::Projection(_)) => {}
            None => self.report(Some(id), &SpikeVizError::StaleEntity(id)),
        }
    }

    /// Re-validate the whole working set against the model.
    ///
    /// Records whose id fails the liveness check, is marked deleted or is
    /// no longer visualised are removed as a unit. Layouts whose length
    /// differs from the neuron count (or whose strategy changed) are
    /// regenerated, overlays that no longer fit are dropped, and
    /// connections whose inputs moved on are resolved again.
    pub fn refresh_all(&mut self, model: &NetworkModel, gate: &dyn RegenerationGate) {
        let removed = self.working.retain(|id| {
            model.is_alive(id)
                && model
                    .entity(id)
                    .and_then(Entity::visualised)
                    .unwrap_or(false)
        });
        for id in &removed {
            tracing::debug!("Refresh removed stale {}", id);
        }
        if self.selected.map(|s| !model.is_alive(s)).unwrap_or(false) {
            self.select(model, None);
        }

        let population_ids: Vec<EntityId> = self.working.populations().iter().map(|e| e.id).collect();
        let mut resized = Vec::new();
        for id in population_ids {
            let Some(pop) = model.population(id) else {
                continue;
            };
            let needs_layout = self
                .working
                .population(id)
                .map(|e| e.layout.len() != pop.neuron_count || e.kind != pop.layout)
                .unwrap_or(true);
            if needs_layout {
                tracing::debug!("Layout of {} out of date, regenerating", id);
                self.rebuild_population(model, id);
                resized.push(id);
            }
        }

        let connection_ids: Vec<EntityId> = self.working.connections().iter().map(|e| e.id).collect();
        for id in connection_ids {
            let touches_resized = self
                .working
                .connection(id)
                .map(|c| resized.iter().any(|r| c.touches(*r)))
                .unwrap_or(false);
            if touches_resized {
                mark_layout_dependent_changed(model, id);
            }
            if self.connection_outdated(model, id) {
                self.resolve_connection(model, id, gate);
            }
        }
        self.events.request_redraw();
    }

    fn connection_outdated(&self, model: &NetworkModel, id: EntityId) -> bool {
        let Some(entry) = self.working.connection(id) else {
            return false;
        };
        let generation = |e| model.generation(e).unwrap_or(0);
        if generation(id) != entry.generation
            || generation(entry.src) != entry.src_generation
            || generation(entry.dst) != entry.dst_generation
        {
            return true;
        }
        match model.entity(id).and_then(Entity::pattern).and_then(|p| p.explicit()) {
            Some(explicit) => explicit.is_stale() || Some(explicit.version()) != entry.explicit_version,
            None => false,
        }
    }

    /// Deletion notification for every id in `ids`.
    ///
    /// Connections attached to a deleted population go with it.
    pub fn on_deleted(&mut self, model: &NetworkModel, ids: &[EntityId]) {
        let removed = self.working.retain(|id| !ids.contains(&id));
        let orphaned: Vec<EntityId> = self
            .working
            .connections()
            .iter()
            .filter(|c| ids.iter().any(|id| c.touches(*id)))
            .map(|c| c.id)
            .collect();
        for id in &orphaned {
            self.working.remove(*id);
        }
        tracing::debug!(
            "Deletion removed {} records and {} attached connections",
            removed.len(),
            orphaned.len()
        );
        if let Some(selected) = self.selected {
            if ids.contains(&selected) || orphaned.contains(&selected) {
                self.select(model, None);
            }
        }
        self.events.request_redraw();
    }

    // ==================== Selection ====================

    /// Change the selected entity; stale ids select nothing
    pub fn select(&mut self, model: &NetworkModel, id: Option<EntityId>) {
        let id = id.filter(|id| model.is_alive(*id));
        if id == self.selected {
            return;
        }
        self.selected = id;
        self.settings.reset_view_overrides();
        tracing::debug!("Selection changed to {:?}", id);
        self.events.send(ViewEvent::SelectionChanged(id));
        self.events.request_redraw();
    }

    pub fn set_neuron_focus(&mut self, focus: Option<NeuronFocus>) {
        if self.settings.neuron_focus != focus {
            self.settings.neuron_focus = focus;
            self.events.request_redraw();
        }
    }

    /// Add a connection table cell to the highlight selection
    pub fn select_table_cell(&mut self, row: usize, column: LinkColumn) {
        self.settings.table_selection.select(row, column);
        self.events.request_redraw();
    }

    pub fn clear_table_selection(&mut self) {
        if !self.settings.table_selection.is_empty() {
            self.settings.table_selection.clear();
            self.events.request_redraw();
        }
    }

    /// Report a neuron hit by a pick in the 3D view
    pub fn neuron_picked(&mut self, population: EntityId, neuron: usize) {
        tracing::debug!("Picked neuron {} of {}", neuron, population);
        self.events.send(ViewEvent::NeuronPicked { population, neuron });
    }

    // ==================== Model change notifications ====================

    /// A population's size, layout or position changed
    pub fn population_changed(&mut self, model: &NetworkModel, id: EntityId, gate: &dyn RegenerationGate) {
        if self.working.population(id).is_some() {
            self.rebuild_population(model, id);
        }
        let attached: Vec<EntityId> = self
            .working
            .connections()
            .iter()
            .filter(|c| c.touches(id))
            .map(|c| c.id)
            .collect();
        for conn in attached {
            mark_layout_dependent_changed(model, conn);
            self.resolve_connection(model, conn, gate);
        }
        self.events.request_redraw();
    }

    /// A connection's pattern or strength changed
    pub fn connection_changed(&mut self, model: &NetworkModel, id: EntityId, gate: &dyn RegenerationGate) {
        if self.working.connection(id).is_some() {
            self.resolve_connection(model, id, gate);
            self.events.request_redraw();
        }
    }

    /// Queue regeneration of an explicit connection list.
    ///
    /// With a worker the job runs in the background and the current links
    /// stay until [`poll_generation_events`](Self::poll_generation_events)
    /// sees it complete; without one the connection is resolved inline.
    pub fn regenerate_connection(
        &mut self,
        model: &NetworkModel,
        id: EntityId,
        gate: &dyn RegenerationGate,
    ) -> Result<()> {
        let entity = model.entity(id).ok_or(SpikeVizError::StaleEntity(id))?;
        let explicit = entity
            .pattern()
            .and_then(|p| p.explicit())
            .ok_or(SpikeVizError::WrongKind {
                id,
                expected: "explicit connection",
            })?;
        if let Some(worker) = &self.worker {
            let (src, dst) = model.connection_endpoints(id)?;
            explicit.mark_changed();
            return worker.submit(GenerationJob {
                connection: id,
                connections: explicit.clone(),
                src_layout: self.layout_for(model, src),
                dst_layout: self.layout_for(model, dst),
            });
        }
        explicit.mark_changed();
        self.resolve_connection(model, id, gate);
        self.events.request_redraw();
        Ok(())
    }

    /// Apply finished background generations, returns how many completed
    pub fn poll_generation_events(&mut self, model: &NetworkModel, gate: &dyn RegenerationGate) -> usize {
        let events = match &self.worker {
            Some(worker) => worker.drain(),
            None => return 0,
        };
        let mut completed = 0;
        for event in events {
            match event {
                GenerationEvent::Completed { connection, version } => {
                    tracing::debug!("Generation for {} finished at version {}", connection, version);
                    completed += 1;
                    if self.working.connection(connection).is_some() {
                        self.resolve_connection(model, connection, gate);
                    }
                }
                GenerationEvent::Unchanged { connection } => {
                    tracing::trace!("Generation for {} was already current", connection);
                }
                GenerationEvent::Failed { connection, error } => {
                    self.report(Some(connection), &SpikeVizError::Generator(error));
                }
            }
        }
        if completed > 0 {
            self.events.request_redraw();
        }
        completed
    }

    // ==================== Logs ====================

    /// Match `logs` to the visualised populations by file name
    pub fn attach_logs(&mut self, model: &NetworkModel, logs: Vec<Arc<dyn LogData>>) {
        self.logs = logs;
        let ids: Vec<EntityId> = self.working.populations().iter().map(|e| e.id).collect();
        for id in ids {
            let log = model
                .population(id)
                .and_then(|p| find_log(&self.logs, &p.name, &p.ports));
            if let Some(log) = &log {
                tracing::info!("Attached log {} to {}", log.name(), id);
            }
            let revision = self.working.next_revision();
            if let Some(entry) = self.working.population_mut(id) {
                entry.log = log;
                entry.colours = None;
                entry.revision = revision;
            }
        }
        self.cursor.current = None;
    }

    /// Move the log time cursor; colours follow on the next update
    pub fn set_log_time(&mut self, index: usize) {
        self.cursor.requested = index;
    }

    pub fn log_time(&self) -> usize {
        self.cursor.requested
    }

    /// Recolour populations from their logs if the time cursor moved.
    ///
    /// Returns whether anything was recomputed.
    pub fn update_logs(&mut self, model: &NetworkModel) -> bool {
        if self.cursor.current == Some(self.cursor.requested) {
            return false;
        }
        let time = self.cursor.requested;
        self.cursor.current = Some(time);

        let ids: Vec<EntityId> = self.working.populations().iter().map(|e| e.id).collect();
        for id in ids {
            let Some(count) = model.population(id).map(|p| p.neuron_count) else {
                continue;
            };
            let colours = match self.working.population(id).and_then(|e| e.log.clone()) {
                Some(log) => logs::remap_row(&log.row(time), log.min(), log.max(), count),
                None => continue,
            };
            let Some(colours) = colours else {
                continue;
            };
            let revision = self.working.next_revision();
            if let Some(entry) = self.working.population_mut(id) {
                entry.colours = Some(colours);
                entry.revision = revision;
            }
        }
        self.events.request_redraw();
        true
    }

    // ==================== Layout preview ====================

    /// Show `kind` applied to `id`'s neurons instead of the scene
    pub fn preview_layout(&mut self, model: &NetworkModel, id: EntityId, kind: LayoutKind) {
        let Some(pop) = model.population(id) else {
            self.report(Some(id), &SpikeVizError::StaleEntity(id));
            return;
        };
        let out = generate_layout(&kind, pop.neuron_count);
        for err in out.errors {
            self.report(Some(id), &SpikeVizError::Layout(err));
        }
        self.settings.layout_preview = Some(out.positions);
        self.events.request_redraw();
    }

    pub fn clear_layout_preview(&mut self) {
        if self.settings.layout_preview.take().is_some() {
            self.events.request_redraw();
        }
    }

    /// Draw the selected population at `offset` without committing it
    pub fn set_preview_offset(&mut self, offset: Option<Vec3>) {
        self.settings.preview_offset = offset;
        self.events.request_redraw();
    }

    // ==================== Internals ====================

    fn report(&mut self, entity: Option<EntityId>, err: &SpikeVizError) {
        tracing::warn!("{}", err);
        self.diagnostics.push_error(entity, err);
        self.events.status(err.severity(), err.to_string());
    }

    /// Current layout of `id`: the cached one when it still fits, else a
    /// freshly generated one
    fn layout_for(&self, model: &NetworkModel, id: EntityId) -> Vec<Vec3> {
        let Some(pop) = model.population(id) else {
            return Vec::new();
        };
        match self.working.population(id) {
            Some(entry) if entry.layout.len() == pop.neuron_count && entry.kind == pop.layout => entry.layout.clone(),
            _ => generate_layout(&pop.layout, pop.neuron_count).positions,
        }
    }

    fn rebuild_population(&mut self, model: &NetworkModel, id: EntityId) {
        let Some(pop) = model.population(id) else {
            self.working.remove(id);
            return;
        };
        let out = generate_layout(&pop.layout, pop.neuron_count);
        for err in &out.errors {
            self.report(Some(id), &SpikeVizError::Layout(err.clone()));
        }

        let previous = self.working.population(id);
        let colours = previous
            .and_then(|e| e.colours.clone())
            .filter(|c| c.len() == pop.neuron_count);
        let log = previous
            .and_then(|e| e.log.clone())
            .or_else(|| find_log(&self.logs, &pop.name, &pop.ports))
            .filter(|log| log.rows() == 0 || log.row(0).len() <= pop.neuron_count);

        self.working.upsert_population(PopulationEntry {
            id,
            layout: out.positions,
            kind: pop.layout,
            colours,
            log,
            generation: pop.generation,
            revision: 0,
        });
    }

    /// Resolve a connection into the working set.
    ///
    /// A declined or failed regeneration leaves the previous record as it
    /// was. With a worker, a stale explicit list is queued instead and the
    /// previous record (or an empty one) stays until the job completes.
    fn resolve_connection(&mut self, model: &NetworkModel, id: EntityId, gate: &dyn RegenerationGate) {
        let Some(pattern) = model.entity(id).filter(|e| !e.is_deleted()).and_then(Entity::pattern) else {
            self.working.remove(id);
            return;
        };
        let (src, dst) = match model.connection_endpoints(id) {
            Ok(ends) => ends,
            Err(err) => {
                self.report(Some(id), &err);
                self.working.remove(id);
                return;
            }
        };
        let src_layout = self.layout_for(model, src);
        let dst_layout = self.layout_for(model, dst);
        let generation = |e| model.generation(e).unwrap_or(0);

        if let Some(explicit) = pattern.explicit().filter(|e| e.is_stale()) {
            if let Some(worker) = &self.worker {
                let submitted = worker.submit(GenerationJob {
                    connection: id,
                    connections: explicit.clone(),
                    src_layout,
                    dst_layout,
                });
                if let Err(err) = submitted {
                    self.report(Some(id), &err);
                }
                if self.working.connection(id).is_none() {
                    self.working.upsert_connection(ConnectionEntry {
                        id,
                        src,
                        dst,
                        links: Vec::new(),
                        skipped: 0,
                        explicit_version: None,
                        generation: generation(id),
                        src_generation: generation(src),
                        dst_generation: generation(dst),
                        revision: 0,
                    });
                }
                return;
            }
        }

        let resolver = Resolver::new(gate);
        if let Some(explicit) = pattern.explicit() {
            if let Err(err) = resolver.refresh_explicit(id, explicit, &src_layout, &dst_layout) {
                self.report(Some(id), &err);
                return;
            }
        }

        let mut local = Diagnostics::new();
        let links = resolver.collect(id, pattern, &src_layout, &dst_layout, &mut local);
        let skipped = local.skipped_links();
        for entry in local.entries() {
            tracing::warn!("{}", entry.message);
            self.events.status(entry.severity, entry.message.clone());
        }
        self.diagnostics.merge(local);
        tracing::debug!("Resolved {} links for {} ({} skipped)", links.len(), id, skipped);

        self.working.upsert_connection(ConnectionEntry {
            id,
            src,
            dst,
            links,
            skipped,
            explicit_version: pattern.explicit().map(|e| e.version()),
            generation: generation(id),
            src_generation: generation(src),
            dst_generation: generation(dst),
            revision: 0,
        });
    }
}

/// Kernel and script lists depend on neuron positions; fixed lists do not
fn mark_layout_dependent_changed(model: &NetworkModel, connection: EntityId) {
    let explicit = model.entity(connection).and_then(Entity::pattern).and_then(|p| p.explicit());
    if let Some(explicit) = explicit.filter(|e| e.kind() != GeneratorKind::List) {
        explicit.mark_changed();
    }
}

/// Severity of the worst entry, `None` when empty
pub fn worst_severity(diagnostics: &Diagnostics) -> Option<Severity> {
    diagnostics.entries().iter().map(|d| d.severity).max()
}
