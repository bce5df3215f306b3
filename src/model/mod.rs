//! Network model graph
//!
//! # Main Types
//!
//! - [`NetworkModel`] - owns every entity in generational slot storage
//! - [`EntityId`] - index + generation handle, checked with
//!   [`NetworkModel::is_valid`] before every use
//! - [`Entity`] - tagged variant over the four entity kinds
//! - [`RelationTable`] - edge endpoints, queried in both directions
//!
//! # Liveness
//!
//! An id is *valid* while its slot still holds the entity it was issued
//! for. An entity is *alive* when it is valid and not marked deleted.
//! Marking deleted is reversible (undo keeps the entity around);
//! [`NetworkModel::remove`] frees the slot and invalidates every copy of
//! the id.
//!
//! # Generations
//!
//! Every drawable change stamps the entity with a fresh value from one
//! model-wide counter. Caches compare the stamp they built from with the
//! current one instead of listening for change notifications.

pub mod entity;
pub mod id;
pub mod layout;
pub mod relations;
pub mod sample;

pub use entity::{
    Entity, EntityKind, GenericInput, Population, Projection, Synapse, DEFAULT_POPULATION_SIZE,
};
pub use id::EntityId;
pub use layout::{generate_layout, LayoutGenerator, LayoutKind, LayoutOutput};
pub use relations::{Endpoints, RelationTable};
pub use sample::sample_network;

use glam::{Vec2, Vec3};

use crate::connectivity::{generator_from_metadata, ConnectivityPattern, ExplicitConnections};
use crate::curves::{self, Anchor, EdgeMetaRecord, EdgePath, MetaDocument};
use crate::error::{Diagnostics, Result, Severity, SpikeVizError};

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkModel {
    slots: Vec<Slot>,
    free: Vec<u32>,
    relations: RelationTable,
    /// Populations in creation order, defines population indices
    population_order: Vec<EntityId>,
    /// Synapses and generic inputs in creation order
    connection_order: Vec<EntityId>,
    generation_counter: u64,
}

impl NetworkModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&mut self) -> u64 {
        self.generation_counter += 1;
        self.generation_counter
    }

    fn insert(&mut self, mut entity: Entity) -> EntityId {
        let stamp = self.next_generation();
        entity.set_generation(stamp);
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entity = Some(entity);
                EntityId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entity: Some(entity),
                });
                EntityId::new((self.slots.len() - 1) as u32, 0)
            }
        }
    }

    // ==================== Liveness ====================

    /// True while `id` still refers to the entity it was issued for
    pub fn is_valid(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index())
            .map(|s| s.generation == id.generation() && s.entity.is_some())
            .unwrap_or(false)
    }

    /// Valid and not marked deleted
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entity(id).map(|e| !e.is_deleted()).unwrap_or(false)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_mut()
    }

    fn alive_entity(&self, id: EntityId) -> Result<&Entity> {
        match self.entity(id) {
            Some(e) if !e.is_deleted() => Ok(e),
            _ => Err(SpikeVizError::StaleEntity(id)),
        }
    }

    // ==================== Typed access ====================

    pub fn population(&self, id: EntityId) -> Option<&Population> {
        match self.entity(id)? {
            Entity::Population(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable access; call [`NetworkModel::touch`] after drawable changes
    pub fn population_mut(&mut self, id: EntityId) -> Option<&mut Population> {
        match self.entity_mut(id)? {
            Entity::Population(p) => Some(p),
            _ => None,
        }
    }

    pub fn projection(&self, id: EntityId) -> Option<&Projection> {
        match self.entity(id)? {
            Entity::Projection(p) => Some(p),
            _ => None,
        }
    }

    pub fn synapse(&self, id: EntityId) -> Option<&Synapse> {
        match self.entity(id)? {
            Entity::Synapse(s) => Some(s),
            _ => None,
        }
    }

    pub fn synapse_mut(&mut self, id: EntityId) -> Option<&mut Synapse> {
        match self.entity_mut(id)? {
            Entity::Synapse(s) => Some(s),
            _ => None,
        }
    }

    pub fn generic_input(&self, id: EntityId) -> Option<&GenericInput> {
        match self.entity(id)? {
            Entity::GenericInput(g) => Some(g),
            _ => None,
        }
    }

    pub fn generic_input_mut(&mut self, id: EntityId) -> Option<&mut GenericInput> {
        match self.entity_mut(id)? {
            Entity::GenericInput(g) => Some(g),
            _ => None,
        }
    }

    fn expect_population(&self, id: EntityId) -> Result<&Population> {
        match self.alive_entity(id)? {
            Entity::Population(p) => Ok(p),
            _ => Err(SpikeVizError::WrongKind {
                id,
                expected: EntityKind::Population.label(),
            }),
        }
    }

    /// Geometry generation of `id`, `None` for stale ids
    pub fn generation(&self, id: EntityId) -> Option<u64> {
        self.entity(id).map(Entity::generation)
    }

    /// Display name of populations and projections
    pub fn name(&self, id: EntityId) -> Option<&str> {
        match self.entity(id)? {
            Entity::Population(p) => Some(&p.name),
            Entity::Projection(p) => Some(&p.name),
            _ => None,
        }
    }

    pub fn find_population(&self, name: &str) -> Option<EntityId> {
        self.population_order
            .iter()
            .copied()
            .find(|id| self.population(*id).map(|p| p.name == name).unwrap_or(false))
    }

    /// Live populations in creation order
    pub fn populations(&self) -> impl Iterator<Item = (EntityId, &Population)> + '_ {
        self.population_order
            .iter()
            .filter_map(move |id| self.population(*id).filter(|p| !p.deleted).map(|p| (*id, p)))
    }

    /// Position of `id` in [`NetworkModel::populations`]
    pub fn population_index(&self, id: EntityId) -> Option<usize> {
        self.populations().position(|(pid, _)| pid == id)
    }

    /// Live projections in relation-table order
    pub fn projections(&self) -> impl Iterator<Item = (EntityId, &Projection)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match &slot.entity {
            Some(Entity::Projection(p)) if !p.deleted => Some((EntityId::new(i as u32, slot.generation), p)),
            _ => None,
        })
    }

    /// Live synapses and generic inputs in creation order
    pub fn connections(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.connection_order
            .iter()
            .filter_map(move |id| self.entity(*id).filter(|e| !e.is_deleted()).map(|e| (*id, e)))
    }

    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    pub fn endpoints(&self, edge: EntityId) -> Option<Endpoints> {
        self.relations.endpoints(edge)
    }

    /// Source and destination populations of a synapse or generic input
    pub fn connection_endpoints(&self, connection: EntityId) -> Result<(EntityId, EntityId)> {
        let edge = match self.alive_entity(connection)? {
            Entity::Synapse(s) => s.projection,
            Entity::GenericInput(_) => connection,
            _ => {
                return Err(SpikeVizError::WrongKind {
                    id: connection,
                    expected: "synapse or generic input",
                })
            }
        };
        let ends = self
            .relations
            .endpoints(edge)
            .ok_or(SpikeVizError::StaleEntity(edge))?;
        for end in [ends.source, ends.destination] {
            self.expect_population(end)?;
        }
        Ok((ends.source, ends.destination))
    }

    /// How the curve code sees `id` as an edge endpoint
    pub fn anchor(&self, id: EntityId) -> Option<Anchor> {
        match self.entity(id)? {
            Entity::Population(p) => Some(Anchor::Population {
                id,
                bounds: p.bounds(),
            }),
            Entity::Projection(p) => Some(Anchor::Projection {
                id,
                location: p.path.midpoint(),
                destination: self.relations.endpoints(id)?.destination,
                tail_c2: p.path.last_c2(),
            }),
            _ => None,
        }
    }

    // ==================== Construction ====================

    pub fn add_population(&mut self, name: impl Into<String>, neuron_count: usize, location: Vec2) -> EntityId {
        let id = self.insert(Entity::Population(Population::new(name, neuron_count, location)));
        self.population_order.push(id);
        tracing::debug!("Added population {}", id);
        id
    }

    pub fn add_projection(&mut self, name: impl Into<String>, src: EntityId, dst: EntityId) -> Result<EntityId> {
        self.expect_population(src)?;
        self.expect_population(dst)?;
        let path = self.initial_path(src, dst)?;
        let id = self.insert(Entity::Projection(Projection {
            name: name.into(),
            path,
            synapses: Vec::new(),
            deleted: false,
            generation: 0,
        }));
        self.relations.insert(id, src, dst);
        tracing::debug!("Added projection {} ({} -> {})", id, src, dst);
        Ok(id)
    }

    pub fn add_synapse(&mut self, projection: EntityId, pattern: ConnectivityPattern) -> Result<EntityId> {
        match self.alive_entity(projection)? {
            Entity::Projection(_) => {}
            _ => {
                return Err(SpikeVizError::WrongKind {
                    id: projection,
                    expected: EntityKind::Projection.label(),
                })
            }
        }
        let center = self.default_center(projection);
        let id = self.insert(Entity::Synapse(Synapse {
            projection,
            pattern,
            strength: 0,
            center,
            visualised: false,
            colour_by_metric: false,
            deleted: false,
            generation: 0,
        }));
        if let Some(Entity::Projection(p)) = self.entity_mut(projection) {
            p.synapses.push(id);
        }
        self.connection_order.push(id);
        Ok(id)
    }

    /// Input between two populations or projections
    pub fn add_generic_input(
        &mut self,
        src: EntityId,
        dst: EntityId,
        source_port: impl Into<String>,
        destination_port: impl Into<String>,
        pattern: ConnectivityPattern,
    ) -> Result<EntityId> {
        for end in [src, dst] {
            match self.alive_entity(end)?.kind() {
                EntityKind::Population | EntityKind::Projection => {}
                _ => {
                    return Err(SpikeVizError::WrongKind {
                        id: end,
                        expected: "population or projection",
                    })
                }
            }
        }
        let path = self.initial_path(src, dst)?;
        let center = self.endpoint_midpoint(src, dst);
        let id = self.insert(Entity::GenericInput(GenericInput {
            source_port: source_port.into(),
            destination_port: destination_port.into(),
            projection_input: false,
            pattern,
            path,
            strength: 0,
            center,
            visualised: false,
            colour_by_metric: false,
            deleted: false,
            generation: 0,
        }));
        self.relations.insert(id, src, dst);
        self.connection_order.push(id);
        Ok(id)
    }

    fn initial_path(&self, src: EntityId, dst: EntityId) -> Result<EdgePath> {
        let src_anchor = self.anchor(src).ok_or(SpikeVizError::StaleEntity(src))?;
        let dst_anchor = self.anchor(dst).ok_or(SpikeVizError::StaleEntity(dst))?;
        Ok(curves::add_curves(&src_anchor, &dst_anchor))
    }

    fn scene_position(&self, id: EntityId) -> Vec3 {
        match self.entity(id) {
            Some(Entity::Population(p)) => p.position,
            Some(Entity::Projection(_)) => self
                .relations
                .endpoints(id)
                .map(|e| self.endpoint_midpoint(e.source, e.destination))
                .unwrap_or(Vec3::ZERO),
            _ => Vec3::ZERO,
        }
    }

    fn endpoint_midpoint(&self, src: EntityId, dst: EntityId) -> Vec3 {
        (self.scene_position(src) + self.scene_position(dst)) * 0.5
    }

    fn default_center(&self, projection: EntityId) -> Vec3 {
        self.scene_position(projection)
    }

    // ==================== Mutation ====================

    /// Stamp `id` with a fresh geometry generation
    pub fn touch(&mut self, id: EntityId) {
        let stamp = self.next_generation();
        if let Some(e) = self.entity_mut(id) {
            e.set_generation(stamp);
        }
    }

    pub fn set_neuron_count(&mut self, id: EntityId, count: usize) -> Result<()> {
        self.expect_population(id)?;
        if let Some(p) = self.population_mut(id) {
            p.neuron_count = count;
        }
        self.touch(id);
        Ok(())
    }

    pub fn set_layout(&mut self, id: EntityId, layout: LayoutKind) -> Result<()> {
        self.expect_population(id)?;
        if let Some(p) = self.population_mut(id) {
            p.layout = layout;
        }
        self.touch(id);
        Ok(())
    }

    /// Move the 3D origin of a population's layout
    pub fn set_scene_position(&mut self, id: EntityId, position: Vec3) -> Result<()> {
        self.expect_population(id)?;
        if let Some(p) = self.population_mut(id) {
            p.position = position;
        }
        self.touch(id);
        Ok(())
    }

    /// Resize the diagram footprint and rebuild attached edges
    pub fn set_footprint(&mut self, id: EntityId, size: Vec2) -> Result<()> {
        self.expect_population(id)?;
        if let Some(p) = self.population_mut(id) {
            p.size = size;
        }
        for edge in self.relations.touching(id) {
            self.rebuild_curves(edge)?;
        }
        self.touch(id);
        Ok(())
    }

    pub fn set_pattern(&mut self, connection: EntityId, pattern: ConnectivityPattern) -> Result<()> {
        match self.entity_mut(connection) {
            Some(Entity::Synapse(s)) => s.pattern = pattern,
            Some(Entity::GenericInput(g)) => g.pattern = pattern,
            Some(_) => {
                return Err(SpikeVizError::WrongKind {
                    id: connection,
                    expected: "synapse or generic input",
                })
            }
            None => return Err(SpikeVizError::StaleEntity(connection)),
        }
        self.touch(connection);
        Ok(())
    }

    /// Auxiliary control points links of `connection` bend through
    pub fn set_strength(&mut self, connection: EntityId, strength: u32) -> Result<()> {
        match self.entity_mut(connection) {
            Some(Entity::Synapse(s)) => s.strength = strength,
            Some(Entity::GenericInput(g)) => g.strength = strength,
            Some(_) => {
                return Err(SpikeVizError::WrongKind {
                    id: connection,
                    expected: "synapse or generic input",
                })
            }
            None => return Err(SpikeVizError::StaleEntity(connection)),
        }
        self.touch(connection);
        Ok(())
    }

    pub fn set_visualised(&mut self, id: EntityId, on: bool) -> Result<()> {
        let entity = self.entity_mut(id).ok_or(SpikeVizError::StaleEntity(id))?;
        if !entity.set_visualised(on) {
            return Err(SpikeVizError::WrongKind {
                id,
                expected: "population, synapse or generic input",
            });
        }
        self.touch(id);
        Ok(())
    }

    /// Every entity that cannot exist without `id`, `id` first
    fn dependents(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            let current = out[i];
            i += 1;
            let mut children = self.relations.touching(current);
            if let Some(Entity::Projection(p)) = self.entity(current) {
                children.extend(p.synapses.iter().copied());
            }
            for child in children {
                if !out.contains(&child) {
                    out.push(child);
                }
            }
        }
        out
    }

    /// Mark `id` and its dependent edges deleted (or restore them).
    ///
    /// Returns every entity whose flag changed.
    pub fn set_deleted(&mut self, id: EntityId, deleted: bool) -> Result<Vec<EntityId>> {
        if !self.is_valid(id) {
            return Err(SpikeVizError::StaleEntity(id));
        }
        let mut changed = Vec::new();
        for dep in self.dependents(id) {
            let stamp = self.next_generation();
            if let Some(e) = self.entity_mut(dep) {
                if e.is_deleted() != deleted {
                    e.set_deleted(deleted);
                    e.set_generation(stamp);
                    changed.push(dep);
                }
            }
        }
        tracing::debug!("Marked {} entities deleted={} from {}", changed.len(), deleted, id);
        Ok(changed)
    }

    /// Free `id` and everything depending on it.
    ///
    /// Every returned id fails [`NetworkModel::is_valid`] afterwards.
    pub fn remove(&mut self, id: EntityId) -> Vec<EntityId> {
        if !self.is_valid(id) {
            return Vec::new();
        }
        let removed = self.dependents(id);
        for dep in &removed {
            if let Some(Entity::Synapse(s)) = self.entity(*dep) {
                let parent = s.projection;
                if let Some(Entity::Projection(p)) = self.entity_mut(parent) {
                    p.synapses.retain(|s| s != dep);
                }
            }
            self.relations.remove_endpoint(*dep);
            self.relations.remove_edge(*dep);
            let index = dep.index();
            if let Some(slot) = self.slots.get_mut(index) {
                slot.entity = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.population_order.retain(|p| !removed.contains(p));
        self.connection_order.retain(|c| !removed.contains(c));
        tracing::debug!("Removed {} entities starting at {}", removed.len(), id);
        removed
    }

    // ==================== Edge geometry ====================

    pub fn edge_path(&self, edge: EntityId) -> Option<&EdgePath> {
        self.entity(edge)?.path()
    }

    /// Mutable path access; call [`NetworkModel::touch`] afterwards
    pub fn edge_path_mut(&mut self, edge: EntityId) -> Option<&mut EdgePath> {
        self.entity_mut(edge)?.path_mut()
    }

    /// Replace the path of `edge` with fresh default geometry
    pub fn rebuild_curves(&mut self, edge: EntityId) -> Result<()> {
        let ends = self
            .relations
            .endpoints(edge)
            .ok_or(SpikeVizError::StaleEntity(edge))?;
        let path = self.initial_path(ends.source, ends.destination)?;
        let before = self.anchor(edge).map(|a| a.location());
        if let Some(p) = self.edge_path_mut(edge) {
            *p = path;
        }
        self.touch(edge);
        self.follow_projection(edge, before);
        Ok(())
    }

    /// Drag control point `cp` of `edge` to `cursor`
    pub fn move_control_point(&mut self, edge: EntityId, cp: curves::ControlPoint, cursor: Vec2) -> Result<()> {
        let ends = self
            .relations
            .endpoints(edge)
            .ok_or(SpikeVizError::StaleEntity(edge))?;
        let src = self.anchor(ends.source).ok_or(SpikeVizError::StaleEntity(ends.source))?;
        let dst = self
            .anchor(ends.destination)
            .ok_or(SpikeVizError::StaleEntity(ends.destination))?;
        let before = self.anchor(edge).map(|a| a.location());
        let path = self.edge_path_mut(edge).ok_or(SpikeVizError::WrongKind {
            id: edge,
            expected: "projection or generic input",
        })?;
        curves::move_selected_control_point(path, cp, cursor, &src, &dst);
        self.touch(edge);
        self.follow_projection(edge, before);
        Ok(())
    }

    /// Move a population in the diagram, dragging attached edge ends along
    pub fn move_population(&mut self, id: EntityId, delta: Vec2) -> Result<()> {
        self.expect_population(id)?;
        if let Some(p) = self.population_mut(id) {
            p.location += delta;
        }
        // a self-connection is listed on both sides and moves half each time
        let mut attached: Vec<EntityId> = self.relations.edges_from(id).to_vec();
        attached.extend_from_slice(self.relations.edges_to(id));
        let mut moved: Vec<(EntityId, Option<Vec2>)> = Vec::new();
        for edge in attached {
            let Some(ends) = self.relations.endpoints(edge) else {
                continue;
            };
            if !moved.iter().any(|(e, _)| *e == edge) {
                moved.push((edge, self.anchor(edge).map(|a| a.location())));
            }
            if let Some(path) = self.edge_path_mut(edge) {
                curves::animate(path, id, ends.source, ends.destination, delta);
            }
        }
        self.touch(id);
        for (edge, before) in moved {
            self.touch(edge);
            self.follow_projection(edge, before);
        }
        Ok(())
    }

    /// Carry inputs attached to projection `edge` along with its midpoint
    fn follow_projection(&mut self, edge: EntityId, before: Option<Vec2>) {
        let Some(before) = before else {
            return;
        };
        let Some(after) = self.anchor(edge).map(|a| a.location()) else {
            return;
        };
        let delta = after - before;
        if delta == Vec2::ZERO || self.projection(edge).is_none() {
            return;
        }
        let mut attached: Vec<EntityId> = self.relations.edges_from(edge).to_vec();
        attached.extend_from_slice(self.relations.edges_to(edge));
        for input in attached {
            let Some(ends) = self.relations.endpoints(input) else {
                continue;
            };
            if let Some(path) = self.edge_path_mut(input) {
                curves::animate(path, edge, ends.source, ends.destination, delta);
            }
            self.touch(input);
        }
    }

    // ==================== Metadata ====================

    fn edge_key(&self, edge: EntityId) -> Option<(String, String, String, String)> {
        let ends = self.relations.endpoints(edge)?;
        let src = self.name(ends.source)?.to_string();
        let dst = self.name(ends.destination)?.to_string();
        let (sp, dp) = match self.entity(edge)? {
            Entity::GenericInput(g) => (g.source_port.clone(), g.destination_port.clone()),
            _ => (String::new(), String::new()),
        };
        Some((src, dst, sp, dp))
    }

    /// Geometry and generator parameters of every persisted edge
    pub fn write_metadata(&self) -> MetaDocument {
        let mut doc = MetaDocument::new();
        let mut edges: Vec<EntityId> = self.projections().map(|(id, _)| id).collect();
        edges.extend(
            self.connections()
                .filter(|(_, e)| matches!(e, Entity::GenericInput(g) if !g.projection_input))
                .map(|(id, _)| id),
        );
        for edge in edges {
            let (Some((src, dst, sp, dp)), Some(path)) = (self.edge_key(edge), self.edge_path(edge)) else {
                continue;
            };
            let mut record = EdgeMetaRecord::new(src, dst, sp, dp, path);
            match self.entity(edge) {
                Some(Entity::Projection(p)) => {
                    let patterns: Vec<serde_json::Value> = p
                        .synapses
                        .iter()
                        .filter_map(|s| self.synapse(*s))
                        .map(|s| s.pattern.metadata())
                        .collect();
                    record = record.with_connection(serde_json::Value::Array(patterns));
                }
                Some(Entity::GenericInput(g)) => {
                    record = record.with_connection(g.pattern.metadata());
                }
                _ => {}
            }
            doc.push(record);
        }
        doc
    }

    /// Apply stored geometry to matching edges.
    ///
    /// Each record is consumed by the first edge it matches. Edges without
    /// a record keep their default geometry. Explicit patterns get their
    /// generator rebuilt from the stored parameters.
    pub fn apply_metadata(&mut self, doc: &mut MetaDocument) -> Diagnostics {
        let mut diag = Diagnostics::new();
        let mut edges: Vec<EntityId> = self.projections().map(|(id, _)| id).collect();
        edges.extend(self.connections().filter_map(|(id, e)| match e {
            Entity::GenericInput(g) if !g.projection_input => Some(id),
            _ => None,
        }));
        for edge in edges {
            let Some((src, dst, sp, dp)) = self.edge_key(edge) else {
                continue;
            };
            let Some(record) = doc.take_match(&src, &dst, &sp, &dp) else {
                continue;
            };
            if let Some(path) = record.path() {
                if let Some(p) = self.edge_path_mut(edge) {
                    *p = path;
                }
            }
            if let Some(connection) = &record.connection {
                self.restore_generators(edge, connection, &mut diag);
            }
            self.touch(edge);
        }
        if doc.remaining() > 0 {
            diag.push(
                Severity::Info,
                None,
                format!("{} edge records did not match any edge", doc.remaining()),
            );
        }
        diag
    }

    fn restore_generators(&mut self, edge: EntityId, connection: &serde_json::Value, diag: &mut Diagnostics) {
        let targets: Vec<(EntityId, &serde_json::Value)> = match (self.entity(edge), connection) {
            (Some(Entity::Projection(p)), serde_json::Value::Array(items)) => {
                p.synapses.iter().copied().zip(items.iter()).collect()
            }
            (Some(Entity::GenericInput(_)), value) => vec![(edge, value)],
            _ => Vec::new(),
        };
        let mut restored = Vec::new();
        for (conn, meta) in targets {
            let explicit = self
                .entity(conn)
                .and_then(Entity::pattern)
                .map(|p| p.explicit().is_some())
                .unwrap_or(false);
            if !explicit {
                continue;
            }
            match generator_from_metadata(meta) {
                Ok(generator) => restored.push((conn, generator)),
                Err(e) => diag.push_error(Some(conn), &e),
            }
        }
        for (conn, generator) in restored {
            let pattern = ConnectivityPattern::Explicit(ExplicitConnections::from_boxed(generator));
            if let Err(e) = self.set_pattern(conn, pattern) {
                diag.push_error(Some(conn), &e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{KernelGenerator, KernelParams, ListGenerator};
    use crate::curves::ControlPoint;

    fn two_populations() -> (NetworkModel, EntityId, EntityId) {
        let mut model = NetworkModel::new();
        let a = model.add_population("A", 20, Vec2::ZERO);
        let b = model.add_population("B", 20, Vec2::new(5.0, 0.0));
        (model, a, b)
    }

    #[test]
    fn test_remove_invalidates_and_reuses_slot() {
        let (mut model, a, _) = two_populations();
        let removed = model.remove(a);
        assert_eq!(removed, vec![a]);
        assert!(!model.is_valid(a));
        assert!(model.population(a).is_none());

        let c = model.add_population("C", 3, Vec2::ZERO);
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(model.is_valid(c));
        assert!(!model.is_valid(a));
    }

    #[test]
    fn test_remove_population_cascades_to_edges() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("A to B", a, b).expect("projection");
        let syn = model.add_synapse(proj, ConnectivityPattern::OneToOne).expect("synapse");
        let input = model
            .add_generic_input(b, proj, "out", "in", ConnectivityPattern::AllToAll)
            .expect("input");

        let removed = model.remove(a);
        for id in [a, proj, syn, input] {
            assert!(removed.contains(&id), "{} not removed", id);
            assert!(!model.is_valid(id));
        }
        assert!(model.is_valid(b));
        assert!(model.relations().is_empty());
        assert_eq!(model.connections().count(), 0);
    }

    #[test]
    fn test_set_deleted_is_reversible() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("P", a, b).expect("projection");
        let syn = model.add_synapse(proj, ConnectivityPattern::AllToAll).expect("synapse");

        let changed = model.set_deleted(b, true).expect("marks");
        assert_eq!(changed.len(), 3);
        assert!(model.is_valid(syn));
        assert!(!model.is_alive(syn));
        assert_eq!(model.populations().count(), 1);

        model.set_deleted(b, false).expect("restores");
        assert!(model.is_alive(syn));
        assert_eq!(model.population_index(b), Some(1));
    }

    #[test]
    fn test_connection_endpoints() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("P", a, b).expect("projection");
        let syn = model.add_synapse(proj, ConnectivityPattern::OneToOne).expect("synapse");
        assert_eq!(model.connection_endpoints(syn).expect("ends"), (a, b));

        let input = model
            .add_generic_input(a, proj, "", "", ConnectivityPattern::AllToAll)
            .expect("input");
        assert!(matches!(
            model.connection_endpoints(input),
            Err(SpikeVizError::WrongKind { .. })
        ));
        assert!(matches!(
            model.connection_endpoints(a),
            Err(SpikeVizError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_wrong_kinds_rejected() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("P", a, b).expect("projection");
        let syn = model.add_synapse(proj, ConnectivityPattern::OneToOne).expect("synapse");
        assert!(model.add_projection("bad", a, proj).is_err());
        assert!(model.add_synapse(a, ConnectivityPattern::OneToOne).is_err());
        assert!(model
            .add_generic_input(syn, a, "", "", ConnectivityPattern::OneToOne)
            .is_err());
        assert!(model.set_visualised(proj, true).is_err());
    }

    #[test]
    fn test_touch_bumps_generation() {
        let (mut model, a, _) = two_populations();
        let g0 = model.generation(a).expect("generation");
        model.set_neuron_count(a, 40).expect("resize");
        let g1 = model.generation(a).expect("generation");
        assert!(g1 > g0);
        assert_eq!(model.population(a).map(|p| p.neuron_count), Some(40));
    }

    #[test]
    fn test_move_population_animates_edges() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("P", a, b).expect("projection");
        let before = model.edge_path(proj).cloned().expect("path");
        let proj_gen = model.generation(proj);

        model.move_population(b, Vec2::new(0.0, 2.0)).expect("moves");
        let after = model.edge_path(proj).expect("path");
        assert_eq!(after.start, before.start);
        assert_eq!(after.end(), before.end() + Vec2::new(0.0, 2.0));
        assert_ne!(model.generation(proj), proj_gen);
    }

    #[test]
    fn test_move_population_with_self_loop_moves_full_delta() {
        let (mut model, a, _) = two_populations();
        let proj = model.add_projection("loop", a, a).expect("projection");
        let before = model.edge_path(proj).cloned().expect("path");
        let delta = Vec2::new(1.0, -3.0);
        model.move_population(a, delta).expect("moves");
        let after = model.edge_path(proj).expect("path");
        assert!((after.start - (before.start + delta)).length() < 1e-5);
        assert!((after.end() - (before.end() + delta)).length() < 1e-5);
    }

    #[test]
    fn test_set_footprint_carries_projection_inputs() {
        let (mut model, a, b) = two_populations();
        let c = model.add_population("C", 5, Vec2::new(2.5, 6.0));
        let proj = model.add_projection("P", a, b).expect("projection");
        let input = model
            .add_generic_input(c, proj, "out", "in", ConnectivityPattern::AllToAll)
            .expect("input");
        let mid_before = model.edge_path(proj).map(|p| p.midpoint()).expect("path");
        let input_before = model.edge_path(input).cloned().expect("path");

        model.set_footprint(a, Vec2::new(3.0, 2.0)).expect("resizes");
        let delta = model.edge_path(proj).map(|p| p.midpoint()).expect("path") - mid_before;
        assert!(delta.length() > 1e-3);

        let input_after = model.edge_path(input).expect("path");
        assert_eq!(input_after.start, input_before.start);
        assert!((input_after.end() - (input_before.end() + delta)).length() < 1e-5);
    }

    #[test]
    fn test_move_control_point_updates_path() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("P", a, b).expect("projection");
        model
            .move_control_point(proj, ControlPoint::C1(0), Vec2::new(1.0, 3.0))
            .expect("moves");
        assert_eq!(
            model.edge_path(proj).map(|p| p.curves[0].c1),
            Some(Vec2::new(1.0, 3.0))
        );
    }

    #[test]
    fn test_metadata_roundtrip_restores_geometry_and_generator() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("P", a, b).expect("projection");
        let syn = model
            .add_synapse(
                proj,
                ConnectivityPattern::Explicit(ExplicitConnections::new(KernelGenerator::new(KernelParams {
                    sigma: 2.0,
                    ..KernelParams::default()
                }))),
            )
            .expect("synapse");
        model
            .move_control_point(proj, ControlPoint::C2(0), Vec2::new(2.0, 4.0))
            .expect("moves");
        let mut doc = model.write_metadata();
        let saved = model.edge_path(proj).cloned();

        // reset, then restore
        model.rebuild_curves(proj).expect("rebuilds");
        model
            .set_pattern(syn, ConnectivityPattern::Explicit(ExplicitConnections::new(ListGenerator::default())))
            .expect("pattern");
        let diag = model.apply_metadata(&mut doc);
        assert!(diag.is_empty(), "{:?}", diag.entries());
        assert_eq!(model.edge_path(proj).cloned(), saved);
        let meta = model.synapse(syn).map(|s| s.pattern.metadata()).unwrap_or_default();
        assert_eq!(meta["type"], "kernel");
        assert_eq!(meta["params"]["sigma"], 2.0);
    }

    #[test]
    fn test_projection_inputs_are_not_persisted() {
        let (mut model, a, b) = two_populations();
        let input = model
            .add_generic_input(a, b, "out", "in", ConnectivityPattern::OneToOne)
            .expect("input");
        assert_eq!(model.write_metadata().records().len(), 1);
        if let Some(g) = model.generic_input_mut(input) {
            g.projection_input = true;
        }
        assert!(model.write_metadata().records().is_empty());
    }

    #[test]
    fn test_projection_anchor_is_path_midpoint() {
        let (mut model, a, b) = two_populations();
        let proj = model.add_projection("P", a, b).expect("projection");
        let mid = model.edge_path(proj).map(|p| p.midpoint()).expect("path");
        match model.anchor(proj) {
            Some(Anchor::Projection { location, destination, .. }) => {
                assert_eq!(location, mid);
                assert_eq!(destination, b);
            }
            other => panic!("unexpected anchor {:?}", other),
        }
    }
}
