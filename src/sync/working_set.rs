//! The renderer's working set
//!
//! Every visualised population and connection owns exactly one record
//! here, and every per-entity cache (layout, log colours, attached log,
//! resolved links) lives inside that record. Removing an entity is one
//! `Vec::remove`, so no cache can outlive the others.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;

use crate::model::{EntityId, LayoutKind};
use crate::sync::logs::LogData;
use crate::types::{Bounds3, Link, Rgba};

/// Cached state of one visualised population
#[derive(Clone)]
pub struct PopulationEntry {
    pub id: EntityId,
    /// Neuron positions relative to the population's scene position
    pub layout: Vec<Vec3>,
    /// Strategy the layout was generated with
    pub kind: LayoutKind,
    /// Per-neuron colours from the attached log at the current time
    pub colours: Option<Vec<Rgba>>,
    pub log: Option<Arc<dyn LogData>>,
    /// Model generation the layout was derived from
    pub generation: u64,
    /// Bumped whenever anything in this record changes
    pub revision: u64,
}

impl PopulationEntry {
    pub fn bounds(&self) -> Option<Bounds3> {
        Bounds3::from_points(&self.layout)
    }
}

impl fmt::Debug for PopulationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopulationEntry")
            .field("id", &self.id)
            .field("neurons", &self.layout.len())
            .field("colours", &self.colours.as_ref().map(Vec::len))
            .field("log", &self.log.as_ref().map(|l| l.name().to_string()))
            .field("generation", &self.generation)
            .field("revision", &self.revision)
            .finish()
    }
}

/// Cached state of one visualised synapse or generic input
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEntry {
    pub id: EntityId,
    /// Source population
    pub src: EntityId,
    /// Destination population
    pub dst: EntityId,
    pub links: Vec<Link>,
    /// Links dropped at resolution because an index was out of range
    pub skipped: usize,
    /// Version of the explicit list the links were taken from
    pub explicit_version: Option<u64>,
    /// Model generations of the connection and its endpoints at resolution
    pub generation: u64,
    pub src_generation: u64,
    pub dst_generation: u64,
    pub revision: u64,
}

impl ConnectionEntry {
    pub fn touches(&self, id: EntityId) -> bool {
        self.src == id || self.dst == id
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    populations: Vec<PopulationEntry>,
    connections: Vec<ConnectionEntry>,
    revision_counter: u64,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh revision number for a changed record
    pub fn next_revision(&mut self) -> u64 {
        self.revision_counter += 1;
        self.revision_counter
    }

    /// Visualised populations in the order they were added
    pub fn populations(&self) -> &[PopulationEntry] {
        &self.populations
    }

    pub fn connections(&self) -> &[ConnectionEntry] {
        &self.connections
    }

    pub fn population(&self, id: EntityId) -> Option<&PopulationEntry> {
        self.populations.iter().find(|e| e.id == id)
    }

    pub fn population_mut(&mut self, id: EntityId) -> Option<&mut PopulationEntry> {
        self.populations.iter_mut().find(|e| e.id == id)
    }

    pub fn population_position(&self, id: EntityId) -> Option<usize> {
        self.populations.iter().position(|e| e.id == id)
    }

    pub fn connection(&self, id: EntityId) -> Option<&ConnectionEntry> {
        self.connections.iter().find(|e| e.id == id)
    }

    pub fn connection_mut(&mut self, id: EntityId) -> Option<&mut ConnectionEntry> {
        self.connections.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.population(id).is_some() || self.connection(id).is_some()
    }

    /// Insert or replace a population record
    pub fn upsert_population(&mut self, mut entry: PopulationEntry) {
        entry.revision = self.next_revision();
        match self.population_mut(entry.id) {
            Some(existing) => *existing = entry,
            None => self.populations.push(entry),
        }
    }

    /// Insert or replace a connection record
    pub fn upsert_connection(&mut self, mut entry: ConnectionEntry) {
        entry.revision = self.next_revision();
        match self.connection_mut(entry.id) {
            Some(existing) => *existing = entry,
            None => self.connections.push(entry),
        }
    }

    /// Remove the record of `id`, returns whether one existed
    pub fn remove(&mut self, id: EntityId) -> bool {
        if let Some(i) = self.population_position(id) {
            self.populations.remove(i);
            return true;
        }
        if let Some(i) = self.connections.iter().position(|e| e.id == id) {
            self.connections.remove(i);
            return true;
        }
        false
    }

    /// Keep only records `keep` accepts, returns the removed ids
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.populations.retain(|e| {
            let k = keep(e.id);
            if !k {
                removed.push(e.id);
            }
            k
        });
        self.connections.retain(|e| {
            let k = keep(e.id);
            if !k {
                removed.push(e.id);
            }
            k
        });
        removed
    }

    /// Ids of every record, populations first
    pub fn ids(&self) -> Vec<EntityId> {
        self.populations
            .iter()
            .map(|e| e.id)
            .chain(self.connections.iter().map(|e| e.id))
            .collect()
    }

    /// Neurons across all visualised populations
    pub fn total_neurons(&self) -> usize {
        self.populations.iter().map(|e| e.layout.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.populations.len() + self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.populations.clear();
        self.connections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pop(index: u32, n: usize) -> PopulationEntry {
        PopulationEntry {
            id: EntityId::new(index, 0),
            layout: vec![Vec3::ZERO; n],
            kind: LayoutKind::default(),
            colours: Some(vec![Rgba::BLACK; n]),
            log: None,
            generation: 1,
            revision: 0,
        }
    }

    fn conn(index: u32, src: u32, dst: u32) -> ConnectionEntry {
        ConnectionEntry {
            id: EntityId::new(index, 0),
            src: EntityId::new(src, 0),
            dst: EntityId::new(dst, 0),
            links: vec![Link::new(0, 0)],
            skipped: 0,
            explicit_version: None,
            generation: 1,
            src_generation: 1,
            dst_generation: 1,
            revision: 0,
        }
    }

    #[test]
    fn test_upsert_replaces_and_bumps_revision() {
        let mut set = WorkingSet::new();
        set.upsert_population(pop(0, 3));
        let first = set.populations()[0].revision;
        set.upsert_population(pop(0, 5));
        assert_eq!(set.populations().len(), 1);
        assert_eq!(set.total_neurons(), 5);
        assert!(set.populations()[0].revision > first);
    }

    #[test]
    fn test_remove_drops_whole_record() {
        let mut set = WorkingSet::new();
        set.upsert_population(pop(0, 3));
        set.upsert_connection(conn(2, 0, 0));
        assert!(set.remove(EntityId::new(0, 0)));
        assert!(set.population(EntityId::new(0, 0)).is_none());
        assert!(!set.remove(EntityId::new(0, 0)));
        assert!(set.contains(EntityId::new(2, 0)));
    }

    #[test]
    fn test_retain_reports_removed() {
        let mut set = WorkingSet::new();
        set.upsert_population(pop(0, 1));
        set.upsert_population(pop(1, 1));
        set.upsert_connection(conn(2, 0, 1));
        let removed = set.retain(|id| id.index() != 0 && id.index() != 2);
        assert_eq!(removed, vec![EntityId::new(0, 0), EntityId::new(2, 0)]);
        assert_eq!(set.ids(), vec![EntityId::new(1, 0)]);
    }
}
