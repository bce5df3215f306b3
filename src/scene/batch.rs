//! Cached draw batches
//!
//! Geometry for each drawn entity is built once into an immutable batch
//! and shared with frames through an `Arc`. A batch is rebuilt only when
//! the [`BatchStamp`] it was built under no longer matches: the entity's
//! model generation, the working-set revision of its cached data, the
//! generations of its endpoints, or the draw parameters changed.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::model::EntityId;
use crate::types::Rgba;

/// Everything a cached batch depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStamp {
    /// Model generation of the entity itself
    pub entity: u64,
    /// Revision of the working-set record (layout, colours, links)
    pub working: u64,
    /// Model generations of the endpoint populations, 0 for populations
    pub src: u64,
    pub dst: u64,
    pub lod: u32,
    pub export: bool,
    /// Bit pattern of the preview offset in effect, 0 when none
    pub offset: [u32; 3],
}

impl BatchStamp {
    pub fn offset_bits(offset: Option<Vec3>) -> [u32; 3] {
        offset
            .map(|o| [o.x.to_bits(), o.y.to_bits(), o.z.to_bits()])
            .unwrap_or_default()
    }
}

/// One neuron glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Position relative to the population's scene position
    pub position: Vec3,
    pub colour: Rgba,
    /// Flat pick colour, `None` when the neuron cannot be picked
    pub pick: Option<[u8; 3]>,
}

/// Draw data of one population
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopulationBatch {
    pub glyphs: Vec<Glyph>,
    /// Unit glyph polygon at the batch's level of detail
    pub outline: Vec<Vec2>,
}

/// A styled line strip in scene space
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec3>,
    pub colour: Rgba,
    pub width: f32,
}

/// Draw data of one connection, `polylines[i]` draws link `i`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionBatch {
    pub polylines: Vec<Polyline>,
}

struct Cached<T> {
    stamp: BatchStamp,
    batch: Arc<T>,
}

/// Per-entity batch cache
#[derive(Default)]
pub struct BatchCache {
    populations: HashMap<EntityId, Cached<PopulationBatch>>,
    connections: HashMap<EntityId, Cached<ConnectionBatch>>,
    rebuilds: u64,
}

impl BatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached population batch, rebuilt with `build` when `stamp` moved on
    pub fn population(
        &mut self,
        id: EntityId,
        stamp: BatchStamp,
        build: impl FnOnce() -> PopulationBatch,
    ) -> Arc<PopulationBatch> {
        lookup(&mut self.populations, &mut self.rebuilds, id, stamp, build)
    }

    /// Cached connection batch, rebuilt with `build` when `stamp` moved on
    pub fn connection(
        &mut self,
        id: EntityId,
        stamp: BatchStamp,
        build: impl FnOnce() -> ConnectionBatch,
    ) -> Arc<ConnectionBatch> {
        lookup(&mut self.connections, &mut self.rebuilds, id, stamp, build)
    }

    /// Drop batches of entities `keep` rejects
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        self.populations.retain(|id, _| keep(*id));
        self.connections.retain(|id, _| keep(*id));
    }

    pub fn invalidate(&mut self, id: EntityId) {
        self.populations.remove(&id);
        self.connections.remove(&id);
    }

    pub fn clear(&mut self) {
        self.populations.clear();
        self.connections.clear();
    }

    pub fn len(&self) -> usize {
        self.populations.len() + self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of batch builds since creation
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

fn lookup<T>(
    map: &mut HashMap<EntityId, Cached<T>>,
    rebuilds: &mut u64,
    id: EntityId,
    stamp: BatchStamp,
    build: impl FnOnce() -> T,
) -> Arc<T> {
    if let Some(cached) = map.get(&id) {
        if cached.stamp == stamp {
            return Arc::clone(&cached.batch);
        }
    }
    tracing::trace!("Rebuilding batch for {}", id);
    *rebuilds += 1;
    let batch = Arc::new(build());
    map.insert(
        id,
        Cached {
            stamp,
            batch: Arc::clone(&batch),
        },
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn test_batch_reused_until_stamp_changes() {
        let mut cache = BatchCache::new();
        let stamp = BatchStamp {
            entity: 1,
            ..Default::default()
        };
        let a = cache.population(id(0), stamp, PopulationBatch::default);
        let b = cache.population(id(0), stamp, || panic!("must not rebuild"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.rebuilds(), 1);

        let newer = BatchStamp { working: 1, ..stamp };
        let c = cache.population(id(0), newer, PopulationBatch::default);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.rebuilds(), 2);
    }

    #[test]
    fn test_retain_and_invalidate() {
        let mut cache = BatchCache::new();
        let stamp = BatchStamp::default();
        cache.population(id(0), stamp, PopulationBatch::default);
        cache.connection(id(1), stamp, ConnectionBatch::default);
        cache.connection(id(2), stamp, ConnectionBatch::default);
        assert_eq!(cache.len(), 3);

        cache.retain(|e| e != id(1));
        assert_eq!(cache.len(), 2);
        cache.invalidate(id(0));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_offset_bits() {
        assert_eq!(BatchStamp::offset_bits(None), [0, 0, 0]);
        assert_ne!(BatchStamp::offset_bits(Some(Vec3::X)), [0, 0, 0]);
    }
}
