//! Edge/endpoint relation table
//!
//! Projections and generic inputs do not hold references to their
//! endpoints. The model records each edge once here and answers endpoint
//! queries in both directions.

use std::collections::HashMap;

use super::EntityId;

/// Endpoints of one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoints {
    pub source: EntityId,
    pub destination: EntityId,
}

impl Endpoints {
    pub fn is_self_connection(&self) -> bool {
        self.source == self.destination
    }

    pub fn touches(&self, id: EntityId) -> bool {
        self.source == id || self.destination == id
    }
}

#[derive(Debug, Default, Clone)]
pub struct RelationTable {
    by_edge: HashMap<EntityId, Endpoints>,
    outgoing: HashMap<EntityId, Vec<EntityId>>,
    incoming: HashMap<EntityId, Vec<EntityId>>,
}

impl RelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `edge`, replacing any previous endpoints
    pub fn insert(&mut self, edge: EntityId, source: EntityId, destination: EntityId) {
        self.remove_edge(edge);
        self.by_edge.insert(edge, Endpoints { source, destination });
        self.outgoing.entry(source).or_default().push(edge);
        self.incoming.entry(destination).or_default().push(edge);
    }

    pub fn remove_edge(&mut self, edge: EntityId) -> Option<Endpoints> {
        let ends = self.by_edge.remove(&edge)?;
        if let Some(list) = self.outgoing.get_mut(&ends.source) {
            list.retain(|e| *e != edge);
        }
        if let Some(list) = self.incoming.get_mut(&ends.destination) {
            list.retain(|e| *e != edge);
        }
        Some(ends)
    }

    pub fn endpoints(&self, edge: EntityId) -> Option<Endpoints> {
        self.by_edge.get(&edge).copied()
    }

    /// Edges leaving `id`, in insertion order
    pub fn edges_from(&self, id: EntityId) -> &[EntityId] {
        self.outgoing.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges arriving at `id`, in insertion order
    pub fn edges_to(&self, id: EntityId) -> &[EntityId] {
        self.incoming.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every edge with `id` at either end, self-connections listed once
    pub fn touching(&self, id: EntityId) -> Vec<EntityId> {
        let mut edges: Vec<EntityId> = self.edges_from(id).to_vec();
        for e in self.edges_to(id) {
            if !edges.contains(e) {
                edges.push(*e);
            }
        }
        edges
    }

    /// Forget every edge touching `id`, returning the removed edges
    pub fn remove_endpoint(&mut self, id: EntityId) -> Vec<EntityId> {
        let edges = self.touching(id);
        for e in &edges {
            self.remove_edge(*e);
        }
        self.outgoing.remove(&id);
        self.incoming.remove(&id);
        edges
    }

    pub fn len(&self) -> usize {
        self.by_edge.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_edge.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u32) -> EntityId {
        EntityId::new(i, 0)
    }

    #[test]
    fn test_bidirectional_queries() {
        let mut t = RelationTable::new();
        t.insert(id(10), id(1), id(2));
        t.insert(id(11), id(2), id(1));
        t.insert(id(12), id(1), id(1));

        assert_eq!(t.edges_from(id(1)), &[id(10), id(12)]);
        assert_eq!(t.edges_to(id(1)), &[id(11), id(12)]);
        assert_eq!(t.touching(id(1)), vec![id(10), id(12), id(11)]);
        assert!(t.endpoints(id(12)).map(|e| e.is_self_connection()).unwrap_or(false));
    }

    #[test]
    fn test_remove_endpoint_cascades() {
        let mut t = RelationTable::new();
        t.insert(id(10), id(1), id(2));
        t.insert(id(11), id(3), id(2));
        let removed = t.remove_endpoint(id(1));
        assert_eq!(removed, vec![id(10)]);
        assert_eq!(t.edges_to(id(2)), &[id(11)]);
        assert_eq!(t.len(), 1);
        assert!(t.endpoints(id(10)).is_none());
    }

    #[test]
    fn test_reinsert_replaces_endpoints() {
        let mut t = RelationTable::new();
        t.insert(id(10), id(1), id(2));
        t.insert(id(10), id(3), id(4));
        assert!(t.edges_from(id(1)).is_empty());
        assert_eq!(t.edges_from(id(3)), &[id(10)]);
        assert_eq!(t.len(), 1);
    }
}
