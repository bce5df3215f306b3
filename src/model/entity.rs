//! Entity variants stored in the network model

use std::fmt;

use glam::{Vec2, Vec3};

use crate::connectivity::ConnectivityPattern;
use crate::curves::EdgePath;
use crate::geometry::{FootprintShape, PopulationBounds};
use crate::model::layout::LayoutKind;
use crate::model::EntityId;

/// Default footprint of a population box in diagram units
pub const DEFAULT_POPULATION_SIZE: Vec2 = Vec2::new(1.0, 0.6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Population,
    Projection,
    Synapse,
    GenericInput,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Population => "population",
            EntityKind::Projection => "projection",
            EntityKind::Synapse => "synapse",
            EntityKind::GenericInput => "generic input",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named group of neurons
#[derive(Debug, Clone)]
pub struct Population {
    pub name: String,
    pub neuron_count: usize,
    /// Centre of the footprint in the 2D diagram
    pub location: Vec2,
    pub size: Vec2,
    pub shape: FootprintShape,
    /// Origin of the neuron layout in the 3D scene
    pub position: Vec3,
    pub colour: [u8; 3],
    pub layout: LayoutKind,
    /// Ports that can carry a recorded log
    pub ports: Vec<String>,
    pub visualised: bool,
    pub deleted: bool,
    pub(crate) generation: u64,
}

impl Population {
    pub fn new(name: impl Into<String>, neuron_count: usize, location: Vec2) -> Self {
        Self {
            name: name.into(),
            neuron_count,
            location,
            size: DEFAULT_POPULATION_SIZE,
            shape: FootprintShape::Rectangle,
            position: location.extend(0.0),
            colour: [128, 128, 128],
            layout: LayoutKind::default(),
            ports: Vec::new(),
            visualised: false,
            deleted: false,
            generation: 0,
        }
    }

    pub fn bounds(&self) -> PopulationBounds {
        PopulationBounds::new(self.location, self.size, self.shape)
    }
}

/// A pathway between two populations made of one or more synapses
#[derive(Debug, Clone)]
pub struct Projection {
    pub name: String,
    pub path: EdgePath,
    pub synapses: Vec<EntityId>,
    pub deleted: bool,
    pub(crate) generation: u64,
}

/// One connectivity pattern inside a projection
#[derive(Debug, Clone)]
pub struct Synapse {
    pub projection: EntityId,
    pub pattern: ConnectivityPattern,
    /// Number of auxiliary control points links bend through
    pub strength: u32,
    /// Point links bend toward, in scene space
    pub center: Vec3,
    pub visualised: bool,
    pub colour_by_metric: bool,
    pub deleted: bool,
    pub(crate) generation: u64,
}

/// A connection outside the projection/synapse structure
#[derive(Debug, Clone)]
pub struct GenericInput {
    pub source_port: String,
    pub destination_port: String,
    /// Internal wiring of a projection, not persisted in edge metadata
    pub projection_input: bool,
    pub pattern: ConnectivityPattern,
    pub path: EdgePath,
    pub strength: u32,
    pub center: Vec3,
    pub visualised: bool,
    pub colour_by_metric: bool,
    pub deleted: bool,
    pub(crate) generation: u64,
}

/// Any entity of the network model
#[derive(Debug, Clone)]
pub enum Entity {
    Population(Population),
    Projection(Projection),
    Synapse(Synapse),
    GenericInput(GenericInput),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Population(_) => EntityKind::Population,
            Entity::Projection(_) => EntityKind::Projection,
            Entity::Synapse(_) => EntityKind::Synapse,
            Entity::GenericInput(_) => EntityKind::GenericInput,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Entity::Population(p) => p.deleted,
            Entity::Projection(p) => p.deleted,
            Entity::Synapse(s) => s.deleted,
            Entity::GenericInput(g) => g.deleted,
        }
    }

    pub(crate) fn set_deleted(&mut self, deleted: bool) {
        match self {
            Entity::Population(p) => p.deleted = deleted,
            Entity::Projection(p) => p.deleted = deleted,
            Entity::Synapse(s) => s.deleted = deleted,
            Entity::GenericInput(g) => g.deleted = deleted,
        }
    }

    /// Geometry generation, bumped whenever drawable state changes
    pub fn generation(&self) -> u64 {
        match self {
            Entity::Population(p) => p.generation,
            Entity::Projection(p) => p.generation,
            Entity::Synapse(s) => s.generation,
            Entity::GenericInput(g) => g.generation,
        }
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        match self {
            Entity::Population(p) => p.generation = generation,
            Entity::Projection(p) => p.generation = generation,
            Entity::Synapse(s) => s.generation = generation,
            Entity::GenericInput(g) => g.generation = generation,
        }
    }

    /// Visibility flag of drawable entities, `None` for projections
    pub fn visualised(&self) -> Option<bool> {
        match self {
            Entity::Population(p) => Some(p.visualised),
            Entity::Synapse(s) => Some(s.visualised),
            Entity::GenericInput(g) => Some(g.visualised),
            Entity::Projection(_) => None,
        }
    }

    pub(crate) fn set_visualised(&mut self, on: bool) -> bool {
        match self {
            Entity::Population(p) => p.visualised = on,
            Entity::Synapse(s) => s.visualised = on,
            Entity::GenericInput(g) => g.visualised = on,
            Entity::Projection(_) => return false,
        }
        true
    }

    /// Connectivity pattern of synapses and generic inputs
    pub fn pattern(&self) -> Option<&ConnectivityPattern> {
        match self {
            Entity::Synapse(s) => Some(&s.pattern),
            Entity::GenericInput(g) => Some(&g.pattern),
            _ => None,
        }
    }

    /// Editable path of projections and generic inputs
    pub fn path(&self) -> Option<&EdgePath> {
        match self {
            Entity::Projection(p) => Some(&p.path),
            Entity::GenericInput(g) => Some(&g.path),
            _ => None,
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut EdgePath> {
        match self {
            Entity::Projection(p) => Some(&mut p.path),
            Entity::GenericInput(g) => Some(&mut g.path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> Entity {
        Entity::Projection(Projection {
            name: "P".to_string(),
            path: EdgePath::straight(Vec2::ZERO, Vec2::X),
            synapses: Vec::new(),
            deleted: false,
            generation: 0,
        })
    }

    #[test]
    fn test_projection_has_no_visibility() {
        let mut p = projection();
        assert_eq!(p.visualised(), None);
        assert!(!p.set_visualised(true));
        assert_eq!(p.kind(), EntityKind::Projection);
        assert!(p.path().is_some());
        assert!(p.pattern().is_none());
    }

    #[test]
    fn test_population_flags() {
        let mut e = Entity::Population(Population::new("A", 4, Vec2::new(1.0, 2.0)));
        assert_eq!(e.visualised(), Some(false));
        assert!(e.set_visualised(true));
        assert_eq!(e.visualised(), Some(true));

        e.set_deleted(true);
        e.set_generation(7);
        assert!(e.is_deleted());
        assert_eq!(e.generation(), 7);
        assert!(e.path().is_none());
    }

    #[test]
    fn test_population_bounds_follow_location() {
        let pop = Population::new("A", 4, Vec2::new(1.0, 2.0));
        assert_eq!(pop.bounds().center, Vec2::new(1.0, 2.0));
        assert_eq!(pop.position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(EntityKind::GenericInput.to_string(), "generic input");
    }
}
