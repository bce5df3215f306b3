//! Test data builders for creating test networks

use glam::{Vec2, Vec3};
use spikeviz_rs::connectivity::ConnectivityPattern;
use spikeviz_rs::model::{EntityId, LayoutKind, NetworkModel};

/// Ids of a two-population network with one synapse
pub struct PairIds {
    pub a: EntityId,
    pub b: EntityId,
    pub projection: EntityId,
    pub synapse: EntityId,
}

/// Builder for a source/destination pair joined by one projection
pub struct PairBuilder {
    src_count: usize,
    dst_count: usize,
    pattern: ConnectivityPattern,
    layout: LayoutKind,
    separation: f32,
}

impl PairBuilder {
    pub fn new(pattern: ConnectivityPattern) -> Self {
        Self {
            src_count: 20,
            dst_count: 20,
            pattern,
            layout: LayoutKind::Grid2D { spacing: 1.0 },
            separation: 6.0,
        }
    }

    pub fn sizes(mut self, src: usize, dst: usize) -> Self {
        self.src_count = src;
        self.dst_count = dst;
        self
    }

    pub fn layout(mut self, layout: LayoutKind) -> Self {
        self.layout = layout;
        self
    }

    pub fn build(self) -> (NetworkModel, PairIds) {
        let mut model = NetworkModel::new();
        let a = model.add_population("A", self.src_count, Vec2::ZERO);
        let b = model.add_population("B", self.dst_count, Vec2::new(self.separation, 0.0));
        model.set_layout(a, self.layout).expect("layout A");
        model.set_layout(b, self.layout).expect("layout B");
        model
            .set_scene_position(b, Vec3::new(self.separation * 4.0, 0.0, 0.0))
            .expect("position B");
        let projection = model.add_projection("A to B", a, b).expect("projection");
        let synapse = model.add_synapse(projection, self.pattern).expect("synapse");
        (
            model,
            PairIds {
                a,
                b,
                projection,
                synapse,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_builder() {
        let (model, ids) = PairBuilder::new(ConnectivityPattern::OneToOne).sizes(3, 4).build();

        assert_eq!(model.population(ids.a).map(|p| p.neuron_count), Some(3));
        assert_eq!(model.population(ids.b).map(|p| p.neuron_count), Some(4));
        assert_eq!(model.connection_endpoints(ids.synapse).ok(), Some((ids.a, ids.b)));
    }
}
