//! Built-in starter network opened when no other network is supplied

use glam::{Vec2, Vec3};

use super::{LayoutKind, NetworkModel};
use crate::connectivity::{ConnectivityPattern, ExplicitConnections, KernelGenerator, KernelParams};
use crate::error::Result;

/// Three populations: an input grid feeding an excitatory sheet through a
/// distance kernel, with a fixed-probability projection onward and a
/// one-to-one input from the stimulus. The populations and the onward
/// synapse start out visualised.
pub fn sample_network() -> Result<NetworkModel> {
    let mut model = NetworkModel::new();

    let stimulus = model.add_population("Stimulus", 25, Vec2::new(-4.0, 0.0));
    let excitatory = model.add_population("Excitatory", 25, Vec2::new(0.0, 0.0));
    let inhibitory = model.add_population("Inhibitory", 16, Vec2::new(4.0, 1.5));

    model.set_layout(stimulus, LayoutKind::Grid2D { spacing: 1.0 })?;
    model.set_layout(excitatory, LayoutKind::Grid2D { spacing: 1.0 })?;
    model.set_layout(inhibitory, LayoutKind::Grid3D { spacing: 1.2 })?;
    model.set_scene_position(stimulus, Vec3::new(-10.0, 0.0, 0.0))?;
    model.set_scene_position(inhibitory, Vec3::new(10.0, 0.0, 0.0))?;
    for id in [stimulus, excitatory, inhibitory] {
        if let Some(pop) = model.population_mut(id) {
            pop.ports = vec!["spike".to_string()];
        }
    }
    if let Some(pop) = model.population_mut(stimulus) {
        pop.colour = [80, 160, 220];
    }
    if let Some(pop) = model.population_mut(inhibitory) {
        pop.colour = [220, 90, 90];
    }

    let feed = model.add_projection("Stimulus to Excitatory", stimulus, excitatory)?;
    let kernel = ExplicitConnections::new(KernelGenerator::new(KernelParams {
        sigma: 1.0,
        scale: 1.0,
        threshold: 0.5,
    }));
    model.add_synapse(feed, ConnectivityPattern::Explicit(kernel))?;

    let onward = model.add_projection("Excitatory to Inhibitory", excitatory, inhibitory)?;
    let syn = model.add_synapse(
        onward,
        ConnectivityPattern::FixedProbability {
            probability: 0.1,
            seed: 7,
        },
    )?;
    model.set_strength(syn, 1)?;

    model.add_generic_input(stimulus, excitatory, "spike", "in", ConnectivityPattern::OneToOne)?;

    for id in [stimulus, excitatory, inhibitory, syn] {
        model.set_visualised(id, true)?;
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_network_builds() {
        let model = sample_network().expect("sample network");
        assert_eq!(model.populations().count(), 3);
        assert_eq!(model.projections().count(), 2);
        assert_eq!(model.connections().count(), 3);
        assert_eq!(model.populations().filter(|(_, p)| p.visualised).count(), 3);
        for (id, _) in model.connections() {
            assert!(model.connection_endpoints(id).is_ok());
        }
    }
}
