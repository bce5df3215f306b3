//! Connectivity patterns and their resolution into links
//!
//! # Main Types
//!
//! - [`ConnectivityPattern`] - abstract rule for which neuron pairs connect
//! - [`Resolver`] - turns a pattern plus two layouts into a [`LinkIter`]
//! - [`ExplicitConnections`] - lock-guarded generated list shared with the
//!   background [`GenerationWorker`]
//!
//! # Submodules
//!
//! - [`generator`] - generator trait, list and kernel generators
//! - [`script`] - Rhai script generator
//! - [`resolver`] - lazy resolution with range checking
//! - [`worker`] - background regeneration thread

pub mod generator;
pub mod resolver;
pub mod script;
pub mod worker;

pub use generator::{
    generator_from_metadata, parse_link_list, ConnectionGenerator, ExplicitConnections, GeneratedConnections,
    GeneratorKind, KernelGenerator, KernelParams, ListGenerator,
};
pub use resolver::{AlwaysRegenerate, LinkIter, Refresh, RegenerationGate, Resolver};
pub use script::ScriptGenerator;
pub use worker::{GenerationEvent, GenerationJob, GenerationWorker};

use std::fmt;

/// Abstract connectivity rule of a synapse or generic input
#[derive(Debug, Clone)]
pub enum ConnectivityPattern {
    /// Neuron `i` connects to neuron `i`, sizes must match
    OneToOne,
    /// Every source neuron connects to every destination neuron
    AllToAll,
    /// Each pair connects with `probability`, drawn from a generator seeded with `seed`
    FixedProbability { probability: f64, seed: u64 },
    /// List produced by an external generator
    Explicit(ExplicitConnections),
}

impl ConnectivityPattern {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectivityPattern::OneToOne => "One to One",
            ConnectivityPattern::AllToAll => "All to All",
            ConnectivityPattern::FixedProbability { .. } => "Fixed Probability",
            ConnectivityPattern::Explicit(_) => "Explicit List",
        }
    }

    pub fn explicit(&self) -> Option<&ExplicitConnections> {
        match self {
            ConnectivityPattern::Explicit(e) => Some(e),
            _ => None,
        }
    }

    /// Pattern parameters persisted next to the edge geometry
    pub fn metadata(&self) -> serde_json::Value {
        match self {
            ConnectivityPattern::OneToOne => serde_json::json!({ "type": "one_to_one" }),
            ConnectivityPattern::AllToAll => serde_json::json!({ "type": "all_to_all" }),
            ConnectivityPattern::FixedProbability { probability, seed } => serde_json::json!({
                "type": "fixed_probability",
                "probability": probability,
                "seed": seed,
            }),
            ConnectivityPattern::Explicit(e) => e.metadata(),
        }
    }
}

impl fmt::Display for ConnectivityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityPattern::FixedProbability { probability, seed } => {
                write!(f, "{} (p={}, seed={})", self.label(), probability, seed)
            }
            _ => f.write_str(self.label()),
        }
    }
}
