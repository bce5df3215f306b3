//! # SpikeViz-RS: spiking network connection editor
//!
//! Editor core for spiking neural-network models. Populations of neurons
//! are drawn as boxes or ellipses in a 2D diagram, connected by editable
//! Bezier edge paths, and visualised in 3D as neuron glyphs joined by the
//! resolved neuron-to-neuron links of each connection.
//!
//! ## Architecture
//!
//! - **Model**: generational entity storage with edge relations ([`model`])
//! - **Connectivity**: pattern resolution and connection generators,
//!   with Rhai-scripted generation and a background worker ([`connectivity`])
//! - **Curves**: edge paths made of cubic Bezier segments and their
//!   metadata document ([`curves`], built on [`geometry`])
//! - **Scene**: cached draw batches, camera, picking and frame building
//!   ([`scene`])
//! - **Sync**: the selection controller keeping the scene's working set
//!   consistent with the model ([`sync`])
//! - **Frontend**: eframe/egui dock workspace issuing actions ([`frontend`])
//!
//! ## Configuration
//!
//! Preferences are stored in the platform-appropriate data directory under
//! `dev.spikeviz.spikeviz-rs`; the renderer and camera configuration is a
//! TOML file in the matching config directory.
//!
//! ## Example
//!
//! ```no_run
//! use spikeviz_rs::connectivity::AlwaysRegenerate;
//! use spikeviz_rs::model::sample_network;
//! use spikeviz_rs::scene::{SceneRenderer, Viewport};
//! use spikeviz_rs::sync::{view_channel, SelectionController};
//! use spikeviz_rs::AppConfig;
//!
//! let mut model = sample_network().expect("sample network");
//! let (tx, _rx) = view_channel();
//! let mut controller = SelectionController::new(tx);
//!
//! let ids: Vec<_> = model.populations().map(|(id, _)| id).collect();
//! for id in ids {
//!     controller.set_visualised(&mut model, id, true, &AlwaysRegenerate).expect("visualise");
//! }
//!
//! let mut renderer = SceneRenderer::new(&AppConfig::default());
//! let frame = renderer.render(&controller.scene_view(&model), Viewport::new(800.0, 600.0));
//! println!("{} neurons", frame.stats.neurons);
//! ```

pub mod config;
pub mod connectivity;
pub mod curves;
pub mod error;
pub mod frontend;
pub mod geometry;
pub mod model;
pub mod scene;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, AppState};
pub use connectivity::{ConnectivityPattern, RegenerationGate};
pub use error::{Diagnostic, Diagnostics, Result, Severity, SpikeVizError};
pub use frontend::SpikeVizApp;
pub use model::{EntityId, NetworkModel};
pub use scene::{Frame, SceneRenderer};
pub use sync::SelectionController;
pub use types::{Link, Rgba};
