//! SpikeViz - Main Entry Point
//!
//! Opens the connection editor on the built-in sample network. An optional
//! first argument names a directory of recorded activity logs
//! (`<population>_<port>_log.bin`) to overlay on the neuron glyphs.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use spikeviz_rs::{
    config::{app_data_dir, AppConfig, AppState},
    frontend::SpikeVizApp,
    model::{sample_network, NetworkModel},
    sync::{log_file_name, LogData, VecLog},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install stderr and daily file logging; the guard must outlive the app
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,spikeviz_rs=debug"));

    let (file_layer, guard) = match app_data_dir().map(|dir| dir.join("logs")) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "spikeviz.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

/// Load every log in `dir` that matches a population and port of `model`
fn load_logs(model: &NetworkModel, dir: &Path) -> Vec<Arc<dyn LogData>> {
    let mut logs: Vec<Arc<dyn LogData>> = Vec::new();
    for (_, pop) in model.populations() {
        for port in &pop.ports {
            let path = dir.join(log_file_name(&pop.name, port));
            if !path.exists() {
                continue;
            }
            match VecLog::load(&path, pop.neuron_count) {
                Ok(log) => {
                    tracing::info!("Loaded log {} ({} steps)", path.display(), log.rows());
                    logs.push(Arc::new(log));
                }
                Err(e) => tracing::warn!("Skipping log {}: {}", path.display(), e),
            }
        }
    }
    logs
}

fn main() -> anyhow::Result<()> {
    let _guard = init_tracing();

    tracing::info!("Starting SpikeViz");

    let config = AppConfig::load_or_default();
    let app_state = AppState::load_or_default();
    let model = sample_network().context("Failed to build the sample network")?;

    let logs = match std::env::args().nth(1) {
        Some(dir) => load_logs(&model, Path::new(&dir)),
        None => Vec::new(),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("SpikeViz"),
        ..Default::default()
    };

    eframe::run_native(
        "SpikeViz",
        native_options,
        Box::new(|cc| Ok(Box::new(SpikeVizApp::new(cc, model, config, app_state, logs)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run the UI: {}", e))?;

    tracing::info!("Shutting down...");
    Ok(())
}
