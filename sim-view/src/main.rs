//! Application entry point for the swirl particle-field viewer.
//!
//! This binary sets up logging and eframe/egui and delegates everything
//! else to [`Viewer`] from the `viewer` module.

mod viewer;

use anyhow::{Context, anyhow};
use swirl_core::Config;
use viewer::Viewer;

/// Environment variable holding an optional `u64` seed for a reproducible run.
const SEED_VAR: &str = "SWIRL_SEED";

/// Starts the native eframe application.
///
/// The first command-line argument, if present, is a JSON config file;
/// missing keys take their defaults. `RUST_LOG` controls log verbosity
/// (default `info`).
///
/// ### Returns
/// - `Ok(())` once the window is closed.
/// - `Err` if the config is unreadable or invalid, or eframe fails to
///   create the native window or event loop.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => {
            Config::load(&path).with_context(|| format!("failed to load config from {path}"))?
        }
        None => Config::default(),
    };

    let seed = std::env::var(SEED_VAR)
        .ok()
        .map(|s| s.trim().parse::<u64>())
        .transpose()
        .with_context(|| format!("{SEED_VAR} must be an unsigned integer"))?;

    let viewer = Viewer::new(cfg, seed).context("failed to start simulation")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native("swirl", options, Box::new(move |_cc| Ok(Box::new(viewer))))
        .map_err(|e| anyhow!("viewer exited with an error: {e}"))
}
