//! Bike Sharing Dashboard
//!
//! Loads the daily or hourly bike sharing dataset, computes average usage
//! and renders charts on request.

mod charts;
mod config;
mod data;
mod error;
mod gui;
mod session;
mod stats;

use config::{Config, LoggingConfig};
use eframe::egui;
use gui::BikeShareApp;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> eframe::Result<()> {
    let loaded = Config::load(Path::new(config::CONFIG_FILE));
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config.logging);

    if let Err(e) = &loaded {
        tracing::warn!("{}; using defaults", e);
    }
    tracing::info!(
        "Bike Sharing Dashboard v{}, data directory {}",
        env!("CARGO_PKG_VERSION"),
        config.data.data_dir.display()
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Bike Sharing Analysis"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Bike Sharing Analysis",
        options,
        Box::new(move |cc| Ok(Box::new(BikeShareApp::new(cc, config)))),
    )
}
