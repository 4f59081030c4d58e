//! Bike Sharing Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::charts::StaticChartRenderer;
use crate::config::Config;
use crate::data::DatasetVariant;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, StatusKind};
use crate::session::{SessionId, SessionStore};
use anyhow::Context;
use egui::SidePanel;
use std::fs;
use std::path::Path;

const COMPARISON_PNG: &str = "user_comparison.png";
const MONTHLY_PNG: &str = "monthly_usage.png";
const SUMMARY_JSON: &str = "bike_sharing_summary.json";

/// Which on-demand view a button asked for
#[derive(Debug, Clone, Copy)]
enum View {
    Metrics,
    Comparison,
    Monthly,
}

/// Main application window.
pub struct BikeShareApp {
    config: Config,
    sessions: SessionStore,
    session_id: SessionId,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl BikeShareApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        let mut sessions = SessionStore::new();
        let session_id = sessions.open();
        let variant = config.data.default_variant;

        let mut app = Self {
            control_panel: ControlPanel::new(variant),
            chart_viewer: ChartViewer::new(config.display.table_row_limit),
            config,
            sessions,
            session_id,
        };
        app.control_panel.session_label = session_id.to_string();
        app.handle_select_dataset(variant);
        app
    }

    /// Load (or fetch from the session) the selected dataset and show it.
    fn handle_select_dataset(&mut self, variant: DatasetVariant) {
        self.chart_viewer.clear();
        self.control_panel.aggregate_ready = false;

        let Some(session) = self.sessions.get_mut(self.session_id) else {
            self.control_panel.set_error("Session has ended");
            return;
        };

        match session.dataset(variant, &self.config.data) {
            Ok(dataset) => {
                let status = format!("Loaded {} rows from {}", dataset.df.height(), dataset.path.display());
                self.chart_viewer.set_dataset(dataset.clone());
                self.control_panel.dataset_loaded = true;
                self.control_panel.set_status(StatusKind::Info, status);
            }
            Err(e) => {
                if e.is_missing_file() {
                    tracing::warn!(variant = %variant, "{}", e);
                } else {
                    tracing::error!(variant = %variant, "{}", e);
                }
                self.control_panel.set_error(e.to_string());
            }
        }
    }

    /// Drop the cached copy of the selected dataset and read it again.
    fn handle_reload(&mut self) {
        let variant = self.control_panel.variant;
        if let Some(session) = self.sessions.get_mut(self.session_id) {
            session.reload(variant);
        }
        self.handle_select_dataset(variant);
    }

    /// Aggregate (memoized per session) and reveal the requested view.
    fn handle_show(&mut self, view: View) {
        let variant = self.control_panel.variant;
        let Some(session) = self.sessions.get_mut(self.session_id) else {
            self.control_panel.set_error("Session has ended");
            return;
        };

        match session.aggregate(variant, &self.config.data) {
            Ok(result) => {
                self.chart_viewer.set_aggregate(result.clone());
                self.control_panel.aggregate_ready = true;
                match view {
                    View::Metrics => self.chart_viewer.show_metrics = true,
                    View::Comparison => self.chart_viewer.show_comparison = true,
                    View::Monthly => self.chart_viewer.show_monthly = true,
                }
            }
            Err(e) => {
                tracing::error!(variant = %variant, "{}", e);
                self.chart_viewer.clear_charts();
                self.control_panel.set_error(e.to_string());
            }
        }
    }

    /// End the current session and start over with empty caches.
    fn handle_new_session(&mut self) {
        self.sessions.end(self.session_id);
        self.session_id = self.sessions.open();
        self.control_panel.session_label = self.session_id.to_string();
        self.handle_select_dataset(self.control_panel.variant);
    }

    /// Handle chart export - render PNGs into a chosen folder
    fn handle_export_charts(&mut self) {
        let Some(folder) = rfd::FileDialog::new().pick_folder() else {
            return; // User cancelled
        };

        match self.export_charts(&folder) {
            Ok(count) => {
                self.control_panel.set_status(
                    StatusKind::Success,
                    format!("Exported {} chart(s) to {}", count, folder.display()),
                );
                if let Err(e) = open::that(&folder) {
                    tracing::warn!(folder = %folder.display(), "Could not open folder: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Chart export failed: {:#}", e);
                self.control_panel
                    .set_status(StatusKind::Error, format!("Export error: {:#}", e));
            }
        }
    }

    fn export_charts(&self, folder: &Path) -> anyhow::Result<usize> {
        let result = self
            .chart_viewer
            .aggregate
            .as_ref()
            .context("No statistics computed yet")?;
        let (width, height) = (self.config.export.width, self.config.export.height);

        let png = StaticChartRenderer::render_user_comparison(result, width, height)
            .context("Rendering user comparison")?;
        write_file(&folder.join(COMPARISON_PNG), &png)?;
        let mut count = 1;

        if let Some(matrix) = &result.monthly_matrix {
            if !matrix.is_empty() {
                let png = StaticChartRenderer::render_monthly_usage(matrix, width, height)
                    .context("Rendering monthly usage")?;
                write_file(&folder.join(MONTHLY_PNG), &png)?;
                count += 1;
            }
        }

        tracing::info!(folder = %folder.display(), charts = count, "Exported charts");
        Ok(count)
    }

    /// Handle summary export - write the statistics as JSON
    fn handle_export_summary(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(SUMMARY_JSON)
            .save_file()
        else {
            return; // User cancelled
        };

        match self.export_summary(&path) {
            Ok(()) => self.control_panel.set_status(
                StatusKind::Success,
                format!("Summary saved to {}", path.display()),
            ),
            Err(e) => {
                tracing::error!("Summary export failed: {:#}", e);
                self.control_panel
                    .set_status(StatusKind::Error, format!("Export error: {:#}", e));
            }
        }
    }

    fn export_summary(&self, path: &Path) -> anyhow::Result<()> {
        let result = self
            .chart_viewer
            .aggregate
            .as_ref()
            .context("No statistics computed yet")?;
        let json = serde_json::to_string_pretty(&result.to_summary())
            .context("Serializing summary")?;
        write_file(path, json.as_bytes())?;
        tracing::info!(path = %path.display(), "Exported summary");
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    fs::write(path, bytes).with_context(|| format!("Writing {}", path.display()))
}

impl eframe::App for BikeShareApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::SelectDataset(variant) => {
                            self.handle_select_dataset(variant)
                        }
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ShowMetrics => self.handle_show(View::Metrics),
                        ControlPanelAction::ShowComparison => self.handle_show(View::Comparison),
                        ControlPanelAction::ShowMonthly => self.handle_show(View::Monthly),
                        ControlPanelAction::ExportCharts => self.handle_export_charts(),
                        ControlPanelAction::ExportSummary => self.handle_export_summary(),
                        ControlPanelAction::NewSession => self.handle_new_session(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
