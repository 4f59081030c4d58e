//! Chart Viewer Widget
//! Central scrollable panel: dataset table first, then whatever the user
//! asked to see. Nothing beyond the table is drawn until requested.

use crate::charts::ChartPlotter;
use crate::gui::data_table::DataTable;
use crate::session::LoadedDataset;
use crate::stats::AggregateResult;
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;

/// Central panel state.
pub struct ChartViewer {
    pub dataset: Option<LoadedDataset>,
    pub aggregate: Option<AggregateResult>,
    pub show_metrics: bool,
    pub show_comparison: bool,
    pub show_monthly: bool,
    table: DataTable,
}

impl ChartViewer {
    pub fn new(row_limit: usize) -> Self {
        Self {
            dataset: None,
            aggregate: None,
            show_metrics: false,
            show_comparison: false,
            show_monthly: false,
            table: DataTable::new(row_limit),
        }
    }

    /// Clear everything, including the dataset
    pub fn clear(&mut self) {
        self.dataset = None;
        self.clear_charts();
    }

    /// Hide the charts but keep the dataset table
    pub fn clear_charts(&mut self) {
        self.aggregate = None;
        self.show_metrics = false;
        self.show_comparison = false;
        self.show_monthly = false;
    }

    pub fn set_dataset(&mut self, dataset: LoadedDataset) {
        self.clear_charts();
        self.dataset = Some(dataset);
    }

    pub fn set_aggregate(&mut self, result: AggregateResult) {
        self.aggregate = Some(result);
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(dataset) = &self.dataset else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .id_salt("chart_viewer")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Bike Sharing Analysis");
                ui.add_space(8.0);

                // ===== Dataset =====
                ui.label(RichText::new("Dataset").size(16.0).strong());
                ui.label(format!(
                    "This is the {} bike sharing dataset: {} rows, {} columns",
                    dataset.variant,
                    dataset.df.height(),
                    dataset.df.width()
                ));
                if dataset.inconsistent_totals > 0 {
                    ui.label(
                        RichText::new(format!(
                            "⚠ {} rows where cnt differs from casual + registered",
                            dataset.inconsistent_totals
                        ))
                        .size(11.0)
                        .color(Color32::from_rgb(243, 156, 18)),
                    );
                }
                ui.add_space(5.0);
                self.table.show(ui, &dataset.df);

                let Some(result) = &self.aggregate else {
                    return;
                };

                if self.show_metrics {
                    ui.add_space(SECTION_SPACING);
                    ui.label(RichText::new("Average Users").size(16.0).strong());
                    ui.add_space(5.0);
                    ChartPlotter::draw_metrics(ui, result);
                }

                if self.show_comparison {
                    ui.add_space(SECTION_SPACING);
                    ui.label(RichText::new("User Comparison").size(16.0).strong());
                    ui.add_space(5.0);
                    ChartPlotter::draw_user_comparison(ui, result);
                }

                if self.show_monthly {
                    if let Some(matrix) = &result.monthly_matrix {
                        ui.add_space(SECTION_SPACING);
                        ui.label(RichText::new("Monthly Usage Pattern").size(16.0).strong());
                        ui.add_space(5.0);
                        ChartPlotter::draw_monthly_usage(ui, matrix);
                        ui.add_space(8.0);
                        ChartPlotter::draw_monthly_table(ui, matrix);
                    }
                }
            });
    }
}
