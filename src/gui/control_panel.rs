//! Control Panel Widget
//! Left side panel with dataset selection and the on-demand chart buttons.

use crate::data::DatasetVariant;
use egui::{Color32, ComboBox, RichText};

/// Severity of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Left side control panel.
pub struct ControlPanel {
    pub variant: DatasetVariant,
    pub session_label: String,
    pub dataset_loaded: bool,
    pub aggregate_ready: bool,
    pub status: String,
    pub status_kind: StatusKind,
}

impl ControlPanel {
    pub fn new(variant: DatasetVariant) -> Self {
        Self {
            variant,
            session_label: String::new(),
            dataset_loaded: false,
            aggregate_ready: false,
            status: "Ready".to_string(),
            status_kind: StatusKind::Info,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚲 Bike Sharing")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(RichText::new("Usage Dashboard").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Dataset Section =====
        ui.label(RichText::new("📁 Dataset").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            let previous = self.variant;
            ComboBox::from_id_salt("dataset_variant")
                .width(170.0)
                .selected_text(self.variant.label())
                .show_ui(ui, |ui| {
                    for variant in DatasetVariant::ALL {
                        ui.selectable_value(&mut self.variant, variant, variant.label());
                    }
                });
            if self.variant != previous {
                action = ControlPanelAction::SelectDataset(self.variant);
            }

            if ui.button("🔄 Reload").clicked() {
                action = ControlPanelAction::Reload;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Analysis Buttons =====
        ui.label(RichText::new("📊 Average Users").size(14.0).strong());
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.dataset_loaded, |ui| {
                if Self::wide_button(ui, "Show Average Users") {
                    action = ControlPanelAction::ShowMetrics;
                }
                ui.add_space(5.0);
                if Self::wide_button(ui, "Show User Comparison") {
                    action = ControlPanelAction::ShowComparison;
                }
                if self.variant.has_monthly_matrix() {
                    ui.add_space(5.0);
                    if Self::wide_button(ui, "Show Monthly Usage Pattern") {
                        action = ControlPanelAction::ShowMonthly;
                    }
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.label(RichText::new("💾 Export").size(14.0).strong());
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.aggregate_ready, |ui| {
                if Self::wide_button(ui, "🖼 Export Charts (PNG)") {
                    action = ControlPanelAction::ExportCharts;
                }
                ui.add_space(5.0);
                if Self::wide_button(ui, "📄 Export Summary (JSON)") {
                    action = ControlPanelAction::ExportSummary;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Session =====
        ui.horizontal(|ui| {
            ui.label(RichText::new(&self.session_label).size(11.0).color(Color32::GRAY));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("New Session").clicked() {
                    action = ControlPanelAction::NewSession;
                }
            });
        });

        ui.add_space(10.0);

        let status_color = match self.status_kind {
            StatusKind::Error => Color32::from_rgb(220, 53, 69),
            StatusKind::Success => Color32::from_rgb(40, 167, 69),
            StatusKind::Info => Color32::GRAY,
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    fn wide_button(ui: &mut egui::Ui, text: &str) -> bool {
        let button = egui::Button::new(RichText::new(text).size(14.0)).min_size(egui::vec2(220.0, 30.0));
        ui.add(button).clicked()
    }

    /// Set status line
    pub fn set_status(&mut self, kind: StatusKind, status: impl Into<String>) {
        self.status_kind = kind;
        self.status = status.into();
    }

    /// Show an error and disable everything that needs data.
    pub fn set_error(&mut self, status: impl Into<String>) {
        self.dataset_loaded = false;
        self.aggregate_ready = false;
        self.set_status(StatusKind::Error, status);
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    SelectDataset(DatasetVariant),
    Reload,
    ShowMetrics,
    ShowComparison,
    ShowMonthly,
    ExportCharts,
    ExportSummary,
    NewSession,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_disables_actions() {
        let mut panel = ControlPanel::new(DatasetVariant::Day);
        panel.dataset_loaded = true;
        panel.aggregate_ready = true;

        panel.set_error("File 'day.csv' not found");
        assert!(!panel.dataset_loaded);
        assert!(!panel.aggregate_ready);
        assert_eq!(panel.status_kind, StatusKind::Error);
        assert_eq!(panel.status, "File 'day.csv' not found");
    }
}
