//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use crate::stats::{AggregateResult, MonthlyMatrix};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

/// Bar colors for the user comparison chart
pub const CASUAL_COLOR: Color32 = Color32::from_rgb(91, 155, 213); // Cool blue
pub const REGISTERED_COLOR: Color32 = Color32::from_rgb(237, 125, 49); // Warm orange

/// Paired palette, one color per year series
pub const PALETTE: [Color32; 6] = [
    Color32::from_rgb(31, 120, 180),  // Dark blue
    Color32::from_rgb(51, 160, 44),   // Dark green
    Color32::from_rgb(227, 26, 28),   // Red
    Color32::from_rgb(255, 127, 0),   // Orange
    Color32::from_rgb(106, 61, 154),  // Purple
    Color32::from_rgb(177, 89, 40),   // Brown
];

pub const USER_TYPES: [&str; 2] = ["Casual", "Registered"];

/// Short month names for axis labels
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Format a mean for display; NaN means there was no data.
pub fn format_mean(value: f64) -> String {
    if value.is_nan() {
        "no data".to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// Legend label for a year index.
pub fn year_label(year: i32) -> String {
    format!("Year {}", year)
}

/// Creates dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Get color for a year series.
    pub fn get_year_color(year_index: usize) -> Color32 {
        PALETTE[year_index % PALETTE.len()]
    }

    /// Draw the two mean metrics side by side.
    pub fn draw_metrics(ui: &mut egui::Ui, result: &AggregateResult) {
        ui.horizontal(|ui| {
            for (label, value) in [
                ("Average Casual Users", result.mean_casual),
                ("Average Registered Users", result.mean_registered),
            ] {
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(5.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            ui.label(RichText::new(label).size(12.0).color(Color32::GRAY));
                            let text = RichText::new(format_mean(value)).size(24.0).strong();
                            if value.is_nan() {
                                ui.label(text.color(Color32::GRAY).italics());
                            } else {
                                ui.label(text);
                            }
                        });
                    });
                ui.add_space(12.0);
            }
        });
    }

    /// Bar chart comparing mean casual and registered users.
    /// X-axis: user type, Y-axis: average count
    pub fn draw_user_comparison(ui: &mut egui::Ui, result: &AggregateResult) {
        if !result.has_data() {
            ui.label(RichText::new("No data to compare").italics());
            return;
        }

        let bars = vec![
            Bar::new(0.0, result.mean_casual)
                .name(USER_TYPES[0])
                .fill(CASUAL_COLOR)
                .width(0.6),
            Bar::new(1.0, result.mean_registered)
                .name(USER_TYPES[1])
                .fill(REGISTERED_COLOR)
                .width(0.6),
        ];

        Plot::new(format!("user_comparison_{}", result.variant))
            .height(300.0)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_grid([false, true])
            .include_x(-0.6)
            .include_x(1.6)
            .include_y(0.0)
            .x_axis_label("User Type")
            .y_axis_label("Average Users")
            .x_axis_formatter(|mark, _range| {
                let v = mark.value;
                if (v - v.round()).abs() < f64::EPSILON && (0.0..=1.0).contains(&v) {
                    USER_TYPES[v as usize].to_string()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name("Average users"));
            });
    }

    /// Line chart with one series per year.
    /// X-axis: month 1-12, Y-axis: mean total count
    pub fn draw_monthly_usage(ui: &mut egui::Ui, matrix: &MonthlyMatrix) {
        if matrix.is_empty() {
            ui.label(RichText::new("No monthly data").italics());
            return;
        }

        Plot::new("monthly_usage")
            .height(320.0)
            .legend(Legend::default().position(egui_plot::Corner::LeftTop))
            .allow_scroll(false)
            .include_x(0.5)
            .include_x(12.5)
            .include_y(0.0)
            .x_axis_label("Month")
            .y_axis_label("Number of Users")
            .x_axis_formatter(|mark, _range| {
                let v = mark.value;
                if (v - v.round()).abs() < f64::EPSILON && (1.0..=12.0).contains(&v) {
                    format!("{}", v as u32)
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                for (idx, year) in matrix.years().into_iter().enumerate() {
                    let color = Self::get_year_color(idx);
                    let points: Vec<[f64; 2]> = matrix
                        .year_series(year)
                        .into_iter()
                        .filter(|(_, mean)| !mean.is_nan())
                        .map(|(month, mean)| [month as f64, mean])
                        .collect();

                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(points.iter().copied()))
                            .color(color)
                            .width(2.0)
                            .name(year_label(year)),
                    );

                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(points.iter().copied()))
                            .radius(4.0)
                            .color(color)
                            .name(year_label(year)),
                    );
                }
            });
    }

    /// Draw the year x month table. Missing months are left blank.
    pub fn draw_monthly_table(ui: &mut egui::Ui, matrix: &MonthlyMatrix) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::ScrollArea::horizontal().show(ui, |ui| {
                    egui::Grid::new("monthly_table")
                        .striped(true)
                        .min_col_width(55.0)
                        .spacing([8.0, 4.0])
                        .show(ui, |ui| {
                            // Headers
                            ui.label(RichText::new("Year").strong().size(11.0));
                            for name in MONTH_NAMES {
                                ui.label(RichText::new(name).strong().size(11.0));
                            }
                            ui.end_row();

                            for year in matrix.years() {
                                ui.label(RichText::new(year_label(year)).size(11.0));
                                for month in 1..=12u32 {
                                    let text = matrix
                                        .get(year, month)
                                        .filter(|v| !v.is_nan())
                                        .map(|v| format!("{:.1}", v))
                                        .unwrap_or_default();
                                    ui.label(RichText::new(text).size(11.0));
                                }
                                ui.end_row();
                            }
                        });
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mean() {
        assert_eq!(format_mean(20.0), "20.00");
        assert_eq!(format_mean(0.0), "0.00");
        assert_eq!(format_mean(1234.5678), "1234.57");
        assert_eq!(format_mean(f64::NAN), "no data");
    }

    #[test]
    fn test_year_colors_cycle() {
        assert_eq!(ChartPlotter::get_year_color(0), PALETTE[0]);
        assert_eq!(ChartPlotter::get_year_color(1), PALETTE[1]);
        assert_eq!(ChartPlotter::get_year_color(PALETTE.len()), PALETTE[0]);
    }

    #[test]
    fn test_year_label() {
        assert_eq!(year_label(0), "Year 0");
        assert_eq!(year_label(1), "Year 1");
    }
}
