//! Dataset Table Widget
//! Virtualised view of the loaded DataFrame: only visible rows are laid out.

use egui::{RichText, ScrollArea};
use polars::prelude::*;

const CELL_WIDTH: f32 = 90.0;
const TABLE_HEIGHT: f32 = 320.0;

/// Text shown for one cell. Nulls are blank.
pub fn cell_text(column: &Column, row: usize) -> String {
    column
        .get(row)
        .ok()
        .map(|val| {
            if val.is_null() {
                String::new()
            } else {
                val.to_string().trim_matches('"').to_string()
            }
        })
        .unwrap_or_default()
}

pub struct DataTable {
    /// 0 shows every row
    pub row_limit: usize,
}

impl DataTable {
    pub fn new(row_limit: usize) -> Self {
        Self { row_limit }
    }

    /// Rows actually displayed for a frame of `total` rows.
    pub fn visible_rows(&self, total: usize) -> usize {
        if self.row_limit == 0 {
            total
        } else {
            total.min(self.row_limit)
        }
    }

    pub fn show(&self, ui: &mut egui::Ui, df: &DataFrame) {
        let columns = df.get_columns();
        let total = df.height();
        let rows = self.visible_rows(total);
        let row_height = ui.text_style_height(&egui::TextStyle::Body) + 4.0;

        if rows < total {
            ui.label(
                RichText::new(format!("Showing first {} of {} rows", rows, total))
                    .size(11.0)
                    .italics(),
            );
        }

        ScrollArea::horizontal().id_salt("dataset_hscroll").show(ui, |ui| {
            ui.vertical(|ui| {
                // Headers
                ui.horizontal(|ui| {
                    for column in columns {
                        Self::cell(ui, RichText::new(column.name().as_str()).strong(), row_height);
                    }
                });
                ui.separator();

                ScrollArea::vertical()
                    .id_salt("dataset_vscroll")
                    .max_height(TABLE_HEIGHT)
                    .auto_shrink([false, true])
                    .show_rows(ui, row_height, rows, |ui, row_range| {
                        for row in row_range {
                            ui.horizontal(|ui| {
                                for column in columns {
                                    Self::cell(ui, RichText::new(cell_text(column, row)), row_height);
                                }
                            });
                        }
                    });
            });
        });
    }

    fn cell(ui: &mut egui::Ui, text: RichText, row_height: f32) {
        ui.add_sized(
            [CELL_WIDTH, row_height],
            egui::Label::new(text.size(11.0)).truncate(),
        );
    }
}
