//! Static Chart Renderer
//! Draws the dashboard charts with plotters into PNG bytes for export.
//!
//! Both charts are rendered into an in-memory RGB buffer and encoded with
//! the `image` crate, so nothing touches the disk until the caller saves.

use crate::charts::plotter::{year_label, MONTH_NAMES, USER_TYPES};
use crate::stats::{AggregateResult, MonthlyMatrix};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

// Colors (RGB)
const CASUAL: RGBColor = RGBColor(91, 155, 213);
const REGISTERED: RGBColor = RGBColor(237, 125, 49);
const GRID: RGBColor = RGBColor(200, 200, 200);
const YEAR_COLORS: [RGBColor; 6] = [
    RGBColor(31, 120, 180),
    RGBColor(51, 160, 44),
    RGBColor(227, 26, 28),
    RGBColor(255, 127, 0),
    RGBColor(106, 61, 154),
    RGBColor(177, 89, 40),
];

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to draw: {0}")]
    NoData(&'static str),
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Invalid image size {0}x{1}")]
    Size(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the casual vs registered bar chart to PNG bytes.
    pub fn render_user_comparison(
        result: &AggregateResult,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if !result.has_data() {
            return Err(RenderError::NoData("dataset is empty"));
        }
        let values = [result.mean_casual, result.mean_registered];
        let y_max = Self::y_upper_bound(values.iter().copied().fold(0.0, f64::max));

        Self::render_png(width, height, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Average Casual vs Registered Users", (FONT, 26))
                .margin(20)
                .x_label_area_size(45)
                .y_label_area_size(70)
                .build_cartesian_2d((0u32..1u32).into_segmented(), 0f64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .light_line_style(WHITE)
                .bold_line_style(GRID)
                .x_desc("User Type")
                .y_desc("Average Users")
                .x_label_formatter(&|v| match v {
                    SegmentValue::CenterOf(i) => USER_TYPES
                        .get(*i as usize)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                    _ => String::new(),
                })
                .draw()?;

            for (idx, (value, color)) in values.iter().zip([CASUAL, REGISTERED]).enumerate() {
                chart.draw_series(
                    Histogram::vertical(&chart)
                        .style(color.filled())
                        .margin(60)
                        .data(std::iter::once((idx as u32, *value))),
                )?;
            }
            Ok(())
        })
    }

    /// Render the monthly usage line chart (one line per year) to PNG bytes.
    pub fn render_monthly_usage(
        matrix: &MonthlyMatrix,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let Some(max) = matrix.max_value() else {
            return Err(RenderError::NoData("no monthly data"));
        };
        let y_max = Self::y_upper_bound(max);

        Self::render_png(width, height, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Bike Usage Throughout the Year", (FONT, 26))
                .margin(20)
                .x_label_area_size(45)
                .y_label_area_size(70)
                .build_cartesian_2d(1u32..12u32, 0f64..y_max)?;

            chart
                .configure_mesh()
                .x_labels(12)
                .light_line_style(WHITE)
                .bold_line_style(GRID)
                .x_desc("Month")
                .y_desc("Number of Users")
                .x_label_formatter(&|m| {
                    MONTH_NAMES
                        .get((*m as usize).wrapping_sub(1))
                        .map(|s| s.to_string())
                        .unwrap_or_default()
                })
                .draw()?;

            for (idx, year) in matrix.years().into_iter().enumerate() {
                let color = YEAR_COLORS[idx % YEAR_COLORS.len()];
                let points: Vec<(u32, f64)> = matrix
                    .year_series(year)
                    .into_iter()
                    .filter(|(_, v)| !v.is_nan())
                    .collect();

                chart
                    .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
                    .label(year_label(year))
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });

                chart.draw_series(
                    points
                        .iter()
                        .map(|&(m, v)| Circle::new((m, v), 4, color.filled())),
                )?;
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
            Ok(())
        })
    }

    /// Leave 15% headroom above the tallest value.
    fn y_upper_bound(max: f64) -> f64 {
        if max > 0.0 {
            max * 1.15
        } else {
            1.0
        }
    }

    /// Run `draw` on a white RGB canvas and encode the result as PNG.
    fn render_png<F>(width: u32, height: u32, draw: F) -> Result<Vec<u8>, RenderError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), RenderError>,
    {
        if width == 0 || height == 0 {
            return Err(RenderError::Size(width, height));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;
            draw(&root)?;
            root.present()?;
        }

        let image = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Size(width, height))?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
