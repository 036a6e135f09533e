//! Result plotting
//!
//! One multi-series line chart per call, rendered to SVG. Programs with an
//! empty series are left out of the chart and its legend.

use crate::error::{HarnessError, HarnessResult};
use crate::types::{Program, ProgramSeries, SeriesPoint};
use plotters::prelude::*;
use std::path::Path;

/// Renders sweep series as line charts
#[derive(Debug, Clone, Copy)]
pub struct ResultPlotter {
    width: u32,
    height: u32,
}

fn program_color(program: Program) -> RGBColor {
    match program {
        Program::Cas => BLUE,
        Program::Tas => RED,
        Program::BoundedCas => GREEN,
        Program::Sequential => MAGENTA,
    }
}

/// Data bounds with 5% padding; degenerate ranges are widened by one unit
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad, hi + pad)
}

impl ResultPlotter {
    /// Create a plotter with the given image size in pixels
    #[inline]
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render `series` to `path`
    ///
    /// # Errors
    /// Returns `Io` if the parent directory cannot be created and `Plot` if
    /// the backend fails to draw or write the image.
    pub fn plot(
        &self,
        series: &ProgramSeries,
        x_label: &str,
        y_label: &str,
        title: &str,
        path: &Path,
    ) -> HarnessResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
        }

        self.render(series, x_label, y_label, title, path)
            .map_err(|e| HarnessError::Plot(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "wrote plot");
        Ok(())
    }

    fn render(
        &self,
        series: &ProgramSeries,
        x_label: &str,
        y_label: &str,
        title: &str,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let drawn: Vec<(Program, &[SeriesPoint])> = series
            .iter()
            .filter(|(_, points)| !points.is_empty())
            .map(|(program, points)| (*program, points.as_slice()))
            .collect();

        let all_points = || drawn.iter().flat_map(|(_, points)| points.iter());
        let (x_min, x_max) = padded_range(all_points().map(|p| f64::from(p.x)));
        let (y_min, y_max) = padded_range(all_points().map(|p| p.y));

        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()?;

        for (program, points) in &drawn {
            let color = program_color(*program);
            let line = points.iter().map(|p| (f64::from(p.x), p.y));
            chart
                .draw_series(LineSeries::new(line, color.stroke_width(2)))?
                .label(program.name())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart.draw_series(
                points
                    .iter()
                    .map(|p| Circle::new((f64::from(p.x), p.y), 4, color.filled())),
            )?;
        }

        if !drawn.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}
