//! This module is responsible for generating all visualizations from trajectory log data.

use anyhow::Result;
use grnforge_core::analysis::{self, TrajectoryRecord};
use plotters::prelude::*;

/// A parsed trajectory row, ready for plotting.
#[derive(Clone, Debug)]
struct PlottingData {
    time: f64,
    in_phase_b: bool,
    log_cell_size: f64,
    instantaneous_growth: f64,
    protein_pool: Vec<f64>,
}

/// Generates and saves all plots for one recorded trajectory.
pub fn generate_trajectory_plots(output_dir: &str, log_path: &str, label: &str, protein_names: &[String]) -> Result<()> {
    println!("[Plotting] Generating graphs for '{}'...", label);

    let data = parse_log_file(log_path)?;
    if data.len() < 2 {
        println!("[Plotting] Warning: Not enough samples to plot.");
        return Ok(());
    }

    plot_growth(output_dir, label, &data)?;
    plot_protein_levels(output_dir, label, &data, protein_names)?;

    println!("[Plotting] Graphs have been saved to '{}'.", output_dir);
    Ok(())
}

fn parse_log_file(log_path: &str) -> Result<Vec<PlottingData>> {
    let records: Vec<TrajectoryRecord> = analysis::read_trajectory(log_path)?;
    records
        .into_iter()
        .map(|record| -> Result<PlottingData> {
            Ok(PlottingData {
                time: record.time,
                in_phase_b: record.phase == "B",
                log_cell_size: record.log_cell_size,
                instantaneous_growth: record.instantaneous_growth,
                protein_pool: record.protein_pool()?,
            })
        })
        .collect()
}

/// Time spans spent in signal phase B.
fn phase_b_spans(data: &[PlottingData]) -> Vec<(f64, f64)> {
    let mut spans = Vec::new();
    let mut start = None;
    for d in data {
        match (d.in_phase_b, start) {
            (true, None) => start = Some(d.time),
            (false, Some(s)) => {
                spans.push((s, d.time));
                start = None;
            }
            _ => {}
        }
    }
    if let (Some(s), Some(last)) = (start, data.last()) {
        spans.push((s, last.time));
    }
    spans
}

/// Cell size (log scale) and instantaneous growth rate over time, with phase B shaded.
fn plot_growth(output_dir: &str, label: &str, data: &[PlottingData]) -> Result<()> {
    let path = format!("{}/{}_growth.png", output_dir, label);
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(384);

    let max_time = data.last().map_or(1.0, |d| d.time);
    let max_size = data.iter().map(|d| d.log_cell_size).fold(0.0, f64::max).max(1e-9);
    let max_rate = data.iter().map(|d| d.instantaneous_growth).fold(0.0, f64::max).max(1e-9);
    let spans = phase_b_spans(data);

    let mut size_chart = ChartBuilder::on(&upper)
        .caption(format!("Cell Size ({})", label), ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..max_time, 0f64..max_size * 1.1)?;
    size_chart.configure_mesh().x_desc("Time (min)").y_desc("ln(size)").draw()?;
    size_chart.draw_series(
        spans
            .iter()
            .map(|&(a, b)| Rectangle::new([(a, 0.0), (b, max_size * 1.1)], BLUE.mix(0.1).filled())),
    )?;
    size_chart.draw_series(LineSeries::new(data.iter().map(|d| (d.time, d.log_cell_size)), BLACK.stroke_width(2)))?;

    let mut rate_chart = ChartBuilder::on(&lower)
        .caption("Instantaneous Growth Rate", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..max_time, 0f64..max_rate * 1.1)?;
    rate_chart.configure_mesh().x_desc("Time (min)").y_desc("Growth (1/min)").draw()?;
    rate_chart.draw_series(
        spans
            .iter()
            .map(|&(a, b)| Rectangle::new([(a, 0.0), (b, max_rate * 1.1)], BLUE.mix(0.1).filled())),
    )?;
    rate_chart.draw_series(LineSeries::new(
        data.iter().map(|d| (d.time, d.instantaneous_growth)),
        RED.stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}

/// One line per protein species.
fn plot_protein_levels(output_dir: &str, label: &str, data: &[PlottingData], protein_names: &[String]) -> Result<()> {
    let path = format!("{}/{}_proteins.png", output_dir, label);
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_time = data.last().map_or(1.0, |d| d.time);
    let max_level = data
        .iter()
        .flat_map(|d| d.protein_pool.iter().copied())
        .fold(0.0, f64::max)
        .max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Protein Levels ({})", label), ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..max_time, 0f64..max_level * 1.1)?;
    chart.configure_mesh().x_desc("Time (min)").y_desc("Molecules").draw()?;

    let colors = [RED, GREEN, BLUE, MAGENTA, CYAN, BLACK];
    for (i, name) in protein_names.iter().enumerate() {
        let color = colors[i % colors.len()];
        chart
            .draw_series(LineSeries::new(
                data.iter().map(|d| (d.time, d.protein_pool.get(i).copied().unwrap_or(0.0))),
                color.stroke_width(2),
            ))?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time: f64, in_phase_b: bool) -> PlottingData {
        PlottingData { time, in_phase_b, log_cell_size: 0.0, instantaneous_growth: 0.0, protein_pool: vec![] }
    }

    #[test]
    fn phase_b_spans_cover_runs_of_b_samples() {
        let data = [point(0.0, false), point(1.0, true), point(2.0, true), point(3.0, false), point(4.0, true)];
        assert_eq!(phase_b_spans(&data), vec![(1.0, 3.0), (4.0, 4.0)]);
    }
}
