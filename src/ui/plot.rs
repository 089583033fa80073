use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points,
};

use crate::data::model::Dataset;
use crate::state::AppState;
use crate::stats::{concentrations_by_diagnosis, histogram, BoxStats};

const PLOT_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Troponin vs age (scatter)
// ---------------------------------------------------------------------------

/// Scatter of concentration against age, one series per diagnosis.  Marker
/// size grows with concentration.
pub fn age_scatter(ui: &mut Ui, state: &AppState, dataset: &Dataset) {
    let max = dataset
        .concentrations(&state.visible_indices)
        .into_iter()
        .fold(0.0, f64::max);

    Plot::new("age_scatter")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Age (years)")
        .y_axis_label("Troponin (ng/mL)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for diagnosis in dataset.thresholds.diagnoses() {
                // One series per marker size; equal names share a legend entry.
                let mut by_size: BTreeMap<u8, Vec<[f64; 2]>> = BTreeMap::new();
                for r in state.visible_indices.iter().map(|&i| &dataset.records[i]) {
                    if r.diagnosis != diagnosis {
                        continue;
                    }
                    let Some(age) = r.measurement.age else { continue };
                    let v = r.measurement.troponin_ng_ml;
                    by_size
                        .entry(size_step(v, max))
                        .or_default()
                        .push([age as f64, v]);
                }
                for (step, points) in by_size {
                    plot_ui.points(
                        Points::new(points.into_iter().collect::<PlotPoints>())
                            .name(dataset.thresholds.label(diagnosis))
                            .color(state.color_map.color_for(diagnosis))
                            .radius(step_radius(step)),
                    );
                }
            }
        });
}

const MIN_RADIUS: f32 = 2.5;
const MAX_RADIUS: f32 = 10.0;
const SIZE_STEPS: u8 = 8;

/// Quantised marker size for `value`, scaled by area against `max`.
fn size_step(value: f64, max: f64) -> u8 {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    let frac = (value / max).clamp(0.0, 1.0).sqrt();
    (frac * f64::from(SIZE_STEPS)).round() as u8
}

fn step_radius(step: u8) -> f32 {
    MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * f32::from(step) / f32::from(SIZE_STEPS)
}

// ---------------------------------------------------------------------------
// Distribution (stacked histogram)
// ---------------------------------------------------------------------------

/// Histogram of concentrations, stacked by diagnosis.
pub fn concentration_histogram(ui: &mut Ui, state: &AppState, dataset: &Dataset) {
    let values = dataset.concentrations(&state.visible_indices);
    let Some(hist) = histogram(&values, state.config.histogram_bins) else {
        ui.label("No rows match the current filters.");
        return;
    };

    let mut charts: Vec<BarChart> = Vec::new();
    for (diagnosis, group) in concentrations_by_diagnosis(dataset, &state.visible_indices) {
        if group.is_empty() {
            continue;
        }
        let mut counts = vec![0usize; hist.counts.len()];
        for v in group {
            counts[hist.bin_of(v)] += 1;
        }
        let bars: Vec<Bar> = counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(i, &c)| Bar::new(hist.center(i), c as f64).width(hist.width * 0.95))
            .collect();

        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(dataset.thresholds.label(diagnosis))
            .color(state.color_map.color_for(diagnosis))
            .stack_on(&below);
        charts.push(chart);
    }

    Plot::new("concentration_histogram")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Troponin (ng/mL)")
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Box plot per diagnosis
// ---------------------------------------------------------------------------

pub fn diagnosis_box_plot(ui: &mut Ui, state: &AppState, dataset: &Dataset) {
    let labels: Vec<String> = dataset
        .thresholds
        .diagnoses()
        .map(|d| dataset.thresholds.label(d).to_string())
        .collect();

    Plot::new("diagnosis_box_plot")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .y_axis_label("Troponin (ng/mL)")
        .x_axis_formatter(move |mark, _range| {
            let rank = mark.value.round();
            if (mark.value - rank).abs() < 1e-6 && rank >= 0.0 {
                labels.get(rank as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for (diagnosis, group) in concentrations_by_diagnosis(dataset, &state.visible_indices) {
                let Some(stats) = BoxStats::of(&group) else {
                    continue;
                };
                let x = diagnosis.rank() as f64;
                let color = state.color_map.color_for(diagnosis);
                let label = dataset.thresholds.label(diagnosis);

                let elem = BoxElem::new(
                    x,
                    BoxSpread::new(
                        stats.lower_whisker,
                        stats.q1,
                        stats.median,
                        stats.q3,
                        stats.upper_whisker,
                    ),
                )
                .name(label)
                .box_width(0.5)
                .whisker_width(0.3)
                .fill(color.gamma_multiply(0.3))
                .stroke(Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(label).color(color));

                // All points, like a strip plot next to each box.
                let points: PlotPoints = group.iter().map(|&v| [x + 0.35, v]).collect();
                plot_ui.points(Points::new(points).color(color).radius(2.5));
            }
        });
}

// ---------------------------------------------------------------------------
// Troponin over time (line)
// ---------------------------------------------------------------------------

/// Concentration by measurement date, x axis in days since the common era.
pub fn troponin_over_time(ui: &mut Ui, state: &AppState, dataset: &Dataset) {
    let mut dated: Vec<(NaiveDate, f64)> = state
        .visible_indices
        .iter()
        .map(|&i| &dataset.records[i].measurement)
        .filter_map(|m| Some((m.date?, m.troponin_ng_ml)))
        .collect();
    if dated.is_empty() {
        ui.label("No dated measurements to show.");
        return;
    }
    dated.sort_by_key(|&(d, _)| d);

    let points: PlotPoints = dated
        .iter()
        .map(|&(d, v)| [d.num_days_from_ce() as f64, v])
        .collect();

    Plot::new("troponin_over_time")
        .height(PLOT_HEIGHT)
        .y_axis_label("Troponin (ng/mL)")
        .x_axis_formatter(|mark, _range| {
            NaiveDate::from_num_days_from_ce_opt(mark.value.round() as i32)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .label_formatter(|_name, point| {
            let date = NaiveDate::from_num_days_from_ce_opt(point.x.round() as i32)
                .map(|d| d.to_string())
                .unwrap_or_default();
            format!("{date}\n{:.3} ng/mL", point.y)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Troponin").width(1.5));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_size_grows_with_concentration() {
        assert_eq!(size_step(0.0, 3.0), 0);
        assert_eq!(size_step(3.0, 3.0), SIZE_STEPS);
        assert!(size_step(0.3, 3.0) < size_step(1.2, 3.0));
        assert_eq!(step_radius(0), MIN_RADIUS);
        assert_eq!(step_radius(SIZE_STEPS), MAX_RADIUS);
    }

    #[test]
    fn marker_size_without_a_range() {
        assert_eq!(size_step(0.0, 0.0), 0);
        assert_eq!(size_step(f64::NAN, 1.0), 0);
    }
}
