use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Dataset;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

/// Visible rows with their source columns plus the derived diagnosis.
pub fn measurement_table(ui: &mut Ui, state: &AppState, dataset: &Dataset) {
    // The derived diagnosis is shown last; a stored one would go stale.
    let columns = dataset.source_columns();
    let n_cols = columns.len();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(360.0)
        .columns(Column::auto().at_least(60.0), n_cols)
        .column(Column::remainder().at_least(100.0))
        .header(22.0, |mut header| {
            for &c in &columns {
                header.col(|ui| {
                    ui.strong(&dataset.columns[c]);
                });
            }
            header.col(|ui| {
                ui.strong("Diagnosis");
            });
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, state.visible_indices.len(), |mut row| {
                let record = &dataset.records[state.visible_indices[row.index()]];
                for &c in &columns {
                    row.col(|ui| {
                        ui.label(record.cells.get(c).map(String::as_str).unwrap_or(""));
                    });
                }
                row.col(|ui| {
                    let color = state.color_map.color_for(record.diagnosis);
                    ui.label(RichText::new(dataset.label(record)).color(color));
                });
            });
        });
}
