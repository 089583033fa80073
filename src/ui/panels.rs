use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::classify::ThresholdPreset;
use crate::data::model::Sex;
use crate::state::AppState;
use crate::stats::counts_by_diagnosis;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Copy what we need so we can mutate state inside the closures.
    let sexes = dataset.sexes();
    let age_span = dataset.age_span();
    let conc_span = dataset.concentration_span();
    let date_span = dataset.date_span();
    let columns = dataset.columns.clone();
    let legend = state.color_map.legend_entries(&dataset.thresholds);
    let counts = counts_by_diagnosis(dataset, &state.visible_indices);

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Sex ----
            if !sexes.is_empty() {
                ui.strong("Sex");
                for sex in Sex::ALL {
                    let mut checked = state.filters.sexes.contains(&sex);
                    if ui.checkbox(&mut checked, sex.to_string()).changed() {
                        state.toggle_sex(sex);
                    }
                }
                ui.separator();
            }

            // ---- Age ----
            if let (Some((min, max)), Some((lo, hi))) = (age_span, state.filters.age.as_mut()) {
                ui.strong("Age");
                changed |= ui.add(egui::Slider::new(lo, min..=max).text("from")).changed();
                changed |= ui.add(egui::Slider::new(hi, min..=max).text("to")).changed();
                if *lo > *hi {
                    std::mem::swap(lo, hi);
                }
                ui.separator();
            }

            // ---- Concentration ----
            if let (Some((min, max)), Some((lo, hi))) =
                (conc_span, state.filters.concentration.as_mut())
            {
                ui.strong("Troponin (ng/mL)");
                changed |= ui
                    .add(egui::Slider::new(lo, min..=max).logarithmic(true).text("from"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(hi, min..=max).logarithmic(true).text("to"))
                    .changed();
                if *lo > *hi {
                    std::mem::swap(lo, hi);
                }
                ui.separator();
            }

            // ---- Dates ----
            if let (Some(_), Some((from, to))) = (date_span, state.filters.dates.as_mut()) {
                ui.strong("Date");
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("from");
                    changed |= ui.add(DatePickerButton::new(from).id_salt("date_from")).changed();
                });
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("to");
                    changed |= ui.add(DatePickerButton::new(to).id_salt("date_to")).changed();
                });
                if *from > *to {
                    std::mem::swap(from, to);
                }
                ui.separator();
            }

            // ---- Diagnosis (coloured by severity) ----
            ui.strong("Diagnosis");
            for ((diagnosis, n), (label, color)) in counts.iter().zip(&legend) {
                let mut checked = state.filters.diagnoses.contains(diagnosis);
                let text = RichText::new(format!("{label}  ({n})")).color(*color);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_diagnosis(*diagnosis);
                }
            }
            ui.separator();

            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }

            ui.add_space(8.0);
            export_columns(ui, state, &columns);
        });

    if changed {
        state.refilter();
    }
}

/// Column subset used by File → Export.
fn export_columns(ui: &mut Ui, state: &mut AppState, columns: &[String]) {
    egui::CollapsingHeader::new(RichText::new("Export columns").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.checkbox(
                &mut state.export_options.append_diagnosis,
                "Append diagnosis column",
            );
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.export_options.columns = None;
                }
                if ui.small_button("None").clicked() {
                    state.export_options.columns = Some(Vec::new());
                }
            });
            for col in columns {
                let selected = state
                    .export_options
                    .columns
                    .as_ref()
                    .map_or(true, |cols| cols.contains(col));
                let mut checked = selected;
                if ui.checkbox(&mut checked, col).changed() {
                    let cols = state
                        .export_options
                        .columns
                        .get_or_insert_with(|| columns.to_vec());
                    if checked {
                        cols.push(col.clone());
                        // Keep source order.
                        cols.sort_by_key(|c| columns.iter().position(|x| x == c));
                    } else {
                        cols.retain(|c| c != col);
                    }
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Use synthetic data").clicked() {
                state.use_synthetic();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Export filtered rows…").clicked() {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} measurements, {} visible",
                ds.source,
                ds.len(),
                state.visible_indices.len()
            ));
        }

        ui.separator();
        threshold_selector(ui, state);

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::DARK_GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

fn threshold_selector(ui: &mut Ui, state: &mut AppState) {
    let current = ThresholdPreset::ALL
        .into_iter()
        .find(|p| p.table() == state.thresholds);
    let custom = state.config.thresholds.table().ok().filter(|_| {
        !state.config.thresholds.bands.is_empty()
    });
    let selected_text = current.map_or("Custom (configuration)", ThresholdPreset::name);

    egui::ComboBox::from_id_salt("thresholds")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            for preset in ThresholdPreset::ALL {
                if ui
                    .selectable_label(current == Some(preset), preset.name())
                    .clicked()
                {
                    state.set_thresholds(preset.table());
                }
            }
            if let Some(table) = custom {
                let is_current = table == state.thresholds;
                if ui
                    .selectable_label(is_current, "Custom (configuration)")
                    .clicked()
                {
                    state.set_thresholds(table);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open troponin measurements")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered rows")
        .set_file_name("troponin_filtered.csv")
        .add_filter("CSV", &["csv"])
        .add_filter("TSV", &["tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet"])
        .save_file();

    if let Some(path) = file {
        match state.export_to(&path) {
            Ok(n) => {
                state.status_message = Some(format!("Exported {n} rows to {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to export {}: {e}", path.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
