use eframe::egui::{self, RichText, Ui};

use crate::state::AppState;

/// Clinical background and the active threshold table.
pub fn clinical_info(ui: &mut Ui, state: &AppState) {
    ui.heading("Cardiac troponin I (cTnI)");
    ui.label(
        "Cardiac troponin is the reference biomarker for injury to the heart muscle. \
         Raised concentrations indicate myocardial damage, including acute myocardial \
         infarction (AMI).",
    );
    ui.label(
        "Troponin is a complex of three subunits (I, T and C) bound to the thin filaments \
         of the sarcomere. cTnI is specific to cardiac muscle, so it only reaches the \
         blood in measurable amounts when cardiomyocytes are damaged.",
    );
    ui.add_space(12.0);

    ui.heading("Diagnostic thresholds");
    ui.label(
        RichText::new("Simulated data for teaching purposes; not clinically validated.").italics(),
    );
    ui.add_space(4.0);

    let table = &state.thresholds;
    egui::Grid::new("threshold_table")
        .striped(true)
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.strong("Concentration (ng/mL)");
            ui.strong("Diagnosis");
            ui.end_row();

            for d in table.diagnoses() {
                let (lo, hi) = table.range(d);
                let range = if hi.is_infinite() {
                    format!("≥ {lo}")
                } else if d.rank() == 0 {
                    format!("< {hi}")
                } else {
                    format!("{lo} – {hi}")
                };
                ui.label(range);
                ui.label(RichText::new(table.label(d)).color(state.color_map.color_for(d)));
                ui.end_row();
            }
        });
}
