use eframe::egui::{self, RichText, Ui};

use crate::state::{AppState, Tab};
use crate::ui::{info, panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TroponinApp {
    pub state: AppState,
}

impl TroponinApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for TroponinApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    ui.selectable_value(&mut self.state.active_tab, tab, tab.title());
                }
            });
            ui.separator();

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.active_tab {
                    Tab::Exploration => exploration_tab(ui, &self.state),
                    Tab::Analysis => analysis_tab(ui, &self.state),
                    Tab::ClinicalInfo => info::clinical_info(ui, &self.state),
                });
        });
    }
}

fn no_dataset(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Open a file to view measurements  (File → Open…)");
    });
}

fn exploration_tab(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return no_dataset(ui);
    };

    ui.heading("Measurements");
    table::measurement_table(ui, state, dataset);
    ui.add_space(12.0);

    ui.heading("Troponin vs age");
    plot::age_scatter(ui, state, dataset);
}

fn analysis_tab(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return no_dataset(ui);
    };

    ui.columns(3, |cols| {
        let (mean, median, max) = match &state.summary {
            Some(s) => (
                format!("{:.3}", s.mean),
                format!("{:.3}", s.median),
                format!("{:.3}", s.max),
            ),
            None => ("–".into(), "–".into(), "–".into()),
        };
        metric(&mut cols[0], "Mean (ng/mL)", &mean);
        metric(&mut cols[1], "Median (ng/mL)", &median);
        metric(&mut cols[2], "Max (ng/mL)", &max);
    });
    ui.separator();

    ui.heading("Troponin distribution");
    plot::concentration_histogram(ui, state, dataset);
    ui.add_space(12.0);

    ui.heading("Box plot by diagnosis");
    plot::diagnosis_box_plot(ui, state, dataset);
    ui.add_space(12.0);

    ui.heading("Troponin over time");
    plot::troponin_over_time(ui, state, dataset);
}

fn metric(ui: &mut Ui, title: &str, value: &str) {
    ui.group(|ui: &mut Ui| {
        ui.label(title);
        ui.label(RichText::new(value).size(28.0).strong());
    });
}
