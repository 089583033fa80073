use std::path::Path;

use crate::classify::{Diagnosis, ThresholdTable};
use crate::color::ColorMap;
use crate::config::ViewerConfig;
use crate::data::export::{export, ExportOptions};
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::generator::generate;
use crate::data::loader::load_file;
use crate::data::model::{Dataset, Sex};
use crate::error::Result;
use crate::stats::Summary;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Central panel tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Exploration,
    Analysis,
    ClinicalInfo,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Exploration, Tab::Analysis, Tab::ClinicalInfo];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Exploration => "📊 Exploration",
            Tab::Analysis => "📈 Analysis",
            Tab::ClinicalInfo => "📘 Clinical information",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Threshold table applied to every newly loaded dataset.
    pub thresholds: ThresholdTable,

    /// Loaded dataset (None only if the last load failed without a previous one).
    pub dataset: Option<Dataset>,

    /// Current filter selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Mean / median / max of the visible rows (cached).
    pub summary: Option<Summary>,

    /// Diagnosis colours.
    pub color_map: ColorMap,

    pub export_options: ExportOptions,

    pub active_tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Build the state and load the synthetic dataset described by `config`.
    pub fn new(config: ViewerConfig, thresholds: ThresholdTable) -> Self {
        let mut state = AppState {
            color_map: ColorMap::new(&thresholds),
            thresholds,
            config,
            dataset: None,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            summary: None,
            export_options: ExportOptions {
                columns: None,
                append_diagnosis: true,
            },
            active_tab: Tab::default(),
            status_message: None,
        };
        state.use_synthetic();
        state
    }

    /// Replace the dataset with a freshly generated synthetic one.
    pub fn use_synthetic(&mut self) {
        match generate(&self.config.generator, &self.thresholds) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to generate synthetic data: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Load a file.  On failure the previous dataset stays in place.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path, &self.thresholds) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} measurements from {} (concentration column '{}')",
                    dataset.len(),
                    path.display(),
                    dataset.concentration_column
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset the filters.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = init_filter_state(&dataset);
        self.export_options.columns = None;
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Switch threshold tables and reclassify the current dataset.
    pub fn set_thresholds(&mut self, thresholds: ThresholdTable) {
        if let Some(ds) = &mut self.dataset {
            if let Err(e) = ds.reclassify(thresholds.clone()) {
                log::error!("Reclassification failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
            // Rank sets mean different things under a new table.
            self.filters.diagnoses = thresholds.diagnoses().collect();
        }
        self.color_map = ColorMap::new(&thresholds);
        self.thresholds = thresholds;
        self.refilter();
    }

    /// Recompute `visible_indices` and the summary after a filter change.
    pub fn refilter(&mut self) {
        match &self.dataset {
            Some(ds) => {
                self.visible_indices = filtered_indices(ds, &self.filters);
                self.summary = Summary::of(&ds.concentrations(&self.visible_indices));
                log::debug!("{} of {} rows visible", self.visible_indices.len(), ds.len());
            }
            None => {
                self.visible_indices.clear();
                self.summary = None;
            }
        }
    }

    /// Select everything again.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters = init_filter_state(ds);
            self.refilter();
        }
    }

    pub fn toggle_sex(&mut self, sex: Sex) {
        if !self.filters.sexes.remove(&sex) {
            self.filters.sexes.insert(sex);
        }
        self.refilter();
    }

    pub fn toggle_diagnosis(&mut self, diagnosis: Diagnosis) {
        if !self.filters.diagnoses.remove(&diagnosis) {
            self.filters.diagnoses.insert(diagnosis);
        }
        self.refilter();
    }

    /// Export the visible rows.
    pub fn export_to(&self, path: &Path) -> Result<usize> {
        let Some(ds) = &self.dataset else {
            return Ok(0);
        };
        export(path, ds, &self.visible_indices, &self.export_options)
    }
}
