//! Viewer configuration.
//!
//! Everything that used to be ambient page state (random seed, dataset size,
//! threshold table) is an explicit value here and is passed down to the code
//! that needs it.  The configuration is read from the JSON file named by
//! `TROPONIN_VIEWER_CONFIG`; every field is optional.
//!
//! ```json
//! {
//!   "generator": { "rows": 120, "seed": 7 },
//!   "thresholds": { "preset": "four_band" },
//!   "histogram_bins": 30
//! }
//! ```

use std::path::Path;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::classify::{ThresholdPreset, ThresholdTable};
use crate::error::ConfigError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TROPONIN_VIEWER_CONFIG";

// ---------------------------------------------------------------------------
// Synthetic dataset settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of patients.
    pub rows: usize,
    pub seed: u64,
    /// Date of the first measurement; each following row is one day later.
    pub start_date: NaiveDate,
    /// Inclusive lower bound of the age range.
    pub min_age: u32,
    /// Exclusive upper bound of the age range.
    pub max_age: u32,
    /// Share of rows drawn from the low-concentration component.
    pub normal_fraction: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 60,
            seed: 42,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            min_age: 18,
            max_age: 90,
            normal_fraction: 0.75,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_age >= self.max_age {
            return Err(ConfigError::Invalid(format!(
                "min_age ({}) must be below max_age ({})",
                self.min_age, self.max_age
            )));
        }
        if !(0.0..=1.0).contains(&self.normal_fraction) {
            return Err(ConfigError::Invalid(format!(
                "normal_fraction ({}) must be within [0, 1]",
                self.normal_fraction
            )));
        }
        let span = Days::new(self.rows.saturating_sub(1) as u64);
        if self.start_date.checked_add_days(span).is_none() {
            return Err(ConfigError::Invalid(format!(
                "{} daily rows from start_date {} run past the last representable date",
                self.rows, self.start_date
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Threshold table selection
// ---------------------------------------------------------------------------

/// One band of a custom threshold table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    pub upper: f64,
    pub label: String,
}

/// Either a built-in preset or a custom list of bands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub preset: ThresholdPreset,
    /// When non-empty, overrides `preset`.
    pub bands: Vec<BandConfig>,
    pub top_label: Option<String>,
}

impl ThresholdConfig {
    pub fn table(&self) -> Result<ThresholdTable, ConfigError> {
        if self.bands.is_empty() {
            return Ok(self.preset.table());
        }
        let bands = self
            .bands
            .iter()
            .map(|b| (b.upper, b.label.clone()))
            .collect();
        let top = self.top_label.clone().unwrap_or_else(|| "Critical".to_string());
        Ok(ThresholdTable::new(bands, top)?)
    }
}

// ---------------------------------------------------------------------------
// ViewerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub generator: GeneratorConfig,
    pub thresholds: ThresholdConfig,
    pub histogram_bins: usize,
    /// Initial window size in points.
    pub window_size: [f32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            thresholds: ThresholdConfig::default(),
            histogram_bins: 40,
            window_size: [1280.0, 860.0],
        }
    }
}

impl ViewerConfig {
    /// Read and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: ViewerConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `TROPONIN_VIEWER_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                log::info!("Reading configuration from {}", Path::new(&path).display());
                Self::from_file(Path::new(&path))
            }
            None => {
                log::debug!("{CONFIG_ENV} not set, using default configuration");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator.validate()?;
        self.thresholds.table()?;
        if self.histogram_bins == 0 {
            return Err(ConfigError::Invalid("histogram_bins must be positive".into()));
        }
        Ok(())
    }
}
