//! Diagnostic classifier: troponin concentration → severity label.
//!
//! A [`ThresholdTable`] is an ordered list of `(upper_bound, label)` pairs
//! plus a label for everything at or above the last bound.  Bands are tested
//! in ascending order and the first band whose upper bound is strictly
//! greater than the value wins, so the table partitions `[0, ∞)` with no gap
//! and no overlap:
//!
//! ```text
//!   0 ──── 0.04 ──── 0.4 ──── 1.0 ──── 5.0 ──── ∞
//!   Normal │  Mild   │Moderate│  High  │ Critical
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, ThresholdError};

// ---------------------------------------------------------------------------
// Diagnosis – severity rank into a threshold table
// ---------------------------------------------------------------------------

/// Severity rank of a classified concentration (`0` = least severe).
///
/// The rank only has meaning together with the [`ThresholdTable`] that
/// produced it; use [`ThresholdTable::label`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Diagnosis(u8);

impl Diagnosis {
    pub fn rank(self) -> usize {
        self.0 as usize
    }
}

// ---------------------------------------------------------------------------
// Threshold table
// ---------------------------------------------------------------------------

/// Built-in threshold tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPreset {
    /// `0.04 / 0.4 / 1.0 / 5.0` ng/mL, five labels.
    #[default]
    FiveBand,
    /// `0.014 / 0.05 / 0.5` ng/mL, four labels.
    FourBand,
}

impl ThresholdPreset {
    pub const ALL: [ThresholdPreset; 2] = [ThresholdPreset::FiveBand, ThresholdPreset::FourBand];

    pub fn table(self) -> ThresholdTable {
        match self {
            ThresholdPreset::FiveBand => ThresholdTable::five_band(),
            ThresholdPreset::FourBand => ThresholdTable::four_band(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThresholdPreset::FiveBand => "5 bands (0.04 / 0.4 / 1 / 5)",
            ThresholdPreset::FourBand => "4 bands (0.014 / 0.05 / 0.5)",
        }
    }
}

/// Ordered, exhaustive partition of `[0, ∞)` into labelled bands.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    /// Strictly ascending upper bounds (exclusive).
    bounds: Vec<f64>,
    /// `bounds.len() + 1` labels, the last one is unbounded.
    labels: Vec<String>,
}

impl ThresholdTable {
    /// Build a table from `(upper_bound, label)` pairs and the label for
    /// values at or above the last bound.
    pub fn new(
        bands: Vec<(f64, String)>,
        top_label: impl Into<String>,
    ) -> Result<Self, ThresholdError> {
        if bands.is_empty() {
            return Err(ThresholdError::Empty);
        }
        if bands.len() >= u8::MAX as usize {
            return Err(ThresholdError::TooManyBands(bands.len() + 1));
        }

        let mut bounds = Vec::with_capacity(bands.len());
        let mut labels = Vec::with_capacity(bands.len() + 1);
        for (index, (bound, label)) in bands.into_iter().enumerate() {
            if !bound.is_finite() || bound <= 0.0 {
                return Err(ThresholdError::InvalidBound { index, value: bound });
            }
            if let Some(&prev) = bounds.last() {
                if bound <= prev {
                    return Err(ThresholdError::NotAscending { index, value: bound });
                }
            }
            if label.trim().is_empty() {
                return Err(ThresholdError::EmptyLabel { index });
            }
            bounds.push(bound);
            labels.push(label);
        }

        let top_label = top_label.into();
        if top_label.trim().is_empty() {
            return Err(ThresholdError::EmptyLabel { index: labels.len() });
        }
        labels.push(top_label);

        Ok(ThresholdTable { bounds, labels })
    }

    /// The canonical table.
    pub fn five_band() -> Self {
        Self::from_static(
            &[(0.04, "Normal"), (0.4, "Mild"), (1.0, "Moderate"), (5.0, "High")],
            "Critical",
        )
    }

    pub fn four_band() -> Self {
        Self::from_static(
            &[
                (0.014, "Normal"),
                (0.05, "Moderate risk"),
                (0.5, "Suspected damage"),
            ],
            "Probable infarction",
        )
    }

    // Built-in tables are known to be valid, so skip the checks in `new`.
    fn from_static(bands: &[(f64, &str)], top_label: &str) -> Self {
        let bounds = bands.iter().map(|&(b, _)| b).collect();
        let mut labels: Vec<String> = bands.iter().map(|&(_, l)| l.to_string()).collect();
        labels.push(top_label.to_string());
        ThresholdTable { bounds, labels }
    }

    /// Map a concentration (ng/mL) to its band.
    ///
    /// Negative and non-finite input is rejected, never guessed.
    pub fn classify(&self, value: f64) -> Result<Diagnosis, ClassifyError> {
        if !value.is_finite() {
            return Err(ClassifyError::NonFinite(value));
        }
        if value < 0.0 {
            return Err(ClassifyError::Negative(value));
        }
        let rank = self
            .bounds
            .iter()
            .position(|&upper| value < upper)
            .unwrap_or(self.bounds.len());
        Ok(Diagnosis(rank as u8))
    }

    /// Display label for a diagnosis produced by this table.
    pub fn label(&self, diagnosis: Diagnosis) -> &str {
        self.labels
            .get(diagnosis.rank())
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// All diagnoses, least severe first.
    pub fn diagnoses(&self) -> impl Iterator<Item = Diagnosis> + '_ {
        (0..self.labels.len()).map(|r| Diagnosis(r as u8))
    }

    /// Look a diagnosis up by its label (case-insensitive).
    pub fn by_label(&self, label: &str) -> Option<Diagnosis> {
        self.labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(label.trim()))
            .map(|r| Diagnosis(r as u8))
    }

    /// Lower (inclusive) and upper (exclusive) bound of a band.
    pub fn range(&self, diagnosis: Diagnosis) -> (f64, f64) {
        let r = diagnosis.rank();
        let lower = if r == 0 { 0.0 } else { self.bounds[r - 1] };
        let upper = self.bounds.get(r).copied().unwrap_or(f64::INFINITY);
        (lower, upper)
    }

    /// Number of bands.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::five_band()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_of(table: &ThresholdTable, v: f64) -> &str {
        table.label(table.classify(v).unwrap())
    }

    #[test]
    fn five_band_boundaries() {
        let t = ThresholdTable::five_band();
        assert_eq!(label_of(&t, 0.0), "Normal");
        assert_eq!(label_of(&t, 0.039), "Normal");
        assert_eq!(label_of(&t, 0.04), "Mild");
        assert_eq!(label_of(&t, 0.399), "Mild");
        assert_eq!(label_of(&t, 0.4), "Moderate");
        assert_eq!(label_of(&t, 1.0), "High");
        assert_eq!(label_of(&t, 4.999), "High");
        assert_eq!(label_of(&t, 5.0), "Critical");
        assert_eq!(label_of(&t, 1e9), "Critical");
    }

    #[test]
    fn four_band_boundaries() {
        let t = ThresholdTable::four_band();
        assert_eq!(t.len(), 4);
        assert_eq!(label_of(&t, 0.013), "Normal");
        assert_eq!(label_of(&t, 0.014), "Moderate risk");
        assert_eq!(label_of(&t, 0.05), "Suspected damage");
        assert_eq!(label_of(&t, 0.5), "Probable infarction");
    }

    #[test]
    fn rejects_invalid_input() {
        let t = ThresholdTable::five_band();
        assert_eq!(t.classify(-0.01), Err(ClassifyError::Negative(-0.01)));
        assert!(matches!(t.classify(f64::NAN), Err(ClassifyError::NonFinite(_))));
        assert!(matches!(t.classify(f64::INFINITY), Err(ClassifyError::NonFinite(_))));
    }

    #[test]
    fn negative_zero_is_normal() {
        let t = ThresholdTable::five_band();
        assert_eq!(label_of(&t, -0.0), "Normal");
    }

    #[test]
    fn custom_table_validation() {
        assert_eq!(
            ThresholdTable::new(vec![], "Top"),
            Err(ThresholdError::Empty)
        );
        assert_eq!(
            ThresholdTable::new(vec![(0.5, "A".into()), (0.5, "B".into())], "C"),
            Err(ThresholdError::NotAscending { index: 1, value: 0.5 })
        );
        assert_eq!(
            ThresholdTable::new(vec![(0.0, "A".into())], "B"),
            Err(ThresholdError::InvalidBound { index: 0, value: 0.0 })
        );
        assert_eq!(
            ThresholdTable::new(vec![(1.0, " ".into())], "B"),
            Err(ThresholdError::EmptyLabel { index: 0 })
        );
        assert_eq!(
            ThresholdTable::new(vec![(1.0, "A".into())], ""),
            Err(ThresholdError::EmptyLabel { index: 1 })
        );

        let t = ThresholdTable::new(vec![(1.0, "Low".into()), (2.0, "Mid".into())], "Top").unwrap();
        assert_eq!(label_of(&t, 1.5), "Mid");
        assert_eq!(t.range(t.by_label("mid").unwrap()), (1.0, 2.0));
    }

    #[test]
    fn presets_match_builtin_tables() {
        assert_eq!(ThresholdPreset::default().table(), ThresholdTable::five_band());
        assert_eq!(ThresholdPreset::FourBand.table(), ThresholdTable::four_band());
        let rebuilt = ThresholdTable::new(
            vec![
                (0.04, "Normal".into()),
                (0.4, "Mild".into()),
                (1.0, "Moderate".into()),
                (5.0, "High".into()),
            ],
            "Critical",
        )
        .unwrap();
        assert_eq!(rebuilt, ThresholdTable::five_band());
    }

    #[test]
    fn ranges_cover_zero_to_infinity() {
        let t = ThresholdTable::five_band();
        let ranges: Vec<(f64, f64)> = t.diagnoses().map(|d| t.range(d)).collect();
        assert_eq!(ranges.first().unwrap().0, 0.0);
        assert_eq!(ranges.last().unwrap().1, f64::INFINITY);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }
}
