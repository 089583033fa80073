//! Summary statistics over the filtered subset.

use crate::classify::Diagnosis;
use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Summary (mean / median / max)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// `None` for an empty slice.
    pub fn of(values: &[f64]) -> Option<Summary> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        Some(Summary {
            count,
            mean,
            median: quantile_sorted(&sorted, 0.5),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

/// Quantile by linear interpolation between closest ranks (the Pandas
/// default).  `sorted` must be non-empty and ascending.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub start: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Centre of bin `i`.
    pub fn center(&self, i: usize) -> f64 {
        self.start + self.width * (i as f64 + 0.5)
    }

    /// Bin index for `v`, clamped to the last bin for `v == max`.
    pub fn bin_of(&self, v: f64) -> usize {
        if self.width <= 0.0 {
            return 0;
        }
        let i = ((v - self.start) / self.width).floor();
        (i.max(0.0) as usize).min(self.counts.len().saturating_sub(1))
    }
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
/// A constant sample gets a single bin of width 1.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    let summary = Summary::of(values)?;
    let bins = bins.max(1);
    let span = summary.max - summary.min;

    let mut hist = if span > 0.0 {
        Histogram {
            start: summary.min,
            width: span / bins as f64,
            counts: vec![0; bins],
        }
    } else {
        Histogram {
            start: summary.min - 0.5,
            width: 1.0,
            counts: vec![0; 1],
        }
    };
    for &v in values {
        let i = hist.bin_of(v);
        hist.counts[i] += 1;
    }
    Some(hist)
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

/// Five-number summary with Tukey whiskers (furthest data within 1.5·IQR).
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn of(values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = || sorted.iter().copied().filter(|v| (lo_fence..=hi_fence).contains(v));
        let lower_whisker = inside().next().unwrap_or(q1);
        let upper_whisker = inside().last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| !(lo_fence..=hi_fence).contains(v))
            .collect();

        Some(BoxStats {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            outliers,
        })
    }
}

// ---------------------------------------------------------------------------
// Per-diagnosis helpers
// ---------------------------------------------------------------------------

/// Concentrations of the selected rows grouped by diagnosis, in severity
/// order.  Diagnoses without rows are included with an empty vector.
pub fn concentrations_by_diagnosis(dataset: &Dataset, indices: &[usize]) -> Vec<(Diagnosis, Vec<f64>)> {
    let mut groups: Vec<(Diagnosis, Vec<f64>)> = dataset
        .thresholds
        .diagnoses()
        .map(|d| (d, Vec::new()))
        .collect();
    for &i in indices {
        let Some(record) = dataset.records.get(i) else {
            continue;
        };
        if let Some((_, values)) = groups.get_mut(record.diagnosis.rank()) {
            values.push(record.measurement.troponin_ng_ml);
        }
    }
    groups
}

/// Row count per diagnosis, in severity order.
pub fn counts_by_diagnosis(dataset: &Dataset, indices: &[usize]) -> Vec<(Diagnosis, usize)> {
    concentrations_by_diagnosis(dataset, indices)
        .into_iter()
        .map(|(d, v)| (d, v.len()))
        .collect()
}
