use chrono::Days;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution};

use crate::classify::ThresholdTable;
use crate::config::GeneratorConfig;
use crate::error::{DatasetError, Result};

use super::model::{DataSource, Dataset, Measurement, Sex};

/// Column names of generated datasets.
pub const COLUMNS: [&str; 5] = ["patient_id", "age", "sex", "troponin_ng_mL", "date"];

// ---------------------------------------------------------------------------
// Synthetic population
// ---------------------------------------------------------------------------

/// Generate a reproducible synthetic population.
///
/// Concentrations come from a two-component beta mixture: most rows from
/// `Beta(1.5, 50) * 0.05` (well under the first threshold) and the rest from
/// `Beta(2, 5) * 3.0`, which produces the long right tail.  Values are
/// rounded to 3 decimals and shuffled so the tail is spread over the dates.
pub fn generate(config: &GeneratorConfig, thresholds: &ThresholdTable) -> Result<Dataset> {
    config
        .validate()
        .map_err(|e| DatasetError::Generator(e.to_string()))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.rows;

    let ages: Vec<u32> = (0..n)
        .map(|_| rng.random_range(config.min_age..config.max_age))
        .collect();
    let sexes: Vec<Sex> = (0..n)
        .map(|_| if rng.random_bool(0.5) { Sex::Male } else { Sex::Female })
        .collect();

    let n_normal = (n as f64 * config.normal_fraction).floor() as usize;
    let low = beta(1.5, 50.0)?;
    let high = beta(2.0, 5.0)?;
    let mut troponin: Vec<f64> = (0..n)
        .map(|i| {
            if i < n_normal {
                low.sample(&mut rng) * 0.05
            } else {
                high.sample(&mut rng) * 3.0
            }
        })
        .map(round3)
        .collect();
    troponin.shuffle(&mut rng);

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let date = config
            .start_date
            .checked_add_days(Days::new(i as u64))
            .ok_or_else(|| {
                DatasetError::Generator(format!(
                    "{} rows starting on {} run past the last representable date",
                    n, config.start_date
                ))
            })?;
        let measurement = Measurement {
            patient_id: Some(i as i64 + 1),
            age: Some(ages[i]),
            sex: Some(sexes[i]),
            troponin_ng_ml: troponin[i],
            date: Some(date),
        };
        let cells = vec![
            (i + 1).to_string(),
            ages[i].to_string(),
            sexes[i].to_string(),
            troponin[i].to_string(),
            date.format("%Y-%m-%d").to_string(),
        ];
        rows.push((cells, measurement));
    }

    log::debug!(
        "Generated {n} synthetic measurements (seed {}, {n_normal} from the low component)",
        config.seed
    );

    Dataset::build(
        COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
        COLUMNS[3].to_string(),
        thresholds.clone(),
        DataSource::Synthetic { seed: config.seed },
    )
}

fn beta(alpha: f64, beta: f64) -> Result<Beta<f64>> {
    Beta::new(alpha, beta)
        .map_err(|e| DatasetError::Generator(format!("Beta({alpha}, {beta}): {e}")))
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn default_dataset() -> Dataset {
        generate(&GeneratorConfig::default(), &ThresholdTable::five_band()).unwrap()
    }

    #[test]
    fn same_seed_same_data() {
        let a = default_dataset();
        let b = default_dataset();
        let cells_a: Vec<_> = a.records.iter().map(|r| r.cells.clone()).collect();
        let cells_b: Vec<_> = b.records.iter().map(|r| r.cells.clone()).collect();
        assert_eq!(cells_a, cells_b);
    }

    #[test]
    fn different_seed_different_data() {
        let a = default_dataset();
        let cfg = GeneratorConfig {
            seed: 43,
            ..GeneratorConfig::default()
        };
        let b = generate(&cfg, &ThresholdTable::five_band()).unwrap();
        let ta = a.concentrations(&(0..a.len()).collect::<Vec<_>>());
        let tb = b.concentrations(&(0..b.len()).collect::<Vec<_>>());
        assert_ne!(ta, tb);
    }

    #[test]
    fn shape_and_ranges() {
        let ds = default_dataset();
        assert_eq!(ds.len(), 60);
        assert_eq!(ds.columns, COLUMNS);
        for (i, r) in ds.records.iter().enumerate() {
            let m = &r.measurement;
            assert_eq!(m.patient_id, Some(i as i64 + 1));
            assert!((18..90).contains(&m.age.unwrap()));
            assert!(m.troponin_ng_ml >= 0.0 && m.troponin_ng_ml <= 3.0);
            assert_eq!(round3(m.troponin_ng_ml), m.troponin_ng_ml);
        }
        let first = ds.records[0].measurement.date.unwrap();
        let last = ds.records[59].measurement.date.unwrap();
        assert_eq!(first.to_string(), "2025-01-01");
        assert_eq!((last - first).num_days(), 59);
    }

    #[test]
    fn mixture_has_a_normal_majority() {
        let ds = default_dataset();
        // 45 rows come from Beta(1.5, 50) * 0.05, all of which stay below 0.05.
        let small = ds
            .records
            .iter()
            .filter(|r| r.measurement.troponin_ng_ml <= 0.05)
            .count();
        assert!(small >= 45, "only {small} rows at or below 0.05");
    }

    #[test]
    fn all_normal_when_fraction_is_one() {
        let cfg = GeneratorConfig {
            normal_fraction: 1.0,
            ..GeneratorConfig::default()
        };
        let ds = generate(&cfg, &ThresholdTable::five_band()).unwrap();
        assert!(ds.records.iter().all(|r| r.measurement.troponin_ng_ml <= 0.05));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = GeneratorConfig {
            min_age: 50,
            max_age: 50,
            ..GeneratorConfig::default()
        };
        let err = generate(&cfg, &ThresholdTable::five_band()).unwrap_err();
        assert!(matches!(err, DatasetError::Generator(_)));
    }

    #[test]
    fn dates_past_the_calendar_are_an_error() {
        let cfg = GeneratorConfig {
            rows: 2,
            start_date: NaiveDate::MAX,
            ..GeneratorConfig::default()
        };
        let err = generate(&cfg, &ThresholdTable::five_band()).unwrap_err();
        assert!(matches!(err, DatasetError::Generator(_)));

        // A single row on the last date still fits.
        let cfg = GeneratorConfig { rows: 1, ..cfg };
        let ds = generate(&cfg, &ThresholdTable::five_band()).unwrap();
        assert_eq!(ds.records[0].measurement.date, Some(NaiveDate::MAX));
    }

    #[test]
    fn empty_population() {
        let cfg = GeneratorConfig {
            rows: 0,
            ..GeneratorConfig::default()
        };
        let ds = generate(&cfg, &ThresholdTable::five_band()).unwrap();
        assert!(ds.is_empty());
    }
}
