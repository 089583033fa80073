use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::classify::Diagnosis;

use super::model::{Dataset, Record, Sex};

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// The user's current row selection.
///
/// Ranges are inclusive; `None` means "no constraint".  A set that contains
/// every value present in the dataset does not constrain anything either, so
/// rows with a missing field only disappear once that filter is narrowed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub sexes: BTreeSet<Sex>,
    pub age: Option<(u32, u32)>,
    pub concentration: Option<(f64, f64)>,
    pub diagnoses: BTreeSet<Diagnosis>,
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

/// Initialise a [`FilterState`] with everything selected.
pub fn init_filter_state(dataset: &Dataset) -> FilterState {
    FilterState {
        sexes: dataset.sexes(),
        age: dataset.age_span(),
        concentration: dataset.concentration_span(),
        diagnoses: dataset.thresholds.diagnoses().collect(),
        dates: dataset.date_span(),
    }
}

impl FilterState {
    /// Keep only rows with one of the given diagnoses.
    pub fn with_diagnoses(mut self, diagnoses: impl IntoIterator<Item = Diagnosis>) -> Self {
        self.diagnoses = diagnoses.into_iter().collect();
        self
    }
}

/// Return indices of records that pass all active filters.
pub fn filtered_indices(dataset: &Dataset, filters: &FilterState) -> Vec<usize> {
    let all_sexes = dataset.sexes();
    let sex_filter_active = !all_sexes.is_subset(&filters.sexes);

    let age_filter = filters.age.filter(|&f| Some(f) != dataset.age_span());
    let date_filter = filters.dates.filter(|&f| Some(f) != dataset.date_span());

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            passes(r, filters, sex_filter_active, age_filter, date_filter)
        })
        .map(|(i, _)| i)
        .collect()
}

fn passes(
    record: &Record,
    filters: &FilterState,
    sex_filter_active: bool,
    age: Option<(u32, u32)>,
    dates: Option<(NaiveDate, NaiveDate)>,
) -> bool {
    let m = &record.measurement;

    if !filters.diagnoses.contains(&record.diagnosis) {
        return false;
    }
    if let Some((lo, hi)) = filters.concentration {
        if m.troponin_ng_ml < lo || m.troponin_ng_ml > hi {
            return false;
        }
    }
    if sex_filter_active {
        match m.sex {
            Some(sex) if filters.sexes.contains(&sex) => {}
            _ => return false,
        }
    }
    if let Some((lo, hi)) = age {
        match m.age {
            Some(a) if (lo..=hi).contains(&a) => {}
            _ => return false,
        }
    }
    if let Some((lo, hi)) = dates {
        match m.date {
            Some(d) if (lo..=hi).contains(&d) => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ThresholdTable;
    use crate::data::model::{DataSource, Measurement};

    fn row(age: Option<u32>, sex: Option<Sex>, v: f64, day: Option<u32>) -> (Vec<String>, Measurement) {
        (
            Vec::new(),
            Measurement {
                patient_id: None,
                age,
                sex,
                troponin_ng_ml: v,
                date: day.and_then(|d| NaiveDate::from_ymd_opt(2025, 1, d)),
            },
        )
    }

    fn dataset() -> Dataset {
        Dataset::build(
            Vec::new(),
            vec![
                row(Some(30), Some(Sex::Male), 0.01, Some(1)),
                row(Some(45), Some(Sex::Female), 0.2, Some(2)),
                row(Some(60), Some(Sex::Male), 0.7, Some(3)),
                row(Some(75), Some(Sex::Female), 2.0, Some(4)),
                row(None, None, 9.0, None),
            ],
            "troponin_ng_mL".into(),
            ThresholdTable::five_band(),
            DataSource::Synthetic { seed: 0 },
        )
        .unwrap()
    }

    #[test]
    fn everything_selected_keeps_every_row() {
        let ds = dataset();
        let f = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &f), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sex_filter_drops_rows_without_sex() {
        let ds = dataset();
        let mut f = init_filter_state(&ds);
        f.sexes.remove(&Sex::Male);
        assert_eq!(filtered_indices(&ds, &f), vec![1, 3]);
    }

    #[test]
    fn age_range_is_inclusive() {
        let ds = dataset();
        let mut f = init_filter_state(&ds);
        f.age = Some((45, 60));
        assert_eq!(filtered_indices(&ds, &f), vec![1, 2]);
    }

    #[test]
    fn concentration_range() {
        let ds = dataset();
        let mut f = init_filter_state(&ds);
        f.concentration = Some((0.2, 2.0));
        assert_eq!(filtered_indices(&ds, &f), vec![1, 2, 3]);
    }

    #[test]
    fn date_range() {
        let ds = dataset();
        let mut f = init_filter_state(&ds);
        f.dates = Some((
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        ));
        assert_eq!(filtered_indices(&ds, &f), vec![1]);
    }

    #[test]
    fn diagnosis_subset() {
        let ds = dataset();
        let high = ds.thresholds.by_label("High").unwrap();
        let critical = ds.thresholds.by_label("Critical").unwrap();
        let f = init_filter_state(&ds).with_diagnoses([high, critical]);
        assert_eq!(filtered_indices(&ds, &f), vec![3, 4]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        let f = init_filter_state(&ds).with_diagnoses([]);
        assert!(filtered_indices(&ds, &f).is_empty());
    }
}
