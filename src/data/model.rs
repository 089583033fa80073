use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::classify::{Diagnosis, ThresholdTable};
use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell, typed by inference
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value inferred from its text, mirroring the
/// common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Infer the type of a raw cell.
    pub fn infer(s: &str) -> CellValue {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Lenient parse accepting English and Spanish spellings.
    pub fn parse(s: &str) -> Option<Sex> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "masculino" | "hombre" => Some(Sex::Male),
            "female" | "f" | "femenino" | "mujer" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "Male"),
            Sex::Female => write!(f, "Female"),
        }
    }
}

// ---------------------------------------------------------------------------
// Measurement / Record – one row of the table
// ---------------------------------------------------------------------------

/// The typed view of a row.  Only the concentration is guaranteed; the other
/// fields are `None` when the column is absent or the cell unparsable.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub patient_id: Option<i64>,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    /// Finite and non-negative.
    pub troponin_ng_ml: f64,
    pub date: Option<NaiveDate>,
}

/// A loaded row: the original cells plus the parsed measurement and its
/// derived diagnosis.
#[derive(Debug, Clone)]
pub struct Record {
    /// Cell texts aligned with [`Dataset::columns`].
    pub cells: Vec<String>,
    pub measurement: Measurement,
    pub diagnosis: Diagnosis,
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Synthetic { seed: u64 },
    File(PathBuf),
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Synthetic { seed } => write!(f, "synthetic (seed {seed})"),
            DataSource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

/// The full dataset with the threshold table its diagnoses refer to.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Ordered column names as found in the source.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    /// Column adopted as troponin concentration.
    pub concentration_column: String,
    pub thresholds: ThresholdTable,
    pub source: DataSource,
}

impl Dataset {
    /// Classify every measurement and assemble the dataset.
    ///
    /// Fails on the first row whose concentration cannot be classified;
    /// `rows` yields `(cells, measurement)` pairs in source order.
    pub fn build(
        columns: Vec<String>,
        rows: Vec<(Vec<String>, Measurement)>,
        concentration_column: String,
        thresholds: ThresholdTable,
        source: DataSource,
    ) -> Result<Self> {
        let mut records = Vec::with_capacity(rows.len());
        for (row, (cells, measurement)) in rows.into_iter().enumerate() {
            let diagnosis = classify_row(&thresholds, row, measurement.troponin_ng_ml)?;
            records.push(Record {
                cells,
                measurement,
                diagnosis,
            });
        }
        Ok(Dataset {
            columns,
            records,
            concentration_column,
            thresholds,
            source,
        })
    }

    /// Recompute every diagnosis against a new threshold table.
    pub fn reclassify(&mut self, thresholds: ThresholdTable) -> Result<()> {
        let diagnoses = self
            .records
            .iter()
            .enumerate()
            .map(|(row, r)| classify_row(&thresholds, row, r.measurement.troponin_ng_ml))
            .collect::<Result<Vec<_>>>()?;
        for (record, diagnosis) in self.records.iter_mut().zip(diagnoses) {
            record.diagnosis = diagnosis;
        }
        self.thresholds = thresholds;
        Ok(())
    }

    /// Display label of a record's diagnosis.
    pub fn label(&self, record: &Record) -> &str {
        self.thresholds.label(record.diagnosis)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Indices of the source columns, minus any stored diagnosis column.
    /// A stored diagnosis is stale once the thresholds change; the derived
    /// one from [`Dataset::label`] takes its place.
    pub fn source_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&i| !is_diagnosis_column(&self.columns[i]))
            .collect()
    }

    /// Sexes present in the data.
    pub fn sexes(&self) -> BTreeSet<Sex> {
        self.records.iter().filter_map(|r| r.measurement.sex).collect()
    }

    /// `(min, max)` age, if any row has one.
    pub fn age_span(&self) -> Option<(u32, u32)> {
        span(self.records.iter().filter_map(|r| r.measurement.age))
    }

    /// `(min, max)` concentration.
    pub fn concentration_span(&self) -> Option<(f64, f64)> {
        let mut it = self.records.iter().map(|r| r.measurement.troponin_ng_ml);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        span(self.records.iter().filter_map(|r| r.measurement.date))
    }

    /// Concentrations of the given rows, in order.
    pub fn concentrations(&self, indices: &[usize]) -> Vec<f64> {
        indices
            .iter()
            .filter_map(|&i| self.records.get(i))
            .map(|r| r.measurement.troponin_ng_ml)
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Header of the derived diagnosis column.
pub const DIAGNOSIS_COLUMN: &str = "diagnosis";

/// Whether `name` is a diagnosis column (case-insensitive).
pub fn is_diagnosis_column(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(DIAGNOSIS_COLUMN)
}

fn classify_row(thresholds: &ThresholdTable, row: usize, value: f64) -> Result<Diagnosis> {
    thresholds
        .classify(value)
        .map_err(|e| DatasetError::InvalidValue {
            row,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn span<T: Ord + Copy>(mut it: impl Iterator<Item = T>) -> Option<(T, T)> {
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
