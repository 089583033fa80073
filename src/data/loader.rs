use std::io::Read;
use std::path::Path;

use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::classify::ThresholdTable;
use crate::error::{DatasetError, Result};

use super::model::{CellValue, DataSource, Dataset, Measurement, Sex};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Accepted headers per field, compared case-insensitively.  Spanish-language
/// clinic exports use `Troponina_cTnI_ng_mL`, `Edad`, `Sexo`, ...
const TROPONIN_NAMES: &[&str] = &["troponin_ng_mL", "troponina_ctni_ng_ml", "troponin_ctni_ng_ml"];
const PATIENT_ID_NAMES: &[&str] = &["patient_id", "paciente_id"];
const AGE_NAMES: &[&str] = &["age", "edad"];
const SEX_NAMES: &[&str] = &["sex", "sexo"];
const DATE_NAMES: &[&str] = &["date", "fecha"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a measurement table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row, one measurement per line
/// * `.json`         – `[{ "troponin_ng_mL": 0.02, "age": 54, ... }, ...]`
/// * `.parquet`      – flat scalar columns
pub fn load_file(path: &Path, thresholds: &ThresholdTable) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_delimited(std::fs::File::open(path)?, b',')?,
        "tsv" => read_delimited(std::fs::File::open(path)?, b'\t')?,
        "json" => read_json(&std::fs::read_to_string(path)?)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
    };

    table.into_dataset(thresholds, DataSource::File(path.to_path_buf()))
}

/// Load delimited text from any reader (an upload buffer, stdin, ...).
pub fn load_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    thresholds: &ThresholdTable,
    source: DataSource,
) -> Result<Dataset> {
    read_delimited(reader, delimiter)?.into_dataset(thresholds, source)
}

// ---------------------------------------------------------------------------
// Raw table: headers + cell texts
// ---------------------------------------------------------------------------

/// Untyped table as read from the source, before column resolution.
#[derive(Debug, Default)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Column positions of the measurement fields.
#[derive(Debug, PartialEq)]
struct ColumnMap {
    troponin: usize,
    patient_id: Option<usize>,
    age: Option<usize>,
    sex: Option<usize>,
    date: Option<usize>,
}

impl RawTable {
    fn find(&self, names: &[&str]) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| names.iter().any(|n| c.trim().eq_ignore_ascii_case(n)))
    }

    /// A column is numeric when every non-empty cell is an integer or float
    /// and at least one cell is non-empty.
    fn is_numeric(&self, col: usize) -> bool {
        let mut seen = false;
        for row in &self.rows {
            match CellValue::infer(row.get(col).map(String::as_str).unwrap_or("")) {
                CellValue::Null => {}
                CellValue::Integer(_) | CellValue::Float(_) => seen = true,
                _ => return false,
            }
        }
        seen
    }

    fn resolve_columns(&self) -> Result<ColumnMap> {
        let patient_id = self.find(PATIENT_ID_NAMES);
        let age = self.find(AGE_NAMES);
        let troponin = match self.find(TROPONIN_NAMES) {
            Some(idx) => idx,
            None => {
                // Identifier and age columns are numeric too; never adopt them.
                let idx = (0..self.columns.len())
                    .filter(|&c| Some(c) != patient_id && Some(c) != age)
                    .find(|&c| self.is_numeric(c))
                    .ok_or(DatasetError::MissingColumn)?;
                log::warn!(
                    "No troponin column found, using first numeric column '{}'",
                    self.columns[idx]
                );
                idx
            }
        };
        Ok(ColumnMap {
            troponin,
            patient_id,
            age,
            sex: self.find(SEX_NAMES),
            date: self.find(DATE_NAMES),
        })
    }

    fn into_dataset(self, thresholds: &ThresholdTable, source: DataSource) -> Result<Dataset> {
        let map = self.resolve_columns()?;
        let concentration_column = self.columns[map.troponin].clone();

        let mut rows = Vec::with_capacity(self.rows.len());
        for (row_no, cells) in self.rows.into_iter().enumerate() {
            let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).map(|s| s.trim());

            let raw = cell(Some(map.troponin)).unwrap_or("");
            let troponin_ng_ml = parse_concentration(raw, row_no)?;

            let measurement = Measurement {
                patient_id: cell(map.patient_id).and_then(|s| s.parse().ok()),
                age: cell(map.age).and_then(parse_age),
                sex: cell(map.sex).and_then(Sex::parse),
                troponin_ng_ml,
                date: cell(map.date).and_then(parse_date),
            };
            rows.push((cells, measurement));
        }

        Dataset::build(self.columns, rows, concentration_column, thresholds.clone(), source)
    }
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

fn parse_concentration(raw: &str, row: usize) -> Result<f64> {
    if raw.is_empty() {
        return Err(DatasetError::InvalidValue {
            row,
            value: String::new(),
            reason: "missing value".to_string(),
        });
    }
    raw.parse::<f64>().map_err(|_| DatasetError::InvalidValue {
        row,
        value: raw.to_string(),
        reason: "not a number".to_string(),
    })
}

/// Ages may come through as `54` or, from float columns, `54.0`.
fn parse_age(s: &str) -> Option<u32> {
    if let Ok(a) = s.parse::<u32>() {
        return Some(a);
    }
    let f = s.parse::<f64>().ok()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}

/// ISO dates, day-first dates and ISO timestamps (date part only).
fn parse_date(s: &str) -> Option<NaiveDate> {
    let try_formats = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
            .ok()
    };
    try_formats(s).or_else(|| {
        let date_part = s.split(['T', ' ']).next()?;
        try_formats(date_part)
    })
}

// ---------------------------------------------------------------------------
// CSV / TSV reader
// ---------------------------------------------------------------------------

fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if columns.is_empty() {
        return Err(DatasetError::Malformed("no header row".to_string()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON layout (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "patient_id": 1, "age": 63, "sex": "Male", "troponin_ng_mL": 0.021 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys in first-seen order.
fn read_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root
        .as_array()
        .ok_or_else(|| DatasetError::Malformed("expected top-level JSON array".to_string()))?;

    let mut table = RawTable::default();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| DatasetError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !table.columns.contains(key) {
                table.columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    for obj in objects {
        let row = table
            .columns
            .iter()
            .map(|col| obj.get(col).map(json_to_cell).unwrap_or_default())
            .collect();
        table.rows.push(row);
    }

    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read a Parquet file with flat scalar columns.  Works with files written
/// by both Pandas (`df.to_parquet()`) and Polars (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| {
                    if col.is_null(row) {
                        Ok(String::new())
                    } else {
                        array_value_to_string(col.as_ref(), row)
                    }
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.push(cells);
        }
    }

    Ok(RawTable { columns, rows })
}
