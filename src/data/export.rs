use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use crate::error::{DatasetError, Result};

use super::model::{is_diagnosis_column, CellValue, Dataset, DIAGNOSIS_COLUMN};

/// Which columns to write.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Subset and order of source columns; `None` keeps all of them.
    pub columns: Option<Vec<String>>,
    /// Append the derived diagnosis label as a last column.  Any stored
    /// diagnosis column is dropped so the output has exactly one.
    pub append_diagnosis: bool,
}

/// The selected rows projected onto the selected columns.
struct Projection {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn project(dataset: &Dataset, indices: &[usize], options: &ExportOptions) -> Result<Projection> {
    let mut col_idx: Vec<usize> = match &options.columns {
        Some(names) => names
            .iter()
            .map(|n| {
                dataset
                    .column_index(n)
                    .ok_or_else(|| DatasetError::UnknownColumn(n.clone()))
            })
            .collect::<Result<_>>()?,
        None => (0..dataset.columns.len()).collect(),
    };
    if options.append_diagnosis {
        col_idx.retain(|&i| !is_diagnosis_column(&dataset.columns[i]));
    }

    let mut headers: Vec<String> = col_idx.iter().map(|&i| dataset.columns[i].clone()).collect();
    if options.append_diagnosis {
        headers.push(DIAGNOSIS_COLUMN.to_string());
    }

    let rows = indices
        .iter()
        .filter_map(|&i| dataset.records.get(i))
        .map(|record| {
            let mut row: Vec<String> = col_idx
                .iter()
                .map(|&c| record.cells.get(c).cloned().unwrap_or_default())
                .collect();
            if options.append_diagnosis {
                row.push(dataset.label(record).to_string());
            }
            row
        })
        .collect();

    Ok(Projection { headers, rows })
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Write the rows at `indices` to `path`, format chosen by extension.
/// Returns the number of rows written.
pub fn export(
    path: &Path,
    dataset: &Dataset,
    indices: &[usize],
    options: &ExportOptions,
) -> Result<usize> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let n = match ext.as_str() {
        "csv" => write_delimited(std::fs::File::create(path)?, b',', dataset, indices, options)?,
        "tsv" => write_delimited(std::fs::File::create(path)?, b'\t', dataset, indices, options)?,
        "json" => {
            let projection = project(dataset, indices, options)?;
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            serde_json::to_writer_pretty(file, &to_json(&projection))?;
            projection.rows.len()
        }
        "parquet" | "pq" => write_parquet(path, dataset, indices, options)?,
        other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
    };

    log::info!("Exported {n} rows to {}", path.display());
    Ok(n)
}

/// Write delimited text.  Cells are written exactly as they were loaded.
pub fn write_delimited<W: Write>(
    writer: W,
    delimiter: u8,
    dataset: &Dataset,
    indices: &[usize],
    options: &ExportOptions,
) -> Result<usize> {
    let projection = project(dataset, indices, options)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    writer.write_record(&projection.headers)?;
    for row in &projection.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(projection.rows.len())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn to_json(projection: &Projection) -> JsonValue {
    let records = projection
        .rows
        .iter()
        .map(|row| {
            let obj: Map<String, JsonValue> = projection
                .headers
                .iter()
                .zip(row)
                .map(|(h, cell)| (h.clone(), cell_to_json(CellValue::infer(cell))))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(records)
}

fn cell_to_json(cell: CellValue) -> JsonValue {
    match cell {
        CellValue::String(s) => JsonValue::String(s),
        CellValue::Integer(i) => JsonValue::from(i),
        // Non-finite floats have no JSON form.
        CellValue::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        CellValue::Bool(b) => JsonValue::Bool(b),
        CellValue::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Column type inferred from every cell of the column.
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> DataType {
    let mut ty = DataType::Int64;
    for cell in cells {
        match CellValue::infer(cell) {
            CellValue::Null | CellValue::Integer(_) => {}
            CellValue::Float(_) => ty = DataType::Float64,
            _ => return DataType::Utf8,
        }
    }
    ty
}

fn write_parquet(
    path: &Path,
    dataset: &Dataset,
    indices: &[usize],
    options: &ExportOptions,
) -> Result<usize> {
    let projection = project(dataset, indices, options)?;

    let mut fields = Vec::with_capacity(projection.headers.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(projection.headers.len());
    for (c, name) in projection.headers.iter().enumerate() {
        let column = || projection.rows.iter().map(move |r| r[c].as_str());
        let ty = infer_column_type(column());
        let array: ArrayRef = match ty {
            DataType::Int64 => Arc::new(Int64Array::from(
                column()
                    .map(|s| s.trim().parse::<i64>().ok())
                    .collect::<Vec<_>>(),
            )),
            DataType::Float64 => Arc::new(Float64Array::from(
                column()
                    .map(|s| CellValue::infer(s).as_f64())
                    .collect::<Vec<_>>(),
            )),
            _ => Arc::new(StringArray::from(
                column()
                    .map(|s| (!s.is_empty()).then(|| s.to_string()))
                    .collect::<Vec<_>>(),
            )),
        };
        fields.push(Field::new(name, ty, true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(projection.rows.len())
}
