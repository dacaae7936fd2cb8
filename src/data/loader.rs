use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Cell, Column, Table};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Extensions accepted by [`load_file`], for the open dialog.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "ods", "csv", "json", "parquet", "pq"];

/// Load a traffic table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.csv`     – header row followed by records
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.parquet` – flat primitive columns
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = extension(path);

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path),
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "parsed {}: {} rows x {} columns",
        path.display(),
        table.n_rows(),
        table.n_cols()
    );
    Ok(table)
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Reads the first worksheet. Numbers without a fractional part become
/// integers, error cells (`#N/A`, `#DIV/0!`) become nulls.
fn load_spreadsheet(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("spreadsheet has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .context("worksheet is empty")?
        .iter()
        .map(|h| h.to_string().trim().to_string())
        .collect();

    let records: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(Table::from_rows(headers, records)?)
}

fn spreadsheet_cell(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Int(i) => Cell::Integer(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                Cell::Integer(*f as i64)
            } else {
                Cell::Float(*f)
            }
        }
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Every record must have as many fields as the header.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record.iter().map(Cell::parse_guess).collect());
    }

    Ok(Table::from_rows(headers, records)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "duration": 0.12, "protocol": "tcp", "bytes": 512 },
///   ...
/// ]
/// ```
///
/// Columns appear in order of first appearance; keys missing from a record
/// are nulls.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(headers, rows)?)
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns. Nested or exotic types are rendered
/// as text through Arrow's display formatter.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (column, array) in columns.iter_mut().zip(batch.columns()) {
            column
                .values
                .extend((0..batch.num_rows()).map(|row| arrow_cell(array, row)));
        }
    }

    Ok(Table::from_columns(columns)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Null;
    }
    match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => Cell::Bool(col.as_boolean().value(row)),
        DataType::Int8 => Cell::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => Cell::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Cell::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Cell::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Cell::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => Cell::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => Cell::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v)
                .map(Cell::Integer)
                .unwrap_or(Cell::Float(v as f64))
        }
        DataType::Float32 => Cell::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Float(col.as_primitive::<Float64Type>().value(row)),
        _ => arrow::util::display::array_value_to_string(col, row)
            .map(Cell::Text)
            .unwrap_or(Cell::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_csv_shape_and_headers() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "traffic.csv",
            "duration,protocol,bytes\n0.5,tcp,100\n1.5,udp,\n2.0,tcp,300\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_cols(), 3);
        assert_eq!(table.column_names(), vec!["duration", "protocol", "bytes"]);
        assert_eq!(table.cell(1, 1), Some(&Cell::Text("udp".into())));
        assert_eq!(table.cell(1, 2), Some(&Cell::Null));
        assert_eq!(table.cell(2, 2), Some(&Cell::Integer(300)));
    }

    #[test]
    fn test_csv_missing_markers_are_dropped_by_clean() {
        use crate::data::transform::clean;

        let dir = TempDir::new().unwrap();
        let path = write(&dir, "flows.csv", "bytes,dur\n1,0.5\nNaN,1.5\n3,nan\n4,NA\n");
        let table = load_file(&path).unwrap();
        assert_eq!(table.cell(1, 0), Some(&Cell::Null));
        assert_eq!(table.cell(2, 1), Some(&Cell::Null));

        let report = clean(&table);
        assert_eq!(report.dropped_missing, 3);
        assert_eq!(report.dropped_invalid, 0);
        assert!(report.coercion_failures.is_empty());
        assert_eq!(report.table.n_rows(), 1);
        assert_eq!(report.table.row(0), vec![&Cell::Integer(1), &Cell::Float(0.5)]);
    }

    #[test]
    fn test_csv_ragged_record_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.csv", "a,b\n1,2\n3\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_json_records_fill_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "traffic.json",
            r#"[{"src": "10.0.0.1", "bytes": 10}, {"bytes": 20.5, "flag": true}]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.column_names(), vec!["src", "bytes", "flag"]);
        assert_eq!(table.cell(1, 0), Some(&Cell::Null));
        assert_eq!(table.cell(1, 1), Some(&Cell::Float(20.5)));
        assert_eq!(table.cell(0, 2), Some(&Cell::Null));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.txt", "hello");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_file(&dir.path().join("absent.csv")).is_err());
    }
}
