use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::Workbook;

use super::loader::extension;
use super::model::{Cell, Column, Table};

/// Extensions accepted by [`save_file`], for the save dialog.
pub const SAVE_EXTENSIONS: &[&str] = &["xlsx", "csv", "parquet"];

/// Write the whole table, header first. Dispatch by extension; nulls become
/// empty cells.
pub fn save_file(table: &Table, path: &Path) -> Result<()> {
    match extension(path).as_str() {
        "xlsx" => save_xlsx(table, path),
        "csv" => save_csv(table, path),
        "parquet" | "pq" => save_parquet(table, path),
        other => bail!("Cannot save as .{other}; choose .xlsx, .csv or .parquet"),
    }
    .with_context(|| format!("saving {}", path.display()))
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

fn save_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (c, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(c).context("too many columns for a worksheet")?;
        sheet.write_string(0, col, &column.name)?;
        for (r, cell) in column.values.iter().enumerate() {
            let row = u32::try_from(r + 1).context("too many rows for a worksheet")?;
            match cell {
                Cell::Null => {}
                Cell::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                Cell::Integer(i) => {
                    sheet.write_number(row, col, *i as f64)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(row, col, *f)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
            }
        }
    }

    workbook.save(path).context("writing workbook")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn save_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(table.column_names())?;
    for r in 0..table.n_rows() {
        let record: Vec<String> = table
            .row(r)
            .into_iter()
            .map(|cell| match cell {
                Cell::Null => String::new(),
                other => other.label(),
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn save_parquet(table: &Table, path: &Path) -> Result<()> {
    let mut fields = Vec::with_capacity(table.n_cols());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.n_cols());
    for column in table.columns() {
        let (data_type, array) = column_to_arrow(column);
        fields.push(Field::new(column.name.clone(), data_type, true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Pick the narrowest Arrow type that holds every non-null cell.
fn column_to_arrow(column: &Column) -> (DataType, ArrayRef) {
    let non_null = || column.values.iter().filter(|v| !v.is_null());

    if non_null().all(|v| matches!(v, Cell::Bool(_))) && non_null().next().is_some() {
        let values: Vec<Option<bool>> = column
            .values
            .iter()
            .map(|v| match v {
                Cell::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return (DataType::Boolean, Arc::new(BooleanArray::from(values)));
    }
    if non_null().all(|v| matches!(v, Cell::Integer(_))) && non_null().next().is_some() {
        let values: Vec<Option<i64>> = column
            .values
            .iter()
            .map(|v| match v {
                Cell::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        return (DataType::Int64, Arc::new(Int64Array::from(values)));
    }
    if non_null().all(|v| matches!(v, Cell::Integer(_) | Cell::Float(_))) && non_null().next().is_some() {
        let values: Vec<Option<f64>> = column.values.iter().map(Cell::as_f64).collect();
        return (DataType::Float64, Arc::new(Float64Array::from(values)));
    }
    let values: Vec<Option<String>> = column
        .values
        .iter()
        .map(|v| (!v.is_null()).then(|| v.label()))
        .collect();
    (DataType::Utf8, Arc::new(StringArray::from(values)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use tempfile::TempDir;

    fn sample() -> Table {
        Table::from_rows(
            vec!["bytes".into(), "ratio".into(), "proto".into(), "ok".into()],
            vec![
                vec![Cell::Integer(10), Cell::Float(0.25), Cell::Text("tcp".into()), Cell::Bool(true)],
                vec![Cell::Integer(20), Cell::Null, Cell::Text("udp".into()), Cell::Bool(false)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        save_file(&sample(), &path).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_parquet_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.parquet");
        save_file(&sample(), &path).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_xlsx_save_keeps_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        save_file(&sample(), &path).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.n_rows(), 2);
        assert_eq!(loaded.column_names(), sample().column_names());
        assert_eq!(loaded.cell(0, 2), Some(&Cell::Text("tcp".into())));
        assert_eq!(loaded.cell(1, 1), Some(&Cell::Null));
    }

    #[test]
    fn test_unknown_save_extension() {
        let dir = TempDir::new().unwrap();
        assert!(save_file(&sample(), &dir.path().join("out.txt")).is_err());
    }
}
