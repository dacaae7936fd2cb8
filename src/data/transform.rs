use smartcore::decomposition::pca::{PCAParameters, PCA};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::model::{Cell, Column, ShapeError, Table};
use super::selection::{resolve_columns, resolve_rows, ColumnRef, SelectionError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("column '{column}' row {row} is not numeric")]
    NotNumeric { column: String, row: usize },
    #[error("column '{column}' row {row} is missing a value")]
    MissingValue { column: String, row: usize },
    #[error("component count must be between 1 and {max}, got {requested}")]
    InvalidComponents { requested: usize, max: usize },
    #[error("PCA needs at least {need} rows, the table has {have}")]
    TooFewRows { have: usize, need: usize },
    #[error("refusing to drop every column")]
    AllColumnsDropped,
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("PCA failed: {0}")]
    Pca(String),
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// A named table mutation. `apply` never touches its input; callers swap in
/// the returned table only on success.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    DropRows(Vec<usize>),
    DropColumns(Vec<ColumnRef>),
    MinMaxScale(Vec<ColumnRef>),
    OneHotEncode(Vec<ColumnRef>),
    Pca {
        columns: Vec<ColumnRef>,
        components: usize,
    },
    Clean,
}

/// Result of a successful transform, with non-fatal warnings.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub table: Table,
    pub warnings: Vec<String>,
}

impl From<Table> for TransformOutcome {
    fn from(table: Table) -> Self {
        TransformOutcome {
            table,
            warnings: Vec::new(),
        }
    }
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::DropRows(_) => "drop rows",
            Transform::DropColumns(_) => "drop columns",
            Transform::MinMaxScale(_) => "min-max scale",
            Transform::OneHotEncode(_) => "one-hot encode",
            Transform::Pca { .. } => "PCA",
            Transform::Clean => "clean",
        }
    }

    pub fn apply(&self, table: &Table) -> Result<TransformOutcome, TransformError> {
        match self {
            Transform::DropRows(rows) => drop_rows(table, rows).map(Into::into),
            Transform::DropColumns(cols) => drop_columns(table, cols).map(Into::into),
            Transform::MinMaxScale(cols) => min_max_scale(table, cols).map(Into::into),
            Transform::OneHotEncode(cols) => one_hot_encode(table, cols).map(Into::into),
            Transform::Pca {
                columns,
                components,
            } => pca(table, columns, *components).map(Into::into),
            Transform::Clean => {
                let report = clean(table);
                let warnings = report
                    .coercion_failures
                    .iter()
                    .map(|(column, failed)| {
                        format!("column '{column}': {failed} value(s) could not be converted to numbers")
                    })
                    .collect();
                Ok(TransformOutcome {
                    table: report.table,
                    warnings,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Drop
// ---------------------------------------------------------------------------

/// Remove rows by position, keeping the relative order of the rest.
pub fn drop_rows(table: &Table, rows: &[usize]) -> Result<Table, TransformError> {
    let rows = resolve_rows(table, rows)?;
    Ok(table.retain_rows(|r| !rows.contains(&r)))
}

pub fn drop_columns(table: &Table, refs: &[ColumnRef]) -> Result<Table, TransformError> {
    let drop = resolve_columns(table, refs)?;
    if drop.len() == table.n_cols() {
        return Err(TransformError::AllColumnsDropped);
    }
    let kept = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| !drop.contains(i))
        .map(|(_, c)| c.clone())
        .collect();
    Ok(Table::from_columns(kept)?)
}

// ---------------------------------------------------------------------------
// Min-max scaling
// ---------------------------------------------------------------------------

/// Numeric values of a column; nulls are `None`, anything else is an error.
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>, TransformError> {
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Null => Ok(None),
            other => other.as_f64().map(Some).ok_or_else(|| TransformError::NotNumeric {
                column: column.name.clone(),
                row,
            }),
        })
        .collect()
}

/// Scale selected columns into [0, 1] in place. Nulls stay null, a constant
/// column maps to 0.0.
pub fn min_max_scale(table: &Table, refs: &[ColumnRef]) -> Result<Table, TransformError> {
    let selected = resolve_columns(table, refs)?;
    let mut columns = table.columns().to_vec();

    for &idx in &selected {
        let values = numeric_values(&columns[idx])?;
        let (min, max) = values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;

        columns[idx].values = values
            .into_iter()
            .map(|v| match v {
                None => Cell::Null,
                Some(_) if range.abs() < f64::EPSILON => Cell::Float(0.0),
                Some(v) => Cell::Float((v - min) / range),
            })
            .collect();
    }

    Ok(Table::from_columns(columns)?)
}

// ---------------------------------------------------------------------------
// One-hot encoding
// ---------------------------------------------------------------------------

/// Replace selected columns with `<column>_<value>` indicator columns,
/// appended after the remaining columns in sorted category order.
pub fn one_hot_encode(table: &Table, refs: &[ColumnRef]) -> Result<Table, TransformError> {
    let selected = resolve_columns(table, refs)?;

    let mut columns: Vec<Column> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| !selected.contains(i))
        .map(|(_, c)| c.clone())
        .collect();

    for &idx in &selected {
        let source = &table.columns()[idx];
        for category in source.categories() {
            let values = source
                .values
                .iter()
                .map(|v| Cell::Float(if v.cmp(&category).is_eq() { 1.0 } else { 0.0 }))
                .collect();
            columns.push(Column::new(
                format!("{}_{}", source.name, category.label()),
                values,
            ));
        }
    }

    Ok(Table::from_columns(columns)?)
}

// ---------------------------------------------------------------------------
// PCA
// ---------------------------------------------------------------------------

/// Reduce selected numeric columns to `components` principal components,
/// replacing them with `PC1..PCn` appended after the remaining columns.
pub fn pca(table: &Table, refs: &[ColumnRef], components: usize) -> Result<Table, TransformError> {
    let selected = resolve_columns(table, refs)?;
    let width = selected.len();
    if components == 0 || components > width {
        return Err(TransformError::InvalidComponents {
            requested: components,
            max: width,
        });
    }
    if table.n_rows() < 2 {
        return Err(TransformError::TooFewRows {
            have: table.n_rows(),
            need: 2,
        });
    }

    let mut matrix = vec![Vec::with_capacity(width); table.n_rows()];
    for &idx in &selected {
        let column = &table.columns()[idx];
        for (row, value) in numeric_values(column)?.into_iter().enumerate() {
            let value = value.ok_or_else(|| TransformError::MissingValue {
                column: column.name.clone(),
                row,
            })?;
            matrix[row].push(value);
        }
    }

    let x = DenseMatrix::from_2d_vec(&matrix).map_err(|e| TransformError::Pca(e.to_string()))?;
    let model = PCA::<f64, DenseMatrix<f64>>::fit(&x, PCAParameters::default().with_n_components(components))
        .map_err(|e| TransformError::Pca(e.to_string()))?;
    let reduced = model
        .transform(&x)
        .map_err(|e| TransformError::Pca(e.to_string()))?;

    let mut columns: Vec<Column> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| !selected.contains(i))
        .map(|(_, c)| c.clone())
        .collect();
    for pc in 0..components {
        let values = (0..table.n_rows())
            .map(|row| Cell::Float(*reduced.get((row, pc))))
            .collect();
        columns.push(Column::new(format!("PC{}", pc + 1), values));
    }

    Ok(Table::from_columns(columns)?)
}

// ---------------------------------------------------------------------------
// Clean
// ---------------------------------------------------------------------------

/// Outcome of [`clean`]: the cleaned table plus what was lost on the way.
#[derive(Debug, Clone)]
pub struct CleanReport {
    pub table: Table,
    pub dropped_missing: usize,
    pub dropped_invalid: usize,
    /// `(column, values that failed numeric coercion)`, only for columns
    /// where something failed.
    pub coercion_failures: Vec<(String, usize)>,
}

fn coerce_numeric(cell: &Cell) -> Option<Cell> {
    match cell {
        Cell::Integer(_) | Cell::Float(_) => Some(cell.clone()),
        Cell::Bool(b) => Some(Cell::Integer(i64::from(*b))),
        Cell::Text(s) => match Cell::parse_guess(s) {
            c @ (Cell::Integer(_) | Cell::Float(_)) => Some(c),
            _ => None,
        },
        Cell::Null => None,
    }
}

/// Drop rows with missing values (nulls, NaN, missing markers), coerce every
/// column to numbers, then drop rows where coercion failed.
pub fn clean(table: &Table) -> CleanReport {
    let complete = table.retain_rows(|r| table.row(r).iter().all(|c| !c.is_missing()));
    let dropped_missing = table.n_rows() - complete.n_rows();

    let mut coercion_failures = Vec::new();
    let columns: Vec<Column> = complete
        .columns()
        .iter()
        .map(|column| {
            let mut failed = 0;
            let values = column
                .values
                .iter()
                .map(|cell| {
                    coerce_numeric(cell).unwrap_or_else(|| {
                        failed += 1;
                        Cell::Null
                    })
                })
                .collect();
            if failed > 0 {
                log::warn!("clean: {failed} value(s) in '{}' are not numeric", column.name);
                coercion_failures.push((column.name.clone(), failed));
            }
            Column::new(column.name.clone(), values)
        })
        .collect();

    // Same names and lengths as `complete`, which already passed validation.
    let coerced = Table::from_columns(columns).unwrap_or_default();
    let cleaned = coerced.retain_rows(|r| coerced.row(r).iter().all(|c| !c.is_null()));
    let dropped_invalid = coerced.n_rows() - cleaned.n_rows();

    CleanReport {
        table: cleaned,
        dropped_missing,
        dropped_invalid,
        coercion_failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::selection::parse_columns;
    use approx::assert_abs_diff_eq;

    fn traffic() -> Table {
        Table::from_columns(vec![
            Column::new(
                "bytes",
                vec![
                    Cell::Integer(100),
                    Cell::Integer(300),
                    Cell::Integer(200),
                    Cell::Integer(500),
                    Cell::Integer(400),
                ],
            ),
            Column::new(
                "proto",
                ["tcp", "udp", "tcp", "icmp", "udp"]
                    .iter()
                    .map(|s| Cell::Text(s.to_string()))
                    .collect(),
            ),
            Column::new(
                "duration",
                vec![
                    Cell::Float(0.5),
                    Cell::Float(1.5),
                    Cell::Float(1.0),
                    Cell::Float(2.5),
                    Cell::Float(2.0),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_drop_rows_preserves_order() {
        let t = drop_rows(&traffic(), &[0, 2]).unwrap();
        assert_eq!(t.n_rows(), 3);
        let bytes: Vec<_> = t.column("bytes").unwrap().values.clone();
        assert_eq!(
            bytes,
            vec![Cell::Integer(300), Cell::Integer(500), Cell::Integer(400)]
        );
    }

    #[test]
    fn test_drop_rows_out_of_range_is_validation_error() {
        let err = drop_rows(&traffic(), &[1, 9]).unwrap_err();
        assert_eq!(
            err,
            TransformError::Selection(SelectionError::RowOutOfRange { index: 9, len: 5 })
        );
    }

    #[test]
    fn test_drop_columns_by_name_and_index() {
        let t = drop_columns(&traffic(), &parse_columns("proto, 0").unwrap()).unwrap();
        assert_eq!(t.column_names(), vec!["duration"]);
        assert!(matches!(
            drop_columns(&traffic(), &parse_columns("0,1,2").unwrap()),
            Err(TransformError::AllColumnsDropped)
        ));
    }

    #[test]
    fn test_min_max_maps_extremes() {
        let t = min_max_scale(&traffic(), &parse_columns("bytes, duration").unwrap()).unwrap();
        assert_eq!(t.column_names(), traffic().column_names());
        for name in ["bytes", "duration"] {
            let values: Vec<f64> = t
                .column(name)
                .unwrap()
                .values
                .iter()
                .map(|c| c.as_f64().unwrap())
                .collect();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert_abs_diff_eq!(min, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(max, 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(t.cell(2, 0).unwrap().as_f64().unwrap(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_min_max_rejects_text() {
        let err = min_max_scale(&traffic(), &parse_columns("proto").unwrap()).unwrap_err();
        assert_eq!(
            err,
            TransformError::NotNumeric {
                column: "proto".into(),
                row: 0
            }
        );
    }

    #[test]
    fn test_min_max_constant_column() {
        let t = Table::from_columns(vec![Column::new(
            "flat",
            vec![Cell::Integer(7), Cell::Null, Cell::Integer(7)],
        )])
        .unwrap();
        let scaled = min_max_scale(&t, &[ColumnRef::Index(0)]).unwrap();
        assert_eq!(
            scaled.columns()[0].values,
            vec![Cell::Float(0.0), Cell::Null, Cell::Float(0.0)]
        );
    }

    #[test]
    fn test_one_hot_k_columns_sum_to_one() {
        let t = one_hot_encode(&traffic(), &parse_columns("proto").unwrap()).unwrap();
        assert_eq!(
            t.column_names(),
            vec!["bytes", "duration", "proto_icmp", "proto_tcp", "proto_udp"]
        );
        for row in 0..t.n_rows() {
            let sum: f64 = (2..5).map(|c| t.cell(row, c).unwrap().as_f64().unwrap()).sum();
            assert_abs_diff_eq!(sum, 1.0);
        }
    }

    #[test]
    fn test_pca_replaces_columns() {
        let t = pca(&traffic(), &parse_columns("bytes, duration").unwrap(), 1).unwrap();
        assert_eq!(t.column_names(), vec!["proto", "PC1"]);
        assert_eq!(t.n_rows(), 5);

        let t = pca(&traffic(), &parse_columns("bytes, duration").unwrap(), 2).unwrap();
        assert_eq!(t.column_names(), vec!["proto", "PC1", "PC2"]);
    }

    #[test]
    fn test_pca_component_bounds() {
        let refs = parse_columns("bytes, duration").unwrap();
        assert_eq!(
            pca(&traffic(), &refs, 0).unwrap_err(),
            TransformError::InvalidComponents {
                requested: 0,
                max: 2
            }
        );
        assert_eq!(
            pca(&traffic(), &refs, 3).unwrap_err(),
            TransformError::InvalidComponents {
                requested: 3,
                max: 2
            }
        );
    }

    #[test]
    fn test_pca_rejects_text_column() {
        let refs = parse_columns("bytes, proto").unwrap();
        assert!(matches!(
            pca(&traffic(), &refs, 1),
            Err(TransformError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_clean_drops_missing_and_unparseable() {
        let t = Table::from_columns(vec![
            Column::new(
                "a",
                vec![
                    Cell::Integer(1),
                    Cell::Null,
                    Cell::Text("3.5".into()),
                    Cell::Text("bad".into()),
                ],
            ),
            Column::new(
                "b",
                vec![
                    Cell::Bool(true),
                    Cell::Integer(2),
                    Cell::Float(3.0),
                    Cell::Integer(4),
                ],
            ),
        ])
        .unwrap();

        let report = clean(&t);
        assert_eq!(report.dropped_missing, 1);
        assert_eq!(report.dropped_invalid, 1);
        assert_eq!(report.coercion_failures, vec![("a".to_string(), 1)]);
        assert_eq!(report.table.n_rows(), 2);
        assert_eq!(
            report.table.columns()[0].values,
            vec![Cell::Integer(1), Cell::Float(3.5)]
        );
        assert_eq!(
            report.table.columns()[1].values,
            vec![Cell::Integer(1), Cell::Float(3.0)]
        );
    }

    #[test]
    fn test_clean_treats_nan_as_missing() {
        let t = Table::from_columns(vec![Column::new(
            "dur",
            vec![
                Cell::Float(0.5),
                Cell::Float(f64::NAN),
                Cell::Text("N/A".into()),
                Cell::Text("2".into()),
            ],
        )])
        .unwrap();

        let report = clean(&t);
        assert_eq!(report.dropped_missing, 2);
        assert_eq!(report.dropped_invalid, 0);
        assert!(report.coercion_failures.is_empty());
        assert_eq!(
            report.table.columns()[0].values,
            vec![Cell::Float(0.5), Cell::Integer(2)]
        );
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let original = traffic();
        let outcome = Transform::DropRows(vec![0]).apply(&original).unwrap();
        assert_eq!(outcome.table.n_rows(), 4);
        assert_eq!(original, traffic());
        assert!(Transform::MinMaxScale(vec![ColumnRef::Name("proto".into())])
            .apply(&original)
            .is_err());
        assert_eq!(original, traffic());
    }

    #[test]
    fn test_clean_outcome_reports_warning() {
        let t = Table::from_columns(vec![Column::new(
            "x",
            vec![Cell::Text("1".into()), Cell::Text("oops".into())],
        )])
        .unwrap();
        let outcome = Transform::Clean.apply(&t).unwrap();
        assert_eq!(outcome.table.n_rows(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("'x'"));
    }
}
