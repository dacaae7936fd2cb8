//! Free-text row/column selectors (`"0, 2, protocol"`).

use super::model::Table;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("enter the rows or columns to operate on")]
    Empty,
    #[error("'{0}' is not a valid row index")]
    InvalidIndex(String),
    #[error("row index {index} is out of range (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("column index {index} is out of range (table has {len} columns)")]
    ColumnOutOfRange { index: usize, len: usize },
    #[error("no column named '{0}'")]
    UnknownColumn(String),
}

/// One column reference, by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

/// Split the raw input on commas, trim, drop empty pieces and duplicates.
fn tokens(input: &str) -> Result<Vec<&str>, SelectionError> {
    let mut out: Vec<&str> = Vec::new();
    for tok in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !out.contains(&tok) {
            out.push(tok);
        }
    }
    if out.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(out)
}

/// Parse a row selector. Every token must be a non-negative integer.
pub fn parse_rows(input: &str) -> Result<Vec<usize>, SelectionError> {
    tokens(input)?
        .into_iter()
        .map(|tok| {
            tok.parse::<usize>()
                .map_err(|_| SelectionError::InvalidIndex(tok.to_string()))
        })
        .collect()
}

/// Parse a column selector. Integers are positions, anything else is a name.
pub fn parse_columns(input: &str) -> Result<Vec<ColumnRef>, SelectionError> {
    Ok(tokens(input)?
        .into_iter()
        .map(|tok| match tok.parse::<usize>() {
            Ok(i) => ColumnRef::Index(i),
            Err(_) => ColumnRef::Name(tok.to_string()),
        })
        .collect())
}

/// Check row indices against the table.
pub fn resolve_rows(table: &Table, rows: &[usize]) -> Result<Vec<usize>, SelectionError> {
    let len = table.n_rows();
    for &index in rows {
        if index >= len {
            return Err(SelectionError::RowOutOfRange { index, len });
        }
    }
    Ok(rows.to_vec())
}

/// Turn column references into distinct positions, in selection order.
pub fn resolve_columns(table: &Table, refs: &[ColumnRef]) -> Result<Vec<usize>, SelectionError> {
    let mut out: Vec<usize> = Vec::with_capacity(refs.len());
    for r in refs {
        let index = match r {
            ColumnRef::Index(index) => {
                if *index >= table.n_cols() {
                    return Err(SelectionError::ColumnOutOfRange {
                        index: *index,
                        len: table.n_cols(),
                    });
                }
                *index
            }
            ColumnRef::Name(name) => table
                .column_index(name)
                .ok_or_else(|| SelectionError::UnknownColumn(name.clone()))?,
        };
        if !out.contains(&index) {
            out.push(index);
        }
    }
    Ok(out)
}
