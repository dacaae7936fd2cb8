use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Cell – a single value in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a spreadsheet or CSV yields.
/// Category sets downstream are `BTreeSet<Cell>`, so `Cell` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Cell {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

// -- Manual Eq/Ord so we can put Cell in BTreeSet --

/// Equality follows `Ord`: NaN equals NaN and `0.0` differs from `-0.0`,
/// matching the bitwise `Hash` below.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Cell::*;
        fn rank(v: &Cell) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Text(s) => s.hash(state),
            Cell::Integer(i) => i.hash(state),
            Cell::Float(f) => f.to_bits().hash(state),
            Cell::Bool(b) => b.hash(state),
            Cell::Null => {}
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v:.4}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => Ok(()),
        }
    }
}

/// Text that reads as a missing value rather than a string.
const MISSING_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
];

impl Cell {
    /// Interpret the cell as a number. Booleans count as 1.0 / 0.0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            Cell::Integer(i) => Some(*i as f64),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Null, a NaN float, or text holding a missing-value marker.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Float(v) => v.is_nan(),
            Cell::Text(s) => MISSING_TOKENS.contains(&s.trim()),
            _ => false,
        }
    }

    /// Guess the type of a raw text field (CSV, text spreadsheet cells).
    /// Empty fields and the usual missing-value markers become `Null`.
    pub fn parse_guess(s: &str) -> Cell {
        let s = s.trim();
        if s.is_empty() || MISSING_TOKENS.contains(&s) {
            return Cell::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Cell::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Cell::Float(f);
        }
        if s == "true" || s == "false" {
            return Cell::Bool(s == "true");
        }
        Cell::Text(s.to_string())
    }

    /// Value used when naming indicator columns and when writing text output.
    /// Unlike `Display`, floats keep full precision.
    pub fn label(&self) -> String {
        match self {
            Cell::Float(v) => v.to_string(),
            Cell::Null => "null".to_string(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Table
// ---------------------------------------------------------------------------

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    /// Sorted set of distinct values.
    pub fn categories(&self) -> BTreeSet<Cell> {
        self.values.iter().cloned().collect()
    }
}

/// Errors raised when assembling a table from parsed columns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("column '{name}' has {len} values but the table has {expected} rows")]
    Ragged {
        name: String,
        len: usize,
        expected: usize,
    },
    #[error("row {row} has {len} values, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateName(String),
    #[error("column {0} has an empty name")]
    EmptyName(usize),
}

/// Rectangular in-memory table, stored column-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table, checking every column has the same length and a unique,
    /// non-empty name.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, ShapeError> {
        let n_rows = columns.first().map_or(0, |c| c.values.len());
        let mut seen = BTreeSet::new();
        for (i, col) in columns.iter().enumerate() {
            if col.name.trim().is_empty() {
                return Err(ShapeError::EmptyName(i));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(ShapeError::DuplicateName(col.name.clone()));
            }
            if col.values.len() != n_rows {
                return Err(ShapeError::Ragged {
                    name: col.name.clone(),
                    len: col.values.len(),
                    expected: n_rows,
                });
            }
        }
        Ok(Table { columns, n_rows })
    }

    /// Build a table from a header and row-major records.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, ShapeError> {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|h| Column::new(h, Vec::with_capacity(rows.len())))
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ShapeError::RaggedRow {
                    row: i,
                    len: row.len(),
                    expected: columns.len(),
                });
            }
            for (col, cell) in columns.iter_mut().zip(row) {
                col.values.push(cell);
            }
        }
        Table::from_columns(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.columns.get(col)?.values.get(row)
    }

    /// One row as a vector of references, in column order.
    pub fn row(&self, row: usize) -> Vec<&Cell> {
        self.columns
            .iter()
            .filter_map(|c| c.values.get(row))
            .collect()
    }

    /// Short `name=value` rendering of a row for summaries and logs.
    pub fn row_summary(&self, row: usize) -> String {
        self.columns
            .iter()
            .filter_map(|c| c.values.get(row).map(|v| format!("{}={v}", c.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Keep only the rows for which `keep(row)` is true.
    pub fn retain_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let kept: Vec<usize> = (0..self.n_rows).filter(|&r| keep(r)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), kept.iter().map(|&r| c.values[r].clone()).collect()))
            .collect();
        Table {
            columns,
            n_rows: kept.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![Cell::Integer(1), Cell::Text("x".into())],
                vec![Cell::Integer(2), Cell::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_shape() {
        let t = sample();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.column_names(), vec!["a", "b"]);
        assert_eq!(t.cell(1, 0), Some(&Cell::Integer(2)));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![Cell::Integer(1), Cell::Integer(2)],
                vec![Cell::Integer(3)],
            ],
        );
        let err = result.unwrap_err();
        assert_eq!(
            err,
            ShapeError::RaggedRow {
                row: 1,
                len: 1,
                expected: 2
            }
        );
        assert_eq!(err.to_string(), "row 1 has 1 values, expected 2");
    }

    #[test]
    fn test_ragged_column_names_the_column() {
        let result = Table::from_columns(vec![
            Column::new("a", vec![Cell::Integer(1)]),
            Column::new("b", vec![]),
        ]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "column 'b' has 0 values but the table has 1 rows"
        );
    }

    #[test]
    fn test_equality_agrees_with_ordering_and_hash() {
        use std::collections::HashSet;

        let nan = Cell::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(Cell::Float(0.0), Cell::Float(-0.0));
        assert_ne!(Cell::Integer(1), Cell::Float(1.0));

        let hashed: HashSet<Cell> = [nan.clone(), nan, Cell::Float(0.0), Cell::Float(-0.0)]
            .into_iter()
            .collect();
        let ordered: BTreeSet<Cell> = hashed.iter().cloned().collect();
        assert_eq!(hashed.len(), 3);
        assert_eq!(ordered.len(), hashed.len());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Table::from_columns(vec![
            Column::new("a", vec![]),
            Column::new("a", vec![]),
        ]);
        assert_eq!(result, Err(ShapeError::DuplicateName("a".into())));
    }

    #[test]
    fn test_cell_ordering_groups_by_type() {
        let mut cells = vec![
            Cell::Text("b".into()),
            Cell::Float(0.5),
            Cell::Null,
            Cell::Integer(3),
            Cell::Text("a".into()),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                Cell::Null,
                Cell::Integer(3),
                Cell::Float(0.5),
                Cell::Text("a".into()),
                Cell::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_parse_guess() {
        assert_eq!(Cell::parse_guess(""), Cell::Null);
        assert_eq!(Cell::parse_guess("42"), Cell::Integer(42));
        assert_eq!(Cell::parse_guess("1.5"), Cell::Float(1.5));
        assert_eq!(Cell::parse_guess("true"), Cell::Bool(true));
        assert_eq!(Cell::parse_guess("tcp"), Cell::Text("tcp".into()));
    }

    #[test]
    fn test_missing_markers_parse_as_null() {
        for token in ["NaN", "nan", "NA", "N/A", "null", "None", " NaN "] {
            assert_eq!(Cell::parse_guess(token), Cell::Null, "token {token:?}");
        }
        assert_eq!(Cell::parse_guess("inf"), Cell::Float(f64::INFINITY));
        assert_eq!(Cell::parse_guess("Nancy"), Cell::Text("Nancy".into()));
        assert!(Cell::Float(f64::NAN).is_missing());
        assert!(!Cell::Float(0.0).is_missing());
        assert!(Cell::Text("N/A".into()).is_missing());
    }

    #[test]
    fn test_retain_rows_keeps_order() {
        let t = sample().retain_rows(|r| r == 1);
        assert_eq!(t.n_rows(), 1);
        assert_eq!(t.cell(0, 0), Some(&Cell::Integer(2)));
    }
}
