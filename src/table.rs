//! In-memory worksheet tables.
//!
//! A `Table` is the normalized output of the sheet loader: snake_case
//! column names over rows of loosely typed cells. Stages resolve the
//! columns they need once, then read cells by row and build their own
//! typed records from them.

use crate::error::{PipelineError, PipelineResult};
use crate::util::{parse_f64_safe, render_number};

/// One worksheet cell.
#[derive(Debug, Clone, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    #[cfg(test)]
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Blank strings count as empty, the same as a missing cell.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
            Cell::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(n) => Some(render_number(*n)),
            Cell::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if !n.is_nan() => Some(*n),
            Cell::Text(s) => parse_f64_safe(Some(s)),
            _ => None,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Empty, Cell::Empty) => true,
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Number(a), Cell::Number(b)) => a.to_bits() == b.to_bits(),
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// A named worksheet with normalized column names.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Short rows are padded with empty cells, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Look up a column that the caller cannot work without.
    pub fn require(&self, column: &str) -> PipelineResult<usize> {
        self.column_index(column)
            .ok_or_else(|| PipelineError::missing_column(&self.name, column))
    }

    /// Text of the cell at `row`/`col`, `None` when empty or out of range.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        self.rows.get(row)?.get(col)?.as_text()
    }

    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row)?.get(col)?.as_f64()
    }

    /// Append another table's rows, aligning by column name.
    ///
    /// Columns only one side has are added; cells the other side never had
    /// stay empty.
    pub fn append(&mut self, other: &Table) {
        if self.columns.is_empty() && self.rows.is_empty() {
            self.columns = other.columns.clone();
            if self.name.is_empty() {
                self.name = other.name.clone();
            }
        }
        for col in &other.columns {
            if self.column_index(col).is_none() {
                self.columns.push(col.clone());
                for row in &mut self.rows {
                    row.push(Cell::Empty);
                }
            }
        }
        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| other.column_index(c))
            .collect();
        for row in &other.rows {
            self.rows.push(
                mapping
                    .iter()
                    .map(|m| m.map(|i| row[i].clone()).unwrap_or_default())
                    .collect(),
            );
        }
    }
}
