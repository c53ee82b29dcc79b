//! Row-based table types.
//!
//! Used for list-of-rows table sources: producers that emit tables as JSON
//! rows are normalized into a [`Table`] before being rendered to markdown or
//! turned into a comparison tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A table as rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows, top to bottom
    pub rows: Vec<TableRow>,

    /// Leading rows rendered as `th` (0 = none)
    pub header_rows: u8,
}

impl Table {
    /// Empty table without header rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table whose first `header_rows` rows are headers.
    pub fn with_header(header_rows: u8) -> Self {
        Self {
            header_rows,
            ..Self::new()
        }
    }

    /// Build a table from JSON rows.
    ///
    /// A row is either an array of cell values or an object whose values are
    /// the cells (in key order). Anything else is skipped.
    pub fn from_json_rows(rows: &[Value]) -> Self {
        let mut table = Self::new();
        for row in rows {
            let cells: Vec<TableCell> = match row {
                Value::Array(values) => values.iter().map(TableCell::from_value).collect(),
                Value::Object(map) => map.values().map(TableCell::from_value).collect(),
                _ => continue,
            };
            table.add_row(TableRow::new(cells));
        }
        table
    }

    /// Append a row.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Row count.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// No rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header rows, clamped to the rows present.
    pub fn header(&self) -> &[TableRow] {
        let end = (self.header_rows as usize).min(self.rows.len());
        &self.rows[..end]
    }

    /// Rows after the header.
    pub fn body(&self) -> &[TableRow] {
        let start = (self.header_rows as usize).min(self.rows.len());
        &self.rows[start..]
    }
}

/// One row of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells, left to right
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Row from cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }

    /// Row of plain text cells.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }
}

/// One cell with its spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell text
    pub text: String,

    /// Row span (1 = none)
    pub rowspan: u32,

    /// Column span (1 = none)
    pub colspan: u32,
}

impl TableCell {
    /// Unspanned cell holding `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rowspan: 1,
            colspan: 1,
        }
    }

    /// Create a cell from a JSON value, stringifying non-string scalars.
    pub fn from_value(value: &Value) -> Self {
        Self::text(stringify_value(value))
    }

    /// Builder: column span.
    pub fn colspan(mut self, span: u32) -> Self {
        self.colspan = span;
        self
    }

    /// Builder: row span.
    pub fn rowspan(mut self, span: u32) -> Self {
        self.rowspan = span;
        self
    }

    /// Blank after trimming.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Stringify a cell value.
///
/// Strings are taken verbatim, `null` becomes empty, nested objects and
/// arrays contribute their scalar values joined by a space.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => join_values(items.iter()),
        Value::Object(map) => join_values(map.values()),
    }
}

fn join_values<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .map(stringify_value)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
