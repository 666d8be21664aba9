//! In-memory statement tables.
//!
//! A [`Table`] is the shape every export passes through: a header row plus data
//! rows of [`Value`] cells. Rows straight out of a CSV may be ragged; missing
//! cells read as absent rather than as an error.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn empty() -> Self {
        Value::Text(String::new())
    }

    /// The string content of a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True only for an empty text cell.
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Decimal content of the cell; text cells are parsed with [`parse_decimal`].
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            Value::Text(s) => parse_decimal(s),
            Value::Date(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(d) => write!(f, "{d}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

/// Parse a statement amount such as `1,234.56` or `-12.00`.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Borrowed view of one data row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    header: &'a [String],
    cells: &'a [Value],
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.header.iter().position(|h| h == column)?;
        self.cells.get(idx)
    }

    /// Text of the named cell; empty for missing or non-text cells.
    pub fn text(&self, column: &str) -> &'a str {
        self.get(column).and_then(Value::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &'a [Value] {
        self.cells
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from rows produced by any loader (CSV, spreadsheet, tests).
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|cells| RowRef {
            header: &self.header,
            cells,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|h| h == column)
    }

    pub fn require_column(&self, column: &str) -> Result<usize, ImportError> {
        self.column_index(column)
            .ok_or_else(|| ImportError::MissingColumn(column.to_string()))
    }

    /// Apply `f` to every data cell.
    pub fn convert_all(mut self, f: impl Fn(Value) -> Value) -> Self {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                let v = std::mem::replace(cell, Value::empty());
                *cell = f(v);
            }
        }
        self
    }

    /// Apply `f` to every cell of one column. Rows too short to hold the
    /// column are left alone.
    pub fn convert(
        self,
        column: &str,
        f: impl Fn(Value) -> Result<Value, ImportError>,
    ) -> Result<Self, ImportError> {
        self.convert_indexed(column, |_, v| f(v))
    }

    /// Like [`Table::convert`], also passing the zero-based data row index.
    pub fn convert_indexed(
        mut self,
        column: &str,
        f: impl Fn(usize, Value) -> Result<Value, ImportError>,
    ) -> Result<Self, ImportError> {
        let idx = self.require_column(column)?;
        for (i, row) in self.rows.iter_mut().enumerate() {
            if let Some(cell) = row.get_mut(idx) {
                let v = std::mem::replace(cell, Value::empty());
                *cell = f(i, v)?;
            }
        }
        Ok(self)
    }

    /// Keep the rows for which `pred` holds.
    pub fn select(mut self, pred: impl Fn(&RowRef<'_>) -> bool) -> Self {
        let header = std::mem::take(&mut self.header);
        self.rows.retain(|cells| {
            pred(&RowRef {
                header: &header,
                cells,
            })
        });
        self.header = header;
        self
    }

    /// Derive a column from each row. An existing column of the same name is
    /// overwritten.
    pub fn add_field(self, name: &str, f: impl Fn(&RowRef<'_>) -> Value) -> Self {
        let values = self.rows().map(|row| f(&row)).collect();
        self.set_column(name, values)
    }

    /// Fallible variant of [`Table::add_field`].
    pub fn try_add_field(
        self,
        name: &str,
        f: impl Fn(&RowRef<'_>) -> Result<Value, ImportError>,
    ) -> Result<Self, ImportError> {
        let values = self.rows().map(|row| f(&row)).collect::<Result<Vec<_>, _>>()?;
        Ok(self.set_column(name, values))
    }

    fn set_column(mut self, name: &str, values: Vec<Value>) -> Self {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.header.push(name.to_string());
                self.header.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() <= idx {
                row.resize(idx + 1, Value::empty());
            }
            row[idx] = value;
        }
        self
    }

    /// Remove a column.
    pub fn cut_out(mut self, column: &str) -> Result<Self, ImportError> {
        let idx = self.require_column(column)?;
        self.header.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        Ok(self)
    }

    /// Rename columns per `(from, to)` pairs; absent source columns are ignored.
    pub fn rename(mut self, map: &[(String, String)]) -> Self {
        for h in &mut self.header {
            if let Some((_, to)) = map.iter().find(|(from, _)| from == h) {
                *h = to.clone();
            }
        }
        self
    }

    /// Drop the last `n` data rows.
    pub fn drop_last(mut self, n: usize) -> Self {
        let keep = self.rows.len().saturating_sub(n);
        self.rows.truncate(keep);
        self
    }

    /// Re-anchor the table on the row whose cells equal `labels`: that row
    /// becomes the header and only the rows after it remain.
    pub fn start_at_labels(mut self, labels: &[String]) -> Result<Self, ImportError> {
        if self.header == labels {
            return Ok(self);
        }
        let pos = self
            .rows
            .iter()
            .position(|row| row_matches_labels(row, labels))
            .ok_or_else(|| ImportError::MissingColumnLabels {
                expected: labels.join(","),
            })?;
        let mut rest = self.rows.split_off(pos);
        rest.remove(0);
        self.header = labels.to_vec();
        self.rows = rest;
        Ok(self)
    }

    /// First data row whose first cell is the text `label`.
    pub fn find_labeled_row(&self, label: &str) -> Option<&[Value]> {
        self.rows
            .iter()
            .find(|row| row.first().and_then(Value::as_str) == Some(label))
            .map(Vec::as_slice)
    }
}

fn row_matches_labels(row: &[Value], labels: &[String]) -> bool {
    // Trailing blank cells come from ragged CSV lines.
    let mut cells: &[Value] = row;
    while cells.len() > labels.len() && cells.last().is_some_and(Value::is_blank) {
        cells = &cells[..cells.len() - 1];
    }
    cells.len() == labels.len()
        && cells
            .iter()
            .zip(labels)
            .all(|(cell, label)| cell.as_str() == Some(label.as_str()))
}
