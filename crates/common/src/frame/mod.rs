//! In-memory tabular frame model
//!
//! A `Frame` is the column-major table every derivation operates on: loaded
//! papers enter as a frame, derived features come back as new columns on a
//! cloned frame. Derivations never mutate their input; column assignment is
//! append-only on distinct column names.

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Stable string form used for codec classes, one-hot column names and
    /// group keys. `None` for null cells.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Str(s) => Some(s.clone()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Int(b as i64),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            // Nested structures are flattened by the loader before frames are
            // built; anything left over is stored as its JSON text.
            other => Value::Str(other.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::from(s.clone()),
        }
    }
}

/// Column-major table with ordered column names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<Value>>,
    rows: usize,
}

impl Frame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from ordered (name, column) pairs
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let mut frame = Frame::new();
        let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        frame.rows = rows;

        for (name, column) in columns {
            if column.len() != rows {
                return Err(AppError::InvalidFormat {
                    message: format!(
                        "column {} has {} rows, expected {}",
                        name,
                        column.len(),
                        rows
                    ),
                });
            }
            frame.push_column(name, column)?;
        }

        Ok(frame)
    }

    /// Build a frame from per-row (name, value) records with possibly ragged
    /// keys. Column order is first-seen; missing keys fill with `Null`; a key
    /// repeated within one record keeps its last value.
    pub fn from_records(records: Vec<Vec<(String, Value)>>) -> Self {
        let mut frame = Frame::new();

        for (row_idx, record) in records.into_iter().enumerate() {
            for (name, value) in record {
                let col = match frame.index.get(&name) {
                    Some(&col) => col,
                    None => {
                        // Backfill rows seen before this column appeared
                        frame.names.push(name.clone());
                        frame.index.insert(name, frame.columns.len());
                        frame.columns.push(vec![Value::Null; row_idx]);
                        frame.columns.len() - 1
                    }
                };
                let column = &mut frame.columns[col];
                if column.len() > row_idx {
                    // This record already filled the cell; last value wins
                    column[row_idx] = value;
                } else {
                    column.push(value);
                }
            }

            // Pad columns the record did not mention
            for column in frame.columns.iter_mut() {
                if column.len() == row_idx {
                    column.push(Value::Null);
                }
            }
            frame.rows = row_idx + 1;
        }

        frame
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Column names in order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column accessor; errors if the column is absent
    pub fn column(&self, name: &str) -> Result<&[Value]> {
        self.index
            .get(name)
            .map(|&i| self.columns[i].as_slice())
            .ok_or_else(|| AppError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Numeric view of a column; non-numeric cells become `None`
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.column(name)?.iter().map(Value::as_f64).collect())
    }

    /// Single cell accessor
    pub fn value(&self, name: &str, row: usize) -> Result<&Value> {
        let column = self.column(name)?;
        column.get(row).ok_or_else(|| AppError::InvalidFormat {
            message: format!("row {} out of bounds ({} rows)", row, self.rows),
        })
    }

    /// Return a copy of this frame with `column` assigned. An existing column
    /// of the same name is replaced, otherwise the column is appended.
    pub fn with_column(&self, name: &str, column: Vec<Value>) -> Result<Frame> {
        if column.len() != self.rows {
            return Err(AppError::InvalidFormat {
                message: format!(
                    "column {} has {} rows, expected {}",
                    name,
                    column.len(),
                    self.rows
                ),
            });
        }

        let mut out = self.clone();
        match out.index.get(name) {
            Some(&i) => out.columns[i] = column,
            None => {
                out.names.push(name.to_string());
                out.index.insert(name.to_string(), out.columns.len());
                out.columns.push(column);
            }
        }
        Ok(out)
    }

    /// Return a copy keeping only rows where `mask` is true
    pub fn retain_rows(&self, mask: &[bool]) -> Frame {
        let mut out = Frame::new();
        out.names = self.names.clone();
        out.index = self.index.clone();
        out.columns = self
            .columns
            .iter()
            .map(|column| {
                column
                    .iter()
                    .zip(mask)
                    .filter(|(_, &keep)| keep)
                    .map(|(v, _)| v.clone())
                    .collect()
            })
            .collect();
        out.rows = mask.iter().filter(|&&keep| keep).count();
        out
    }

    /// Return a copy without the named columns; unknown names are ignored
    pub fn drop_columns(&self, names: &[String]) -> Frame {
        let mut out = Frame::new();
        for (i, name) in self.names.iter().enumerate() {
            if !names.contains(name) {
                out.index.insert(name.clone(), out.columns.len());
                out.names.push(name.clone());
                out.columns.push(self.columns[i].clone());
            }
        }
        out.rows = self.rows;
        out
    }

    /// A page of rows as JSON objects, for table rendering
    pub fn to_records(&self, offset: usize, limit: usize) -> Vec<serde_json::Map<String, serde_json::Value>> {
        let end = (offset + limit).min(self.rows);
        (offset..end)
            .map(|row| {
                self.names
                    .iter()
                    .enumerate()
                    .map(|(col, name)| (name.clone(), (&self.columns[col][row]).into()))
                    .collect()
            })
            .collect()
    }

    /// Content hash of shape plus cell values; identical frames hash
    /// identically, so derivation results can be memoized against it
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.rows.to_le_bytes());
        for (i, name) in self.names.iter().enumerate() {
            hasher.update(name.as_bytes());
            hasher.update([0xff]);
            for value in &self.columns[i] {
                match value {
                    Value::Null => hasher.update([0u8]),
                    Value::Int(v) => {
                        hasher.update([1u8]);
                        hasher.update(v.to_le_bytes());
                    }
                    Value::Float(v) => {
                        hasher.update([2u8]);
                        hasher.update(v.to_le_bytes());
                    }
                    Value::Str(s) => {
                        hasher.update([3u8]);
                        hasher.update(s.as_bytes());
                        hasher.update([0xfe]);
                    }
                }
            }
        }
        hex::encode(hasher.finalize())
    }

    fn push_column(&mut self, name: String, column: Vec<Value>) -> Result<()> {
        if self.index.contains_key(&name) {
            return Err(AppError::InvalidFormat {
                message: format!("duplicate column name: {}", name),
            });
        }
        self.index.insert(name.clone(), self.columns.len());
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }
}
