// table.rs

use crate::error::{PcaError, Result};
use log::{debug, info};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Read;

// --- Raw Cells & Records ---

/// One untyped cell as it arrives from the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    /// JSON `null` or an empty delimited-text field.
    Missing,
}

impl CellValue {
    fn from_json(value: &JsonValue, row_idx: usize, key: &str) -> Result<Self> {
        match value {
            JsonValue::Number(n) => n.as_f64().map(CellValue::Number).ok_or_else(|| {
                PcaError::MalformedInput(format!(
                    "Record {}: number in column '{}' is not representable as f64.",
                    row_idx, key
                ))
            }),
            JsonValue::String(s) => Ok(CellValue::Text(s.clone())),
            JsonValue::Null => Ok(CellValue::Missing),
            other => Err(PcaError::MalformedInput(format!(
                "Record {}: column '{}' holds a {}; only strings, numbers and null are accepted.",
                row_idx,
                key,
                json_type_name(other)
            ))),
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Ordered mapping from column name to cell. The first key is the label column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    fields: Vec<(String, CellValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and programmatic callers.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a field, replacing the value (but keeping the position) of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ordered sequence of records, exactly as received.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds a table from a JSON array of flat objects. Key order is preserved.
    pub fn from_json_value(root: &JsonValue) -> Result<Self> {
        let rows = root.as_array().ok_or_else(|| {
            PcaError::MalformedInput(format!(
                "Expected a top-level JSON array of records, found {}.",
                json_type_name(root)
            ))
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let object = row.as_object().ok_or_else(|| {
                PcaError::MalformedInput(format!(
                    "Record {} is a {}, expected an object.",
                    row_idx,
                    json_type_name(row)
                ))
            })?;
            let mut record = RawRecord::new();
            for (key, value) in object {
                record.insert(key.clone(), CellValue::from_json(value, row_idx, key)?);
            }
            records.push(record);
        }
        debug!("Decoded {} JSON records.", records.len());
        Ok(Self { records })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let root: JsonValue = serde_json::from_str(text)
            .map_err(|e| PcaError::MalformedInput(format!("Invalid JSON payload: {}", e)))?;
        Self::from_json_value(&root)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let root: JsonValue = serde_json::from_reader(reader)
            .map_err(|e| PcaError::MalformedInput(format!("Invalid JSON payload: {}", e)))?;
        Self::from_json_value(&root)
    }

    /// Reads delimited text with a header row. Every cell stays text so locale decimals
    /// (`"1,5"` in a `;`-separated file) reach the cleaner untouched; empty fields are missing.
    pub fn from_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| PcaError::MalformedInput(format!("Failed to read header row: {}", e)))?
            .iter()
            .map(String::from)
            .collect();

        for (idx, header) in headers.iter().enumerate() {
            if headers[..idx].contains(header) {
                return Err(PcaError::MalformedInput(format!(
                    "Duplicate column name '{}' in header row.",
                    header
                )));
            }
        }

        let mut records = Vec::new();
        for (row_idx, row_result) in csv_reader.records().enumerate() {
            let row = row_result.map_err(|e| {
                PcaError::MalformedInput(format!("Failed to read data row {}: {}", row_idx + 1, e))
            })?;
            let mut record = RawRecord::new();
            for (key, field) in headers.iter().zip(row.iter()) {
                let cell = if field.is_empty() {
                    CellValue::Missing
                } else {
                    CellValue::Text(field.to_string())
                };
                record.insert(key.clone(), cell);
            }
            records.push(record);
        }
        debug!(
            "Decoded {} delimited records with {} columns.",
            records.len(),
            headers.len()
        );
        Ok(Self { records })
    }
}

// --- TableParser ---

/// Labeled grid of untyped cells, the hand-off between parsing and cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub label_column: String,
    pub row_labels: Vec<String>,
    pub column_names: Vec<String>,
    /// Row-major, `row_labels.len()` rows of `column_names.len()` cells.
    pub cells: Vec<Vec<CellValue>>,
}

impl ParsedTable {
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn n_cols(&self) -> usize {
        self.column_names.len()
    }
}

pub struct TableParser;

impl TableParser {
    /// Splits a raw table into row labels, data column names and cells.
    ///
    /// The first key of the first record names the label column; the remaining keys of that
    /// record fix the data columns and their order. Later records must carry exactly the same
    /// key set, in any order.
    pub fn parse(table: &RawTable) -> Result<ParsedTable> {
        let first = table
            .records()
            .first()
            .ok_or_else(|| PcaError::MalformedInput("The table contains no records.".into()))?;

        if first.len() < 2 {
            return Err(PcaError::MalformedInput(format!(
                "Records need a label column and at least one data column, found {} key(s).",
                first.len()
            )));
        }

        let mut keys = first.keys();
        let label_column = keys
            .next()
            .map(String::from)
            .ok_or_else(|| PcaError::MalformedInput("First record has no keys.".into()))?;
        let column_names: Vec<String> = keys.map(String::from).collect();

        let mut row_labels = Vec::with_capacity(table.len());
        let mut cells = Vec::with_capacity(table.len());

        for (row_idx, record) in table.records().iter().enumerate() {
            let label_cell = record.get(&label_column).ok_or_else(|| {
                PcaError::MalformedInput(format!(
                    "Record {} is missing the label column '{}'.",
                    row_idx, label_column
                ))
            })?;
            if record.len() != column_names.len() + 1 {
                return Err(PcaError::MalformedInput(format!(
                    "Record {} has {} keys but the first record has {}.",
                    row_idx,
                    record.len(),
                    column_names.len() + 1
                )));
            }
            row_labels.push(render_label(label_cell, row_idx, &label_column)?);
            cells.push(Self::data_cells(record, &label_column, &column_names, row_idx)?);
        }

        info!(
            "Parsed table: {} rows x {} data columns (label column '{}').",
            row_labels.len(),
            column_names.len(),
            label_column
        );

        Ok(ParsedTable {
            label_column,
            row_labels,
            column_names,
            cells,
        })
    }

    fn data_cells(
        record: &RawRecord,
        label_column: &str,
        column_names: &[String],
        row_idx: usize,
    ) -> Result<Vec<CellValue>> {
        // Common case: same key order as the first record.
        let same_order = record
            .keys()
            .skip(1)
            .eq(column_names.iter().map(String::as_str))
            && record.keys().next() == Some(label_column);
        if same_order {
            return Ok(record.fields.iter().skip(1).map(|(_, v)| v.clone()).collect());
        }

        let by_key: HashMap<&str, &CellValue> =
            record.fields.iter().map(|(k, v)| (k.as_str(), v)).collect();
        column_names
            .iter()
            .map(|name| {
                by_key.get(name.as_str()).map(|v| (*v).clone()).ok_or_else(|| {
                    PcaError::MalformedInput(format!(
                        "Record {} is missing column '{}' present in the first record.",
                        row_idx, name
                    ))
                })
            })
            .collect()
    }
}

fn render_label(cell: &CellValue, row_idx: usize, label_column: &str) -> Result<String> {
    match cell {
        CellValue::Text(s) => Ok(s.clone()),
        CellValue::Number(n) => Ok(n.to_string()),
        CellValue::Missing => Err(PcaError::MalformedInput(format!(
            "Record {} has no value in label column '{}'.",
            row_idx, label_column
        ))),
    }
}
