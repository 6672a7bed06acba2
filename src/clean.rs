// clean.rs

use crate::error::{PcaError, Result};
use crate::matrix::LabeledMatrix;
use crate::table::{CellValue, ParsedTable};
use log::{debug, info, warn};
use ndarray::Array2;

/// Output of the cleaning stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub matrix: LabeledMatrix,
    /// Labels of rows removed for holding at least one missing value, in input order.
    pub dropped_rows: Vec<String>,
}

pub struct DataCleaner;

impl DataCleaner {
    /// Parses a single cell. Commas are read as decimal points; anything that does not end up
    /// as a finite number is missing.
    pub fn normalize_cell(cell: &CellValue) -> Option<f64> {
        let parsed = match cell {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s.replace(',', ".").trim().parse::<f64>().ok(),
            CellValue::Missing => None,
        };
        parsed.filter(|v| v.is_finite())
    }

    /// Converts every cell and drops each row holding a missing value. Rows are never repaired.
    pub fn clean(table: &ParsedTable) -> Result<CleanedTable> {
        let n_cols = table.n_cols();
        let mut kept_values: Vec<f64> = Vec::with_capacity(table.n_rows() * n_cols);
        let mut kept_labels = Vec::with_capacity(table.n_rows());
        let mut dropped_rows = Vec::new();

        for (label, row) in table.row_labels.iter().zip(table.cells.iter()) {
            let parsed: Option<Vec<f64>> = row.iter().map(Self::normalize_cell).collect();
            match parsed {
                Some(values) if values.len() == n_cols => {
                    kept_values.extend(values);
                    kept_labels.push(label.clone());
                }
                Some(values) => {
                    return Err(PcaError::MalformedInput(format!(
                        "Row '{}' has {} cells, expected {}.",
                        label,
                        values.len(),
                        n_cols
                    )));
                }
                None => {
                    debug!("Row '{}' has a missing or unparsable cell, dropping.", label);
                    dropped_rows.push(label.clone());
                }
            }
        }

        if kept_labels.is_empty() {
            return Err(PcaError::EmptyDataset(format!(
                "All {} rows contained missing or unparsable values.",
                table.n_rows()
            )));
        }
        if !dropped_rows.is_empty() {
            warn!(
                "Dropped {} of {} rows with missing values (first few: {:?}).",
                dropped_rows.len(),
                table.n_rows(),
                dropped_rows.iter().take(5).collect::<Vec<_>>()
            );
        }
        info!(
            "Cleaning: {} / {} rows kept.",
            kept_labels.len(),
            table.n_rows()
        );

        let values = Array2::from_shape_vec((kept_labels.len(), n_cols), kept_values).map_err(|e| {
            PcaError::MalformedInput(format!("Failed to assemble cleaned matrix: {}", e))
        })?;
        let matrix = LabeledMatrix::try_new(values, kept_labels, table.column_names.clone())?;
        Ok(CleanedTable {
            matrix,
            dropped_rows,
        })
    }
}
