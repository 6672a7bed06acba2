// matrix.rs

use crate::error::{PcaError, Result};
use ndarray::Array2;

/// Finite numeric matrix with row labels and column names.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    values: Array2<f64>,
    row_labels: Vec<String>,
    column_names: Vec<String>,
}

impl LabeledMatrix {
    pub fn try_new(
        values: Array2<f64>,
        row_labels: Vec<String>,
        column_names: Vec<String>,
    ) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != row_labels.len() || cols != column_names.len() {
            return Err(PcaError::MalformedInput(format!(
                "Matrix is {}x{} but {} row labels and {} column names were given.",
                rows,
                cols,
                row_labels.len(),
                column_names.len()
            )));
        }
        if let Some(((r, c), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(PcaError::NumericInstability(format!(
                "Non-finite value {} at row '{}', column '{}'.",
                v, row_labels[r], column_names[c]
            )));
        }
        Ok(Self {
            values,
            row_labels,
            column_names,
        })
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn keeps_shape_and_labels() {
        let m = LabeledMatrix::try_new(
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            labels("g", 3),
            labels("s", 2),
        )
        .unwrap();
        assert_eq!((m.n_rows(), m.n_cols()), (3, 2));
        assert_eq!(m.row_labels()[2], "g3");
        assert_eq!(m.column_names()[1], "s2");
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let err =
            LabeledMatrix::try_new(array![[1.0, 2.0]], labels("g", 2), labels("s", 2)).unwrap_err();
        assert!(matches!(err, PcaError::MalformedInput(_)));
    }

    #[test]
    fn rejects_non_finite_cells() {
        let err = LabeledMatrix::try_new(array![[1.0, f64::NAN]], labels("g", 1), labels("s", 2))
            .unwrap_err();
        assert!(matches!(err, PcaError::NumericInstability(_)));
    }
}
