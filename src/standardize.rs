// standardize.rs

use crate::error::{PcaError, Result};
use crate::matrix::LabeledMatrix;
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Which axis of the input matrix holds the samples (observations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Matrix columns are samples and rows are features (genes x conditions). The matrix is
    /// transposed before scaling.
    #[default]
    SamplesAsColumns,
    /// Matrix rows are samples and columns are features.
    SamplesAsRows,
}

/// Samples x features, each feature centered and scaled to unit population variance.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedMatrix {
    values: Array2<f64>,
    sample_labels: Vec<String>,
    feature_labels: Vec<String>,
    means: Array1<f64>,
    /// Population standard deviation per feature; `0.0` marks a constant feature.
    scales: Array1<f64>,
}

impl StandardizedMatrix {
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn sample_labels(&self) -> &[String] {
        &self.sample_labels
    }

    pub fn feature_labels(&self) -> &[String] {
        &self.feature_labels
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn scales(&self) -> &Array1<f64> {
        &self.scales
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Indices of features whose standard deviation was exactly zero.
    pub fn constant_features(&self) -> Vec<usize> {
        self.scales
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

pub struct Standardizer;

impl Standardizer {
    /// Z-scores every feature over the samples selected by `orientation`.
    ///
    /// Divisor is the number of samples. A feature with standard deviation exactly zero becomes
    /// all zeros instead of dividing by zero.
    pub fn standardize(
        matrix: &LabeledMatrix,
        orientation: Orientation,
    ) -> Result<StandardizedMatrix> {
        let (data, sample_labels, feature_labels) = match orientation {
            Orientation::SamplesAsColumns => (
                matrix.values().t().to_owned(),
                matrix.column_names().to_vec(),
                matrix.row_labels().to_vec(),
            ),
            Orientation::SamplesAsRows => (
                matrix.values().clone(),
                matrix.row_labels().to_vec(),
                matrix.column_names().to_vec(),
            ),
        };
        let (n_samples, n_features) = data.dim();
        debug!(
            "Standardizing {} samples x {} features ({:?}).",
            n_samples, n_features, orientation
        );
        if n_samples == 0 || n_features == 0 {
            return Err(PcaError::InsufficientData(format!(
                "Cannot standardize a {}x{} matrix.",
                n_samples, n_features
            )));
        }

        let stats: Vec<(f64, f64)> = (0..n_features)
            .into_par_iter()
            .map(|j| {
                let column = data.column(j);
                let mean = column.iter().mean();
                // Deviations from the running mean are exactly zero for a constant feature.
                let variance = column.iter().map(|v| (v - mean).powi(2)).mean();
                (mean, variance.sqrt())
            })
            .collect();

        if let Some((j, (m, s))) = stats
            .iter()
            .enumerate()
            .find(|(_, (m, s))| !m.is_finite() || !s.is_finite())
        {
            return Err(PcaError::NumericInstability(format!(
                "Feature '{}' has non-finite mean ({}) or standard deviation ({}).",
                feature_labels[j], m, s
            )));
        }

        let means = Array1::from_iter(stats.iter().map(|(m, _)| *m));
        let scales = Array1::from_iter(stats.iter().map(|(_, s)| *s));

        let mut values = data;
        for (j, mut column) in values.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, scale) = (means[j], scales[j]);
            if scale == 0.0 {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|v| (v - mean) / scale);
            }
        }

        let constant = scales.iter().filter(|s| **s == 0.0).count();
        if constant > 0 {
            info!(
                "{} of {} features are constant across samples and standardize to zero.",
                constant, n_features
            );
        }

        Ok(StandardizedMatrix {
            values,
            sample_labels,
            feature_labels,
            means,
            scales,
        })
    }
}
