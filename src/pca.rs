// pca.rs

use crate::decomposition::{symmetric_eigen, EigenPairs, SolverSettings};
use crate::error::{PcaError, Result};
use crate::standardize::StandardizedMatrix;
use log::{debug, info, warn};
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;

/// Loadings whose norm falls below this fraction of the data norm belong to a
/// zero-variance direction and are replaced by an orthonormal completion.
const NULL_COMPONENT_TOLERANCE: f64 = 1e-6;

/// Output of one PCA fit over `n` samples and `p` features, reduced to `k` components.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaResult {
    /// `k x p`, one unit-norm row per component.
    loadings: Array2<f64>,
    /// `n x k`, sample coordinates along each component.
    scores: Array2<f64>,
    /// Covariance eigenvalue per component (divisor `n - 1`).
    explained_variance: Array1<f64>,
    explained_variance_ratio: Array1<f64>,
    total_variance: f64,
    sample_labels: Vec<String>,
    feature_labels: Vec<String>,
}

impl PcaResult {
    pub fn n_components(&self) -> usize {
        self.loadings.nrows()
    }

    pub fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &Array1<f64> {
        &self.explained_variance_ratio
    }

    /// Sum of all covariance eigenvalues, retained or not.
    pub fn total_variance(&self) -> f64 {
        self.total_variance
    }

    pub fn sample_labels(&self) -> &[String] {
        &self.sample_labels
    }

    pub fn feature_labels(&self) -> &[String] {
        &self.feature_labels
    }

    pub fn cumulative_variance_ratio(&self) -> Array1<f64> {
        let mut running = 0.0;
        self.explained_variance_ratio.mapv(|r| {
            running += r;
            running
        })
    }
}

/// Principal component analysis over an already standardized matrix.
#[derive(Debug, Clone, Default)]
pub struct PcaEngine {
    settings: SolverSettings,
}

impl PcaEngine {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Fits `requested` components (all of `min(n, p)` when `None`).
    ///
    /// Components are ordered by descending explained variance and each loading vector is
    /// signed so that its largest-magnitude entry is positive.
    pub fn fit(&self, data: &StandardizedMatrix, requested: Option<usize>) -> Result<PcaResult> {
        let x = data.values();
        let (n_samples, n_features) = x.dim();

        if n_samples < 2 {
            return Err(PcaError::InsufficientData(format!(
                "PCA requires at least 2 samples, found {}.",
                n_samples
            )));
        }
        if n_features == 0 {
            return Err(PcaError::InsufficientData(
                "PCA requires at least 1 feature, found 0.".into(),
            ));
        }

        let max_possible_k = n_samples.min(n_features);
        let k = match requested {
            Some(0) => {
                return Err(PcaError::InvalidConfig(
                    "Number of components must be > 0.".into(),
                ))
            }
            Some(k) if k > max_possible_k => {
                warn!(
                    "Requested k={} exceeds max possible ({}), adjusting to {}.",
                    k, max_possible_k, max_possible_k
                );
                max_possible_k
            }
            Some(k) => k,
            None => max_possible_k,
        };

        let dof = (n_samples - 1) as f64;
        let use_gram = n_features > n_samples;
        debug!(
            "PCA on {} samples x {} features, k={}, via {} matrix.",
            n_samples,
            n_features,
            k,
            if use_gram { "Gram" } else { "covariance" }
        );

        let eigen = if use_gram {
            symmetric_eigen(&(x.dot(&x.t()) / dof), &self.settings)?
        } else {
            symmetric_eigen(&(x.t().dot(x) / dof), &self.settings)?
        };

        let eigenvalues = eigen.values.mapv(|v| v.max(0.0));
        let total_variance = eigenvalues.sum();
        if total_variance <= 0.0 {
            return Err(PcaError::InsufficientData(
                "Every feature is constant across samples; there is no variance to explain.".into(),
            ));
        }

        let mut loadings = if use_gram {
            loadings_from_gram(x, &eigen, k)?
        } else {
            loadings_from_covariance(&eigen, k)
        };
        for mut row in loadings.axis_iter_mut(Axis(0)) {
            if leading_entry(row.view()) < 0.0 {
                row.mapv_inplace(|v| -v);
            }
        }

        let scores = x.dot(&loadings.t());
        let explained_variance = eigenvalues.slice(s![..k]).to_owned();
        let explained_variance_ratio = &explained_variance / total_variance;

        if scores
            .iter()
            .chain(loadings.iter())
            .chain(explained_variance_ratio.iter())
            .any(|v| !v.is_finite())
        {
            return Err(PcaError::NumericInstability(
                "PCA produced non-finite scores, loadings or variance ratios.".into(),
            ));
        }

        info!(
            "PCA complete: {} component(s), explained variance ratios (first 5): {:?}",
            k,
            explained_variance_ratio.iter().take(5).collect::<Vec<_>>()
        );

        Ok(PcaResult {
            loadings,
            scores,
            explained_variance,
            explained_variance_ratio,
            total_variance,
            sample_labels: data.sample_labels().to_vec(),
            feature_labels: data.feature_labels().to_vec(),
        })
    }
}

/// Eigenvectors of the `p x p` covariance matrix are the loadings directly.
fn loadings_from_covariance(eigen: &EigenPairs, k: usize) -> Array2<f64> {
    eigen.vectors.slice(s![.., ..k]).t().to_owned()
}

/// Maps Gram eigenvectors `u` back to feature space as `X^T u / |X^T u|`.
fn loadings_from_gram(x: &Array2<f64>, eigen: &EigenPairs, k: usize) -> Result<Array2<f64>> {
    let n_features = x.ncols();
    let data_norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
    let null_threshold = NULL_COMPONENT_TOLERANCE * data_norm;

    let recovered: Vec<Option<Array1<f64>>> = (0..k)
        .into_par_iter()
        .map(|i| {
            let w = x.t().dot(&eigen.vectors.column(i));
            let norm = w.dot(&w).sqrt();
            if norm > null_threshold {
                Some(w / norm)
            } else {
                None
            }
        })
        .collect();

    let mut basis: Vec<Array1<f64>> = recovered.iter().flatten().cloned().collect();
    let null_count = recovered.iter().filter(|r| r.is_none()).count();
    if null_count > 0 {
        debug!(
            "{} of {} retained components have zero variance; completing the basis.",
            null_count, k
        );
    }

    let mut loadings = Array2::<f64>::zeros((k, n_features));
    for (i, slot) in recovered.into_iter().enumerate() {
        let vector = match slot {
            Some(v) => v,
            None => {
                let completed = complete_basis(&basis, n_features)?;
                basis.push(completed.clone());
                completed
            }
        };
        loadings.row_mut(i).assign(&vector);
    }
    Ok(loadings)
}

/// Next unit vector orthogonal to `basis`, found by Gram-Schmidt over the standard basis in
/// feature order.
fn complete_basis(basis: &[Array1<f64>], dim: usize) -> Result<Array1<f64>> {
    for j in 0..dim {
        let mut w = Array1::<f64>::zeros(dim);
        w[j] = 1.0;
        // two passes keep the result orthogonal to working precision
        for _ in 0..2 {
            for v in basis {
                let projection = v.dot(&w);
                w.scaled_add(-projection, v);
            }
        }
        let norm = w.dot(&w).sqrt();
        if norm > NULL_COMPONENT_TOLERANCE {
            return Ok(w / norm);
        }
    }
    Err(PcaError::NumericInstability(format!(
        "Could not extend {} loading vectors to an orthonormal set in {} dimensions.",
        basis.len(),
        dim
    )))
}

/// The largest-magnitude entry; the first one wins on ties.
fn leading_entry(row: ArrayView1<f64>) -> f64 {
    let mut best = 0.0f64;
    for &v in row.iter() {
        if v.abs() > best.abs() {
            best = v;
        }
    }
    best
}
