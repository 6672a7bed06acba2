// decomposition.rs

use crate::error::{PcaError, Result};
use log::debug;
use ndarray::{Array1, Array2};

/// Controls for the cyclic Jacobi eigen solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub max_sweeps: usize,
    /// Convergence threshold on the off-diagonal Frobenius norm, relative to the whole matrix.
    pub tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_sweeps: 100,
            tolerance: 1e-12,
        }
    }
}

/// Eigenpairs of a symmetric matrix, sorted by descending eigenvalue.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub values: Array1<f64>,
    /// Column `i` is the unit eigenvector of `values[i]`.
    pub vectors: Array2<f64>,
}

/// Eigen-decomposition of a real symmetric matrix.
///
/// Eigenvalues come back in descending order. Equal eigenvalues keep the order in which the
/// solver produced them, so the output is a pure function of the input.
pub fn symmetric_eigen(matrix: &Array2<f64>, settings: &SolverSettings) -> Result<EigenPairs> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(PcaError::NumericInstability(format!(
            "Eigen-decomposition needs a square matrix, got {}x{}.",
            rows, cols
        )));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(PcaError::NumericInstability(
            "Matrix handed to the eigen solver contains non-finite values.".into(),
        ));
    }

    let unsorted = solve(matrix, settings)?;
    let sorted = sort_descending(unsorted);

    if sorted.values.iter().chain(sorted.vectors.iter()).any(|v| !v.is_finite()) {
        return Err(PcaError::NumericInstability(
            "Eigen solver produced non-finite values.".into(),
        ));
    }
    Ok(sorted)
}

#[cfg(not(feature = "lapack"))]
fn solve(matrix: &Array2<f64>, settings: &SolverSettings) -> Result<EigenPairs> {
    jacobi_eigen(matrix, settings)
}

#[cfg(feature = "lapack")]
fn solve(matrix: &Array2<f64>, _settings: &SolverSettings) -> Result<EigenPairs> {
    use ndarray_linalg::{Eigh, UPLO};
    let (values, vectors) = matrix
        .eigh(UPLO::Lower)
        .map_err(|e| PcaError::NumericInstability(format!("LAPACK eigh failed: {}", e)))?;
    Ok(EigenPairs { values, vectors })
}

/// Cyclic Jacobi rotations until the off-diagonal mass vanishes.
pub(crate) fn jacobi_eigen(matrix: &Array2<f64>, settings: &SolverSettings) -> Result<EigenPairs> {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    let frobenius = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let threshold = settings.tolerance * frobenius;

    for sweep in 0..settings.max_sweeps {
        let off_diagonal = off_diagonal_norm(&a);
        if off_diagonal <= threshold {
            debug!(
                "Jacobi converged after {} sweep(s) on a {}x{} matrix (off-diagonal norm {:.3e}).",
                sweep, n, n, off_diagonal
            );
            return Ok(EigenPairs {
                values: a.diag().to_owned(),
                vectors: v,
            });
        }

        for p in 0..n.saturating_sub(1) {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let app = a[[p, p]];
                let aqq = a[[q, q]];

                // Past the first sweeps, entries too small to change either diagonal are zeroed.
                if sweep > 3
                    && (app.abs() + 100.0 * apq.abs() == app.abs())
                    && (aqq.abs() + 100.0 * apq.abs() == aqq.abs())
                {
                    a[[p, q]] = 0.0;
                    a[[q, p]] = 0.0;
                    continue;
                }

                let theta = (aqq - app) / (2.0 * apq);
                let t = if theta.abs() > 1e150 {
                    1.0 / (2.0 * theta)
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    if k == p || k == q {
                        continue;
                    }
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    let new_kp = c * akp - s * akq;
                    let new_kq = s * akp + c * akq;
                    a[[k, p]] = new_kp;
                    a[[p, k]] = new_kp;
                    a[[k, q]] = new_kq;
                    a[[q, k]] = new_kq;
                }
                a[[p, p]] = app - t * apq;
                a[[q, q]] = aqq + t * apq;
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    Err(PcaError::NumericInstability(format!(
        "Jacobi eigen solver did not converge within {} sweeps (off-diagonal norm {:.3e}).",
        settings.max_sweeps,
        off_diagonal_norm(&a)
    )))
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for p in 0..n {
        for q in (p + 1)..n {
            sum += 2.0 * a[[p, q]] * a[[p, q]];
        }
    }
    sum.sqrt()
}

fn sort_descending(pairs: EigenPairs) -> EigenPairs {
    let mut order: Vec<usize> = (0..pairs.values.len()).collect();
    // Stable: equal eigenvalues keep their solver order.
    order.sort_by(|&a, &b| pairs.values[b].total_cmp(&pairs.values[a]));

    let values = Array1::from_iter(order.iter().map(|&i| pairs.values[i]));
    let mut vectors = Array2::<f64>::zeros(pairs.vectors.raw_dim());
    for (new_idx, &old_idx) in order.iter().enumerate() {
        vectors.column_mut(new_idx).assign(&pairs.vectors.column(old_idx));
    }
    EigenPairs { values, vectors }
}
