// config.rs

use crate::decomposition::SolverSettings;
use crate::error::{PcaError, Result};
use crate::standardize::Orientation;

/// Everything that shapes an analysis run. Passed explicitly to [`crate::AnalysisPipeline::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub orientation: Orientation,
    /// Components fitted for a scatter plot; `None` keeps all of `min(n, p)`.
    pub scatter_components: Option<usize>,
    /// Upper bound on the bars of a scree plot.
    pub scree_components: usize,
    /// Components shown in a loadings plot.
    pub loadings_components: usize,
    pub solver: SolverSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::SamplesAsColumns,
            scatter_components: None,
            scree_components: 8,
            loadings_components: 2,
            solver: SolverSettings::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_scatter_components(mut self, k: Option<usize>) -> Self {
        self.scatter_components = k;
        self
    }

    pub fn with_scree_components(mut self, k: usize) -> Self {
        self.scree_components = k;
        self
    }

    pub fn with_loadings_components(mut self, k: usize) -> Self {
        self.loadings_components = k;
        self
    }

    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.scatter_components == Some(0) {
            return Err(PcaError::InvalidConfig(
                "scatter_components must be > 0 when set.".into(),
            ));
        }
        if self.scree_components == 0 {
            return Err(PcaError::InvalidConfig("scree_components must be > 0.".into()));
        }
        if self.loadings_components == 0 {
            return Err(PcaError::InvalidConfig(
                "loadings_components must be > 0.".into(),
            ));
        }
        if self.solver.max_sweeps == 0 {
            return Err(PcaError::InvalidConfig(
                "Eigen solver needs at least one sweep.".into(),
            ));
        }
        if !self.solver.tolerance.is_finite() || self.solver.tolerance <= 0.0 {
            return Err(PcaError::InvalidConfig(format!(
                "Eigen solver tolerance must be a positive finite number, got {}.",
                self.solver.tolerance
            )));
        }
        Ok(())
    }
}
