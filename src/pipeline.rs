// pipeline.rs

use crate::clean::{CleanedTable, DataCleaner};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::pca::{PcaEngine, PcaResult};
use crate::plot::PlotArtifact;
use crate::project::{ProjectionMode, ResultProjector};
use crate::standardize::{StandardizedMatrix, Standardizer};
use crate::table::{RawTable, TableParser};
use log::info;
use std::time::Instant;

/// Every intermediate product of one run, for callers that want more than the plot.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub cleaned: CleanedTable,
    pub standardized: StandardizedMatrix,
    pub pca: PcaResult,
}

/// Parse -> clean -> standardize -> PCA -> project, written once for every projection mode.
///
/// Holds only its configuration, so one pipeline can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    engine: PcaEngine,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let engine = PcaEngine::new(config.solver);
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Component count fitted for `mode`.
    pub fn components_for(&self, mode: ProjectionMode) -> Option<usize> {
        match mode {
            ProjectionMode::Scatter => self.config.scatter_components,
            ProjectionMode::Scree => Some(self.config.scree_components),
            ProjectionMode::Loadings => Some(self.config.loadings_components),
        }
    }

    /// Runs the shared stages and keeps each stage's output.
    pub fn analyze(&self, table: &RawTable, components: Option<usize>) -> Result<Analysis> {
        let start = Instant::now();

        let parsed = TableParser::parse(table)?;
        let cleaned = DataCleaner::clean(&parsed)?;
        let standardized = Standardizer::standardize(&cleaned.matrix, self.config.orientation)?;
        let pca = self.engine.fit(&standardized, components)?;

        info!(
            "Analysis of {} samples x {} features done: {} component(s) in {:.2?}.",
            standardized.n_samples(),
            standardized.n_features(),
            pca.n_components(),
            start.elapsed()
        );

        Ok(Analysis {
            cleaned,
            standardized,
            pca,
        })
    }

    /// Full request: the shared stages followed by the projection for `mode`.
    pub fn run(&self, table: &RawTable, mode: ProjectionMode) -> Result<PlotArtifact> {
        info!("Running {} analysis on {} record(s).", mode, table.len());
        let analysis = self.analyze(table, self.components_for(mode))?;
        ResultProjector::project(&analysis.pca, mode)
    }
}
