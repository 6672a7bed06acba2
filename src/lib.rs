//! Principal component analysis for labeled expression tables.
//!
//! A request flows through [`TableParser`] -> [`DataCleaner`] -> [`Standardizer`] ->
//! [`PcaEngine`] -> [`ResultProjector`], driven by an [`AnalysisPipeline`]. The result is a
//! Plotly-shaped [`PlotArtifact`] for a scatter, scree or loadings plot.
//!
//! ```no_run
//! use expression_pca::{AnalysisConfig, AnalysisPipeline, ProjectionMode, RawTable};
//!
//! # fn main() -> expression_pca::Result<()> {
//! let table = RawTable::from_json_str(r#"[{"gene": "a", "s1": 1, "s2": 2}]"#)?;
//! let pipeline = AnalysisPipeline::new(AnalysisConfig::default())?;
//! let artifact = pipeline.run(&table, ProjectionMode::Scree)?;
//! # Ok(())
//! # }
//! ```

pub mod clean;
pub mod config;
pub mod decomposition;
pub mod error;
pub mod matrix;
pub mod pca;
pub mod pipeline;
pub mod plot;
pub mod project;
pub mod standardize;
pub mod table;

pub use clean::{CleanedTable, DataCleaner};
pub use config::AnalysisConfig;
pub use decomposition::SolverSettings;
pub use error::{ErrorCategory, PcaError, Result};
pub use matrix::LabeledMatrix;
pub use pca::{PcaEngine, PcaResult};
pub use pipeline::{Analysis, AnalysisPipeline};
pub use plot::PlotArtifact;
pub use project::{ProjectionMode, ResultProjector};
pub use standardize::{Orientation, StandardizedMatrix, Standardizer};
pub use table::{CellValue, ParsedTable, RawRecord, RawTable, TableParser};
