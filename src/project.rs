// project.rs

use crate::error::{PcaError, Result};
use crate::pca::PcaResult;
use crate::plot::{
    AxisData, BarSeries, Layout, LineStyle, Marker, PlotArtifact, PlotSeries, ScatterSeries,
};
use log::debug;
use std::fmt;

/// Which artifact to build from a PCA result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionMode {
    /// Samples placed on the first two components.
    Scatter,
    /// Per-component explained variance with its running total.
    Scree,
    /// Per-feature weight on each retained component.
    Loadings,
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectionMode::Scatter => "scatter",
            ProjectionMode::Scree => "scree",
            ProjectionMode::Loadings => "loadings",
        };
        f.write_str(name)
    }
}

/// Rounds half to even at `decimals` places, matching numpy's `round`.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Explained-variance percentages rounded to one decimal and their running sum.
///
/// The cumulative series adds up the already rounded values, so it always agrees with the bars.
pub fn scree_percentages(ratios: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let individual: Vec<f64> = ratios.iter().map(|r| round_half_even(r * 100.0, 1)).collect();
    let mut running = 0.0;
    let cumulative = individual
        .iter()
        .map(|pct| {
            running += pct;
            // sums of one-decimal values are one-decimal values; strip float noise
            round_half_even(running, 1)
        })
        .collect();
    (individual, cumulative)
}

fn component_labels(k: usize) -> Vec<String> {
    (1..=k).map(|i| format!("PC{}", i)).collect()
}

/// Stateless mapping from a PCA result to plot artifacts.
pub struct ResultProjector;

impl ResultProjector {
    pub fn project(result: &PcaResult, mode: ProjectionMode) -> Result<PlotArtifact> {
        debug!(
            "Projecting {} component(s) as {} artifact.",
            result.n_components(),
            mode
        );
        match mode {
            ProjectionMode::Scatter => Self::scatter(result),
            ProjectionMode::Scree => Ok(Self::scree(result)),
            ProjectionMode::Loadings => Ok(Self::loadings(result)),
        }
    }

    /// One marker trace per sample at (PC1, PC2).
    pub fn scatter(result: &PcaResult) -> Result<PlotArtifact> {
        if result.n_components() < 2 {
            return Err(PcaError::InsufficientData(format!(
                "A PCA scatter plot needs 2 components, only {} available.",
                result.n_components()
            )));
        }
        let scores = result.scores();
        let ratios = result.explained_variance_ratio();

        let data = result
            .sample_labels()
            .iter()
            .enumerate()
            .map(|(i, label)| {
                PlotSeries::Scatter(ScatterSeries {
                    mode: "markers".into(),
                    x: AxisData::Numeric(vec![scores[[i, 0]]]),
                    y: AxisData::Numeric(vec![scores[[i, 1]]]),
                    name: label.clone(),
                    marker: Some(Marker {
                        size: Some(12),
                        color: Some("#fa8072".into()),
                        line: Some(LineStyle::black(2)),
                    }),
                    line: None,
                })
            })
            .collect();

        let layout = Layout::new(
            "PCA Plot",
            format!("PC1 ({:.2}%)", ratios[0] * 100.0),
            format!("PC2 ({:.2}%)", ratios[1] * 100.0),
        )
        .with_legend(true);

        Ok(PlotArtifact { data, layout })
    }

    /// Bars of rounded percentages plus the cumulative line.
    pub fn scree(result: &PcaResult) -> PlotArtifact {
        let ratios = result.explained_variance_ratio().to_vec();
        let (individual, cumulative) = scree_percentages(&ratios);
        let labels = component_labels(individual.len());

        let bars = PlotSeries::Bar(BarSeries {
            x: AxisData::Categorical(labels.clone()),
            text: Some(individual.iter().map(|v| format!("{:.1}%", v)).collect()),
            y: AxisData::Numeric(individual),
            name: "Individual".into(),
            textposition: Some("auto".into()),
            marker: Some(Marker {
                size: None,
                color: Some("yellow".into()),
                line: Some(LineStyle::black(2)),
            }),
        });
        let running_total = PlotSeries::Scatter(ScatterSeries {
            mode: "lines+markers".into(),
            x: AxisData::Categorical(labels),
            y: AxisData::Numeric(cumulative),
            name: "Cumulative".into(),
            marker: Some(Marker {
                size: Some(7),
                color: None,
                line: None,
            }),
            line: Some(LineStyle::black(2)),
        });

        PlotArtifact {
            data: vec![bars, running_total],
            layout: Layout::new("Scree Plot", "Principal component", "Explained variance (%)"),
        }
    }

    /// One grouped bar series per component, bars indexed by feature label.
    pub fn loadings(result: &PcaResult) -> PlotArtifact {
        let features = result.feature_labels().to_vec();
        let data = component_labels(result.n_components())
            .into_iter()
            .zip(result.loadings().rows())
            .map(|(name, row)| {
                PlotSeries::Bar(BarSeries {
                    x: AxisData::Categorical(features.clone()),
                    y: AxisData::Numeric(row.to_vec()),
                    name,
                    text: None,
                    textposition: None,
                    marker: None,
                })
            })
            .collect();

        PlotArtifact {
            data,
            layout: Layout::new("Loadings Plot", "Feature", "Loading")
                .with_legend(true)
                .with_barmode("group"),
        }
    }
}
