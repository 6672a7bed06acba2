// plot.rs
//
// Plotly-shaped response objects. Everything here is plain data; the projector fills it in.

use serde::Serialize;

/// Response boundary object: `{ "data": [...], "layout": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotArtifact {
    pub data: Vec<PlotSeries>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlotSeries {
    Scatter(ScatterSeries),
    Bar(BarSeries),
}

/// Axis values are either numeric coordinates or category labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisData {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub mode: String,
    pub x: AxisData,
    pub y: AxisData,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub x: AxisData,
    pub y: AxisData,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: String,
    pub width: u32,
}

impl LineStyle {
    pub fn black(width: u32) -> Self {
        Self {
            color: "black".into(),
            width,
        }
    }
}

// --- Layout ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub title: String,
    pub titlefont: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: AxisLayout,
    pub yaxis: AxisLayout,
    pub autosize: bool,
    pub hovermode: String,
    pub showlegend: bool,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
}

impl Layout {
    /// Shared presentation defaults: 30pt title, 20pt axis titles, 400px tall.
    pub fn new(title: &str, x_title: impl Into<String>, y_title: impl Into<String>) -> Self {
        let axis = |text: String| AxisLayout {
            title: text,
            titlefont: Font {
                size: 20,
                color: "black".into(),
            },
        };
        Self {
            title: Title {
                text: title.to_string(),
                font: Font {
                    size: 30,
                    color: "black".into(),
                },
            },
            xaxis: axis(x_title.into()),
            yaxis: axis(y_title.into()),
            autosize: true,
            hovermode: "closest".into(),
            showlegend: false,
            height: 400,
            barmode: None,
        }
    }

    pub fn with_legend(mut self, show: bool) -> Self {
        self.showlegend = show;
        self
    }

    pub fn with_barmode(mut self, mode: &str) -> Self {
        self.barmode = Some(mode.to_string());
        self
    }
}
