//! Visualization type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported visualization types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationType {
    BarGraph,
    BoxPlot,
    BubbleChart,
    BumpChart,
    ExpandoTree,
    HeatTiles,
    Histogram,
    LineGraph,
    NumberTrend,
    Table,
}

impl VisualizationType {
    pub const ALL: [VisualizationType; 10] = [
        Self::BarGraph,
        Self::BoxPlot,
        Self::BubbleChart,
        Self::BumpChart,
        Self::ExpandoTree,
        Self::HeatTiles,
        Self::Histogram,
        Self::LineGraph,
        Self::NumberTrend,
        Self::Table,
    ];

    /// snake_case name, also the default endpoint suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BarGraph => "bar_graph",
            Self::BoxPlot => "box_plot",
            Self::BubbleChart => "bubble_chart",
            Self::BumpChart => "bump_chart",
            Self::ExpandoTree => "expando_tree",
            Self::HeatTiles => "heat_tiles",
            Self::Histogram => "histogram",
            Self::LineGraph => "line_graph",
            Self::NumberTrend => "number_trend",
            Self::Table => "table",
        }
    }

    /// Whether results of this type are plotted over time
    pub fn is_time_series(&self) -> bool {
        matches!(self, Self::LineGraph | Self::BumpChart)
    }
}

impl fmt::Display for VisualizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when parsing a visualization type string
#[derive(Debug, Clone)]
pub struct ParseVisualizationTypeError {
    pub input: String,
}

impl fmt::Display for ParseVisualizationTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown visualization type: '{}'", self.input)
    }
}

impl std::error::Error for ParseVisualizationTypeError {}

impl FromStr for VisualizationType {
    type Err = ParseVisualizationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| ParseVisualizationTypeError { input: s.to_string() })
    }
}
