//! Chart rendering for distance data
//!
//! Maps a [`ChartRequest`] onto the plotting library and returns a PNG image
//! encoded as base64. Five chart kinds are supported:
//!
//! - **scatter**: points on the plane, optionally colored by a parallel
//!   distance array, labeled `P0`, `P1`, ...
//! - **heatmap**: a distance matrix as a color-graded, annotated grid
//! - **network**: points as nodes, joined when their distance in the
//!   supplied matrix is at or below a threshold
//! - **histogram**: distribution of all strictly positive distances with
//!   mean and median reference lines
//! - **line**: a distance sequence, optionally labeled
//!
//! Request validation happens in [`ChartData::from_request`], before any
//! drawing context exists. Styling is resolved per call into a
//! [`theme::Theme`].

pub mod canvas;
mod draw;
pub mod theme;

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ChartSettings;
use crate::metadata::{new_id, timestamp_now};
use theme::Theme;

/// Errors raised while building a chart
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Unsupported chart type: {0}")]
    UnsupportedChartKind(String),

    #[error("{0}")]
    MissingData(String),

    #[error("Chart rendering failed: {0}")]
    Render(String),
}

/// Supported chart kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Scatter,
    Heatmap,
    Network,
    Histogram,
    Line,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Scatter,
        ChartKind::Heatmap,
        ChartKind::Network,
        ChartKind::Histogram,
        ChartKind::Line,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Network => "network",
            ChartKind::Histogram => "histogram",
            ChartKind::Line => "line",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ChartError::UnsupportedChartKind(s.to_string()))
    }
}

/// Named color schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStyle {
    #[default]
    Default,
    Seaborn,
    Ggplot,
    DarkBackground,
}

impl ChartStyle {
    pub const ALL: [ChartStyle; 4] = [
        ChartStyle::Default,
        ChartStyle::Seaborn,
        ChartStyle::Ggplot,
        ChartStyle::DarkBackground,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartStyle::Default => "default",
            ChartStyle::Seaborn => "seaborn",
            ChartStyle::Ggplot => "ggplot",
            ChartStyle::DarkBackground => "dark_background",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ChartStyle::ALL.into_iter().find(|s| s.name() == name)
    }

    /// The named scheme, or the default one for names it does not know
    pub fn resolve(name: &str) -> Self {
        Self::from_name(name).unwrap_or_default()
    }
}

impl fmt::Display for ChartStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Distances as sent by clients: a flat sequence or a matrix
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DistanceInput {
    Flat(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl DistanceInput {
    /// All values in row-major order
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            DistanceInput::Flat(values) => values.clone(),
            DistanceInput::Matrix(rows) => rows.iter().flatten().copied().collect(),
        }
    }

    pub fn as_flat(&self) -> Option<&[f64]> {
        match self {
            DistanceInput::Flat(values) => Some(values),
            DistanceInput::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<f64>]> {
        match self {
            DistanceInput::Flat(_) => None,
            DistanceInput::Matrix(rows) => Some(rows),
        }
    }
}

/// Chart request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChartRequest {
    #[serde(default)]
    pub points: Vec<Vec<f64>>,

    #[serde(default)]
    pub distances: Option<DistanceInput>,

    /// Explicit matrix for heatmaps; takes precedence over `distances`
    #[serde(default)]
    pub distance_matrix: Option<Vec<Vec<f64>>>,

    /// X tick labels for line charts
    #[serde(default)]
    pub labels: Vec<String>,

    /// Overrides the configured network edge threshold
    #[serde(default)]
    pub connection_threshold: Option<f64>,

    #[serde(default = "default_chart_type")]
    pub chart_type: String,

    #[serde(default = "default_style")]
    pub style: String,
}

fn default_chart_type() -> String {
    ChartKind::default().name().to_string()
}

fn default_style() -> String {
    ChartStyle::default().name().to_string()
}

impl Default for ChartRequest {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            distances: None,
            distance_matrix: None,
            labels: Vec::new(),
            connection_threshold: None,
            chart_type: default_chart_type(),
            style: default_style(),
        }
    }
}

/// A value sequence with optional per-value labels
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub values: Vec<f64>,
    pub labels: Option<Vec<String>>,
}

/// Validated input for one chart
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Scatter {
        points: Vec<(f64, f64)>,
        values: Option<Vec<f64>>,
    },
    Heatmap {
        matrix: Vec<Vec<f64>>,
    },
    Network {
        nodes: Vec<(f64, f64)>,
        edges: Vec<(usize, usize)>,
        threshold: f64,
    },
    Histogram {
        values: Vec<f64>,
        bins: usize,
    },
    Line(Series),
}

impl ChartData {
    /// Extract what `kind` needs from the request, or report what is missing
    pub fn from_request(
        kind: ChartKind,
        request: &ChartRequest,
        settings: &ChartSettings,
    ) -> Result<Self, ChartError> {
        match kind {
            ChartKind::Scatter => {
                let points = plane_points(&request.points, kind)?;
                let values = request
                    .distances
                    .as_ref()
                    .and_then(DistanceInput::as_flat)
                    .filter(|values| values.len() == points.len())
                    .map(<[f64]>::to_vec);
                Ok(ChartData::Scatter { points, values })
            }
            ChartKind::Heatmap => {
                let matrix = request
                    .distance_matrix
                    .as_deref()
                    .or_else(|| request.distances.as_ref().and_then(DistanceInput::as_matrix))
                    .filter(|rows| rows.iter().any(|row| !row.is_empty()))
                    .ok_or_else(|| ChartError::MissingData("Distance matrix required for heatmap".to_string()))?;
                Ok(ChartData::Heatmap {
                    matrix: matrix.to_vec(),
                })
            }
            ChartKind::Network => {
                let nodes = plane_points(&request.points, kind)?;
                let threshold = request
                    .connection_threshold
                    .unwrap_or(settings.connection_threshold);
                let edges = request
                    .distances
                    .as_ref()
                    .and_then(DistanceInput::as_matrix)
                    .map(|matrix| network_edges(matrix, nodes.len(), threshold))
                    .unwrap_or_default();
                Ok(ChartData::Network {
                    nodes,
                    edges,
                    threshold,
                })
            }
            ChartKind::Histogram => {
                let values = request
                    .distances
                    .as_ref()
                    .map(positive_values)
                    .filter(|values| !values.is_empty())
                    .ok_or_else(|| {
                        ChartError::MissingData("Distance data required for histogram".to_string())
                    })?;
                Ok(ChartData::Histogram {
                    values,
                    bins: settings.histogram_bins.max(1),
                })
            }
            ChartKind::Line => {
                let values = request
                    .distances
                    .as_ref()
                    .map(DistanceInput::flatten)
                    .filter(|values| !values.is_empty())
                    .ok_or_else(|| ChartError::MissingData("Distance data required for line plot".to_string()))?;
                let labels = (request.labels.len() == values.len()).then(|| request.labels.clone());
                Ok(ChartData::Line(Series { values, labels }))
            }
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartData::Scatter { .. } => ChartKind::Scatter,
            ChartData::Heatmap { .. } => ChartKind::Heatmap,
            ChartData::Network { .. } => ChartKind::Network,
            ChartData::Histogram { .. } => ChartKind::Histogram,
            ChartData::Line(_) => ChartKind::Line,
        }
    }

    /// Paint onto a fresh canvas and return PNG bytes
    pub fn render(&self, theme: &Theme, width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
        canvas::render_png(width, height, |root| match self {
            ChartData::Scatter { points, values } => draw::scatter(root, theme, points, values.as_deref()),
            ChartData::Heatmap { matrix } => draw::heatmap(root, theme, matrix),
            ChartData::Network {
                nodes,
                edges,
                threshold,
            } => draw::network(root, theme, nodes, edges, *threshold),
            ChartData::Histogram { values, bins } => draw::histogram(root, theme, values, *bins),
            ChartData::Line(series) => draw::line(root, theme, series),
        })
    }
}

/// Project points onto the plane: first two coordinates, 1-D points at y = 0
fn plane_points(points: &[Vec<f64>], kind: ChartKind) -> Result<Vec<(f64, f64)>, ChartError> {
    if points.is_empty() {
        return Err(ChartError::MissingData(format!(
            "Points data required for {} plot",
            kind
        )));
    }

    points
        .iter()
        .enumerate()
        .map(|(i, point)| match point.as_slice() {
            [] => Err(ChartError::MissingData(format!("Point {} has no coordinates", i))),
            [x] => Ok((*x, 0.0)),
            [x, y, ..] => Ok((*x, *y)),
        })
        .collect()
}

/// Pairs `i < j` among the first `count` points whose matrix entry is within `threshold`
///
/// Entries missing from a short or ragged matrix never produce an edge.
pub fn network_edges(matrix: &[Vec<f64>], count: usize, threshold: f64) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|i| (i + 1..count).map(move |j| (i, j)))
        .filter(|&(i, j)| {
            matrix
                .get(i)
                .and_then(|row| row.get(j))
                .is_some_and(|&d| d <= threshold)
        })
        .collect()
}

/// Strictly positive values, flattened row-major
pub fn positive_values(input: &DistanceInput) -> Vec<f64> {
    input.flatten().into_iter().filter(|&d| d > 0.0).collect()
}

pub(crate) fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Equal-width histogram bins spanning the data
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBins {
    pub start: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl HistogramBins {
    pub fn new(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (start, width) = match min_max(values.iter().copied()) {
            // Divided first so the span of extreme values cannot overflow
            Some((lo, hi)) if hi > lo => (lo, hi / bins as f64 - lo / bins as f64),
            // A single distinct value gets a unit-wide range centered on it
            Some((lo, _)) => (lo - 0.5, 1.0 / bins as f64),
            None => (0.0, 1.0 / bins as f64),
        };

        let mut counts = vec![0usize; bins];
        for &v in values {
            let index = ((v - start) / width).floor().max(0.0) as usize;
            counts[index.min(bins - 1)] += 1;
        }

        Self {
            start,
            width,
            counts,
        }
    }
}

/// Encoded image part of a chart response
#[derive(Debug, Clone, Serialize)]
pub struct ChartImage {
    pub image_base64: String,
    pub format: &'static str,
    pub encoding: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartMetadata {
    pub timestamp: String,
    pub visualization_id: String,
}

/// Response body for a rendered chart
#[derive(Debug, Clone, Serialize)]
pub struct ChartResponse {
    pub chart_type: ChartKind,
    /// The requested style name, echoed even when it fell back to the default scheme
    pub style: String,
    pub chart_data: ChartImage,
    pub metadata: ChartMetadata,
}

/// Render a chart with the default canvas settings
pub fn render_chart(request: &ChartRequest) -> Result<ChartResponse, ChartError> {
    render_chart_with_settings(request, &ChartSettings::default())
}

/// Render a chart with custom canvas settings
pub fn render_chart_with_settings(
    request: &ChartRequest,
    settings: &ChartSettings,
) -> Result<ChartResponse, ChartError> {
    let kind: ChartKind = request.chart_type.parse()?;
    let style = ChartStyle::resolve(&request.style);
    let data = ChartData::from_request(kind, request, settings)?;

    let png = data.render(&Theme::for_style(style), settings.width, settings.height)?;
    debug!(%kind, %style, requested = %request.style, bytes = png.len(), "rendered chart");

    Ok(ChartResponse {
        chart_type: kind,
        style: request.style.clone(),
        chart_data: ChartImage {
            image_base64: BASE64.encode(&png),
            format: "png",
            encoding: "base64",
        },
        metadata: ChartMetadata {
            timestamp: timestamp_now(),
            visualization_id: new_id(),
        },
    })
}
