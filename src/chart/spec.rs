//! Declarative chart descriptions handed to the rendering layer.
//!
//! Everything here is plain data and serializes to JSON, so a page can be
//! exported and inspected without a window.

use serde::Serialize;

use crate::data::stats::{BoxSummary, HistogramBin};

/// How tick labels are laid out on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    /// Values are days since 1970-01-01, labelled as calendar dates.
    Date,
    /// One tick per integer step.
    Linear,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub kind: AxisKind,
}

impl Axis {
    pub fn new(title: impl Into<String>, kind: AxisKind) -> Self {
        Self {
            title: title.into(),
            kind,
        }
    }
}

/// A named series of `[x, y]` points. A non-finite `y` marks a missing
/// observation; line renderers leave a gap there (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub color: String,
    pub points: Vec<[f64; 2]>,
}

impl Series {
    /// Maximal runs of consecutive finite points.
    pub fn segments(&self) -> impl Iterator<Item = &[[f64; 2]]> {
        self.points
            .split(|p| !p[1].is_finite())
            .filter(|run| !run.is_empty())
    }
}

/// One box of a box plot, positioned at `position` on the x axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxEntry {
    pub label: String,
    pub position: f64,
    pub summary: BoxSummary,
}

/// A scatter marker with its own colour and radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub name: String,
    pub title: String,
    pub min: f64,
    pub max: f64,
}

/// One cell of a scatter matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairCell {
    Histogram { column: String, bins: Vec<HistogramBin> },
    Scatter { x: String, y: String, points: Vec<[f64; 2]> },
}

/// A single chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSpec {
    Line {
        x_axis: Axis,
        y_axis: Axis,
        legend_title: Option<String>,
        series: Vec<Series>,
    },
    Bar {
        x_axis: Axis,
        y_axis: Axis,
        /// Bar width in x units.
        bar_width: f64,
        series: Series,
    },
    Box {
        x_axis: Axis,
        y_axis: Axis,
        color: String,
        boxes: Vec<BoxEntry>,
    },
    Scatter {
        x_axis: Axis,
        y_axis: Axis,
        color_scale: Option<ColorScale>,
        /// Column driving the marker radius, if any.
        size_by: Option<String>,
        markers: Vec<Marker>,
    },
    Heatmap {
        labels: Vec<String>,
        /// Row-major; `None` renders as a blank cell.
        values: Vec<Vec<Option<f64>>>,
        color_scale: ColorScale,
        /// `format!` precision for the annotations.
        decimals: usize,
    },
    PairGrid {
        columns: Vec<String>,
        marker_color: String,
        /// Row-major, `columns.len()²` cells.
        cells: Vec<PairCell>,
    },
}

impl ChartSpec {
    /// Table columns this chart reads from.
    pub fn columns(&self) -> Vec<String> {
        match self {
            ChartSpec::Line { x_axis, series, .. } => std::iter::once(x_axis.title.clone())
                .chain(series.iter().map(|s| s.name.clone()))
                .collect(),
            ChartSpec::Bar { x_axis, y_axis, .. } | ChartSpec::Box { x_axis, y_axis, .. } => {
                vec![x_axis.title.clone(), y_axis.title.clone()]
            }
            ChartSpec::Scatter {
                x_axis,
                y_axis,
                color_scale,
                size_by,
                ..
            } => [
                Some(&x_axis.title),
                Some(&y_axis.title),
                color_scale.as_ref().map(|c| &c.title),
                size_by.as_ref(),
            ]
            .into_iter()
            .flatten()
            .cloned()
            .collect(),
            ChartSpec::Heatmap { labels, .. } => labels.clone(),
            ChartSpec::PairGrid { columns, .. } => columns.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Page output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SectionBody {
    Chart(ChartSpec),
    /// Informational message shown instead of a chart.
    Notice(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub subheader: Option<String>,
    pub body: SectionBody,
}

impl Section {
    pub fn chart(chart: ChartSpec) -> Self {
        Self {
            subheader: None,
            body: SectionBody::Chart(chart),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            subheader: None,
            body: SectionBody::Notice(message.into()),
        }
    }

    pub fn with_subheader(mut self, subheader: impl Into<String>) -> Self {
        self.subheader = Some(subheader.into());
        self
    }
}

/// Introductory text shown above the sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intro {
    pub paragraph: String,
    pub bullets: Vec<String>,
    pub footer: String,
}

/// Everything the central panel shows for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub title: String,
    pub intro: Option<Intro>,
    pub sections: Vec<Section>,
}

impl PageView {
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.sections.iter().filter_map(|s| match &s.body {
            SectionBody::Chart(c) => Some(c),
            SectionBody::Notice(_) => None,
        })
    }

    #[cfg(test)]
    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().filter_map(|s| match &s.body {
            SectionBody::Notice(msg) => Some(msg.as_str()),
            SectionBody::Chart(_) => None,
        })
    }
}
