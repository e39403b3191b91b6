use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::spec::{
    Axis, AxisKind, BoxEntry, ChartSpec, ColorScale, Intro, Marker, PageView, PairCell, Section,
    Series,
};
use crate::color;
use crate::data::model::{HousingRecord, HousingTable, Metric, DATE_COLUMN, MONTH_COLUMN, YEAR_COLUMN};
use crate::data::stats;

/// Metrics pre-selected on the scatter matrix page.
pub const DEFAULT_SCATTER_SELECTION: [Metric; 3] =
    [Metric::HomePriceIndex, Metric::MortgageRate, Metric::Cpi];

pub const SCATTER_SELECTION_NOTICE: &str = "Please select at least 2 variables.";

const MONTHLY_TREND_METRICS: [Metric; 3] =
    [Metric::HomePriceIndex, Metric::MortgageRate, Metric::Cpi];

/// Bar width on date axes, in days.
const MONTHLY_BAR_WIDTH: f64 = 25.0;
const PAIR_HISTOGRAM_BINS: usize = 20;
const MAX_MARKER_RADIUS: f32 = 10.0;
const MIN_MARKER_RADIUS: f32 = 1.0;

// ---------------------------------------------------------------------------
// Page enumeration
// ---------------------------------------------------------------------------

/// The sidebar navigation entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Page {
    #[default]
    Home,
    HousingVsMortgage,
    CpiVsUnemployment,
    IncomeAndGdp,
    HousingStarts,
    CorrelationHeatmap,
    ScatterMatrix,
    MonthlyTrends,
    YearlyBoxplot,
    GdpVsHousing,
}

impl Page {
    /// Sidebar order.
    pub const ALL: [Page; 10] = [
        Page::Home,
        Page::HousingVsMortgage,
        Page::CpiVsUnemployment,
        Page::IncomeAndGdp,
        Page::HousingStarts,
        Page::CorrelationHeatmap,
        Page::ScatterMatrix,
        Page::MonthlyTrends,
        Page::YearlyBoxplot,
        Page::GdpVsHousing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::HousingVsMortgage => "Housing vs Mortgage",
            Page::CpiVsUnemployment => "CPI vs Unemployment",
            Page::IncomeAndGdp => "Income and GDP",
            Page::HousingStarts => "Housing Starts",
            Page::CorrelationHeatmap => "Correlation Heatmap",
            Page::ScatterMatrix => "Scatter Matrix",
            Page::MonthlyTrends => "Monthly Trends",
            Page::YearlyBoxplot => "Yearly Boxplot",
            Page::GdpVsHousing => "GDP vs Housing",
        }
    }

    pub fn from_label(label: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.label() == label)
    }

    /// Build the view for this page.
    pub fn build(self, ctx: &PageContext<'_>) -> PageView {
        match self {
            Page::Home => home(ctx),
            Page::HousingVsMortgage => pair_page(
                "Housing Price Index vs Mortgage Rate",
                ctx,
                [Metric::HomePriceIndex, Metric::MortgageRate],
            ),
            Page::CpiVsUnemployment => pair_page(
                "CPI and Unemployment Rate",
                ctx,
                [Metric::Cpi, Metric::UnemploymentRate],
            ),
            Page::IncomeAndGdp => pair_page(
                "Median Income and Real GDP",
                ctx,
                [Metric::MedianIncome, Metric::RealGdp],
            ),
            Page::HousingStarts => housing_starts(ctx),
            Page::CorrelationHeatmap => correlation_heatmap(ctx),
            Page::ScatterMatrix => scatter_matrix(ctx),
            Page::MonthlyTrends => monthly_trends(ctx),
            Page::YearlyBoxplot => yearly_boxplot(ctx),
            Page::GdpVsHousing => gdp_vs_housing(ctx),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs shared by all page builders.
pub struct PageContext<'a> {
    /// The full, unfiltered table.
    pub table: &'a HousingTable,
    /// Rows inside the selected year range.
    pub rows: &'a [&'a HousingRecord],
    /// Variables picked on the scatter matrix page.
    pub scatter_selection: &'a [Metric],
}

// ---------------------------------------------------------------------------
// Chart builders
// ---------------------------------------------------------------------------

/// Multi-series line chart of `metrics` over the observation date.
/// Missing values stay in the series so the line breaks there.
fn date_lines(rows: &[&HousingRecord], metrics: &[Metric]) -> ChartSpec {
    let series = metrics
        .iter()
        .map(|&m| Series {
            name: m.column().to_string(),
            color: color::series_color(m).to_string(),
            points: rows.iter().map(|r| [r.date_ordinal(), r.value(m)]).collect(),
        })
        .collect();

    ChartSpec::Line {
        x_axis: Axis::new(DATE_COLUMN, AxisKind::Date),
        y_axis: Axis::new("value", AxisKind::Auto),
        legend_title: Some("variable".to_string()),
        series,
    }
}

fn home(ctx: &PageContext<'_>) -> PageView {
    let intro = Intro {
        paragraph: "Welcome to HOME.LLC, an interactive data science dashboard exploring the key \
                    factors that have influenced US home prices nationally over the past 20 years."
            .to_string(),
        bullets: vec![
            "Home Price Index vs Mortgage Rate".to_string(),
            "Consumer Price Index (CPI) vs Unemployment Rate".to_string(),
            "Median Household Income and Real GDP".to_string(),
            "Monthly Housing Starts".to_string(),
        ],
        footer: "Use the sidebar navigation to explore different analyses and visualizations!"
            .to_string(),
    };

    PageView {
        title: "HOME.LLC: US Housing and Economic Analysis Dashboard".to_string(),
        intro: Some(intro),
        sections: vec![
            Section::chart(date_lines(ctx.rows, &[Metric::HomePriceIndex, Metric::MortgageRate]))
                .with_subheader("Home Price Index vs Mortgage Rate"),
            Section::chart(date_lines(ctx.rows, &[Metric::Cpi, Metric::UnemploymentRate]))
                .with_subheader("CPI and Unemployment Rate"),
        ],
    }
}

fn pair_page(title: &str, ctx: &PageContext<'_>, metrics: [Metric; 2]) -> PageView {
    PageView {
        title: title.to_string(),
        intro: None,
        sections: vec![Section::chart(date_lines(ctx.rows, &metrics))],
    }
}

fn housing_starts(ctx: &PageContext<'_>) -> PageView {
    let metric = Metric::HousingStarts;
    let series = Series {
        name: metric.column().to_string(),
        color: color::series_color(metric).to_string(),
        points: ctx
            .rows
            .iter()
            .filter(|r| r.housing_starts.is_finite())
            .map(|r| [r.date_ordinal(), r.housing_starts])
            .collect(),
    };

    PageView {
        title: "Monthly Housing Starts".to_string(),
        intro: None,
        sections: vec![Section::chart(ChartSpec::Bar {
            x_axis: Axis::new(DATE_COLUMN, AxisKind::Date),
            y_axis: Axis::new(metric.column(), AxisKind::Auto),
            bar_width: MONTHLY_BAR_WIDTH,
            series,
        })],
    }
}

fn correlation_heatmap(ctx: &PageContext<'_>) -> PageView {
    let matrix = stats::correlation_matrix(ctx.rows, &Metric::ALL);

    PageView {
        title: "Correlation Heatmap".to_string(),
        intro: None,
        sections: vec![Section::chart(ChartSpec::Heatmap {
            labels: matrix.metrics.iter().map(|m| m.column().to_string()).collect(),
            values: matrix.values,
            color_scale: ColorScale {
                name: "coolwarm".to_string(),
                title: "correlation".to_string(),
                min: -1.0,
                max: 1.0,
            },
            decimals: 2,
        })],
    }
}

fn scatter_matrix(ctx: &PageContext<'_>) -> PageView {
    let title = "Pairwise Scatter Plot Matrix".to_string();
    let selected = ctx.scatter_selection;

    if selected.len() < 2 {
        return PageView {
            title,
            intro: None,
            sections: vec![Section::notice(SCATTER_SELECTION_NOTICE)],
        };
    }

    let columns: Vec<Vec<f64>> = selected
        .iter()
        .map(|&m| ctx.rows.iter().map(|r| r.value(m)).collect())
        .collect();

    let mut cells = Vec::with_capacity(selected.len() * selected.len());
    for (i, &row_metric) in selected.iter().enumerate() {
        for (j, &col_metric) in selected.iter().enumerate() {
            let cell = if i == j {
                PairCell::Histogram {
                    column: row_metric.column().to_string(),
                    bins: stats::histogram(&columns[i], PAIR_HISTOGRAM_BINS),
                }
            } else {
                PairCell::Scatter {
                    x: col_metric.column().to_string(),
                    y: row_metric.column().to_string(),
                    points: columns[j]
                        .iter()
                        .zip(&columns[i])
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .map(|(&x, &y)| [x, y])
                        .collect(),
                }
            };
            cells.push(cell);
        }
    }

    PageView {
        title,
        intro: None,
        sections: vec![Section::chart(ChartSpec::PairGrid {
            columns: selected.iter().map(|m| m.column().to_string()).collect(),
            marker_color: color::PAIR_MARKER.to_string(),
            cells,
        })],
    }
}

/// Uses the whole table regardless of the year range.
fn monthly_trends(ctx: &PageContext<'_>) -> PageView {
    let monthly = stats::monthly_means(ctx.table.records(), &MONTHLY_TREND_METRICS);

    let series = MONTHLY_TREND_METRICS
        .iter()
        .enumerate()
        .map(|(k, &m)| Series {
            name: m.column().to_string(),
            color: color::series_color(m).to_string(),
            points: monthly
                .iter()
                .filter_map(|mm| mm.means[k].map(|v| [mm.month as f64, v]))
                .collect(),
        })
        .collect();

    PageView {
        title: "Monthly Average Trends Over Time".to_string(),
        intro: None,
        sections: vec![Section::chart(ChartSpec::Line {
            x_axis: Axis::new(MONTH_COLUMN, AxisKind::Linear),
            y_axis: Axis::new("value", AxisKind::Auto),
            legend_title: Some("Metric".to_string()),
            series,
        })],
    }
}

fn yearly_boxplot(ctx: &PageContext<'_>) -> PageView {
    let metric = Metric::HomePriceIndex;
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for rec in ctx.rows {
        by_year.entry(rec.year).or_default().push(rec.value(metric));
    }

    let boxes = by_year
        .into_iter()
        .filter_map(|(year, values)| {
            Some(BoxEntry {
                label: year.to_string(),
                position: year as f64,
                summary: stats::box_summary(values)?,
            })
        })
        .collect();

    PageView {
        title: "Yearly Distribution of Home Price Index".to_string(),
        intro: None,
        sections: vec![Section::chart(ChartSpec::Box {
            x_axis: Axis::new(YEAR_COLUMN, AxisKind::Linear),
            y_axis: Axis::new(metric.column(), AxisKind::Auto),
            color: color::BOX_FILL.to_string(),
            boxes,
        })],
    }
}

/// Real GDP against housing starts, coloured by year and sized by home prices.
fn gdp_vs_housing(ctx: &PageContext<'_>) -> PageView {
    let rows: Vec<&HousingRecord> = ctx
        .rows
        .iter()
        .copied()
        .filter(|r| r.real_gdp.is_finite() && r.housing_starts.is_finite())
        .collect();

    let min_year = rows.iter().map(|r| r.year).min().unwrap_or_default();
    let max_year = rows.iter().map(|r| r.year).max().unwrap_or_default();
    let span = (max_year - min_year) as f64;
    let max_size = rows
        .iter()
        .map(|r| r.home_price_index)
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(0.0, f64::max);

    let markers = rows
        .iter()
        .map(|r| {
            let t = if span > 0.0 {
                (r.year - min_year) as f64 / span
            } else {
                0.0
            };
            // Area-proportional sizing, as plotly's `sizemode="area"`.
            let radius = if max_size > 0.0 && r.home_price_index.is_finite() {
                let share = (r.home_price_index.max(0.0) / max_size).sqrt() as f32;
                (share * MAX_MARKER_RADIUS).max(MIN_MARKER_RADIUS)
            } else {
                MIN_MARKER_RADIUS
            };
            Marker {
                x: r.real_gdp,
                y: r.housing_starts,
                color: color::viridis(t),
                radius,
            }
        })
        .collect();

    PageView {
        title: "Real GDP vs Housing Starts".to_string(),
        intro: None,
        sections: vec![Section::chart(ChartSpec::Scatter {
            x_axis: Axis::new(Metric::RealGdp.column(), AxisKind::Auto),
            y_axis: Axis::new(Metric::HousingStarts.column(), AxisKind::Auto),
            color_scale: Some(ColorScale {
                name: "viridis".to_string(),
                title: YEAR_COLUMN.to_string(),
                min: min_year as f64,
                max: max_year as f64,
            }),
            size_by: Some(Metric::HomePriceIndex.column().to_string()),
            markers,
        })],
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::chart::spec::SectionBody;
    use crate::data::filter::{filter_records, YearRange};

    /// Monthly rows for 2004–2024 with smoothly varying metrics.
    fn sample_table() -> HousingTable {
        let mut records = Vec::new();
        for year in 2004..=2024 {
            for month in 1..=12 {
                let t = (year - 2004) as f64 * 12.0 + month as f64;
                let mut rec = HousingRecord::new(NaiveDate::from_ymd_opt(year, month, 1).unwrap());
                rec.home_price_index = 140.0 + t * 0.5 + (month as f64).sin();
                rec.mortgage_rate = 6.0 - t * 0.01 + (t / 7.0).cos();
                rec.cpi = 185.0 + t * 0.4;
                rec.unemployment_rate = 5.0 + (t / 20.0).sin() * 2.0;
                rec.median_income = 44000.0 + t * 40.0;
                rec.housing_starts = 1500.0 + (t / 9.0).sin() * 400.0;
                rec.real_gdp = 14000.0 + t * 25.0;
                records.push(rec);
            }
        }
        HousingTable::from_records(records)
    }

    fn build(page: Page, table: &HousingTable, range: YearRange, selection: &[Metric]) -> PageView {
        let rows = filter_records(table.records(), range);
        let ctx = PageContext {
            table,
            rows: &rows,
            scatter_selection: selection,
        };
        page.build(&ctx)
    }

    #[test]
    fn labels_round_trip_in_sidebar_order() {
        let labels: Vec<&str> = Page::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels[0], "Home");
        assert_eq!(labels[9], "GDP vs Housing");
        for page in Page::ALL {
            assert_eq!(Page::from_label(page.label()), Some(page));
        }
        assert_eq!(Page::from_label("Settings"), None);
    }

    #[test]
    fn every_page_references_only_table_columns() {
        let table = sample_table();
        let range = YearRange::new(2010, 2015);
        for page in Page::ALL {
            let view = build(page, &table, range, &DEFAULT_SCATTER_SELECTION);
            assert!(!view.title.is_empty());
            assert!(view.charts().count() >= 1, "{page} produced no chart");
            for chart in view.charts() {
                for col in chart.columns() {
                    assert!(table.has_column(&col), "{page} references unknown column {col}");
                }
            }
        }
    }

    #[test]
    fn home_has_two_subheaded_line_charts() {
        let table = sample_table();
        let view = build(Page::Home, &table, YearRange::new(2004, 2024), &[]);
        assert!(view.intro.is_some());
        assert_eq!(view.sections.len(), 2);
        let names: Vec<Vec<String>> = view
            .charts()
            .map(|c| match c {
                ChartSpec::Line { series, .. } => series.iter().map(|s| s.name.clone()).collect(),
                other => panic!("unexpected chart {other:?}"),
            })
            .collect();
        assert_eq!(names[0], ["Home_Price_Index", "Mortgage_Rate"]);
        assert_eq!(names[1], ["CPI", "Unemployment_Rate"]);
        assert!(view.sections.iter().all(|s| s.subheader.is_some()));
    }

    #[test]
    fn pair_pages_use_fixed_colours() {
        let table = sample_table();
        let view = build(Page::IncomeAndGdp, &table, YearRange::new(2004, 2024), &[]);
        let Some(ChartSpec::Line { series, x_axis, .. }) = view.charts().next() else {
            panic!("expected a line chart");
        };
        assert_eq!(x_axis.kind, AxisKind::Date);
        assert_eq!(series[0].color, "purple");
        assert_eq!(series[1].color, "teal");
        assert_eq!(series[0].points.len(), table.len());
    }

    #[test]
    fn filtered_range_scenario_counts_rows() {
        let table = sample_table();
        let view = build(Page::HousingStarts, &table, YearRange::new(2010, 2015), &[]);
        let expected = table
            .records()
            .iter()
            .filter(|r| (2010..=2015).contains(&r.year))
            .count();
        let Some(ChartSpec::Bar { series, .. }) = view.charts().next() else {
            panic!("expected a bar chart");
        };
        assert_eq!(series.points.len(), expected);
        assert_eq!(series.color, "brown");
    }

    #[test]
    fn heatmap_is_symmetric_with_unit_diagonal() {
        let table = sample_table();
        let view = build(Page::CorrelationHeatmap, &table, YearRange::new(2008, 2012), &[]);
        let Some(ChartSpec::Heatmap { labels, values, .. }) = view.charts().next() else {
            panic!("expected a heatmap");
        };
        assert_eq!(labels.len(), 7);
        assert!(!labels.iter().any(|l| l == "Year" || l == "Month" || l == "Day"));
        for i in 0..labels.len() {
            assert_eq!(values[i][i], Some(1.0));
            for j in 0..labels.len() {
                assert_eq!(values[i][j], values[j][i]);
            }
        }
    }

    #[test]
    fn scatter_matrix_needs_two_variables() {
        let table = sample_table();
        let view = build(
            Page::ScatterMatrix,
            &table,
            YearRange::new(2004, 2024),
            &[Metric::Cpi],
        );
        assert_eq!(view.charts().count(), 0);
        assert_eq!(view.notices().collect::<Vec<_>>(), [SCATTER_SELECTION_NOTICE]);
    }

    #[test]
    fn scatter_matrix_builds_square_grid() {
        let table = sample_table();
        let view = build(
            Page::ScatterMatrix,
            &table,
            YearRange::new(2004, 2024),
            &DEFAULT_SCATTER_SELECTION,
        );
        let Some(ChartSpec::PairGrid { columns, cells, .. }) = view.charts().next() else {
            panic!("expected a pair grid");
        };
        assert_eq!(columns.len(), 3);
        assert_eq!(cells.len(), 9);
        assert!(matches!(cells[0], PairCell::Histogram { .. }));
        assert!(matches!(cells[4], PairCell::Histogram { .. }));
        match &cells[1] {
            PairCell::Scatter { x, y, points } => {
                assert_eq!(x, "Mortgage_Rate");
                assert_eq!(y, "Home_Price_Index");
                assert_eq!(points.len(), table.len());
            }
            other => panic!("unexpected cell {other:?}"),
        }
    }

    #[test]
    fn monthly_trends_ignore_year_range() {
        let table = sample_table();
        let narrow = build(Page::MonthlyTrends, &table, YearRange::new(2010, 2010), &[]);
        let wide = build(Page::MonthlyTrends, &table, YearRange::new(2004, 2024), &[]);
        assert_eq!(narrow, wide);

        let Some(ChartSpec::Line {
            x_axis,
            legend_title,
            series,
            ..
        }) = wide.charts().next()
        else {
            panic!("expected a line chart");
        };
        assert_eq!(x_axis.kind, AxisKind::Linear);
        assert_eq!(legend_title.as_deref(), Some("Metric"));
        assert_eq!(series.len(), 3);
        let months: Vec<f64> = series[0].points.iter().map(|p| p[0]).collect();
        assert_eq!(months, (1..=12).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn yearly_boxplot_has_one_box_per_year() {
        let table = sample_table();
        let view = build(Page::YearlyBoxplot, &table, YearRange::new(2010, 2015), &[]);
        let Some(ChartSpec::Box { boxes, color, .. }) = view.charts().next() else {
            panic!("expected a box plot");
        };
        assert_eq!(color, "skyblue");
        let labels: Vec<&str> = boxes.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["2010", "2011", "2012", "2013", "2014", "2015"]);
    }

    #[test]
    fn gdp_scatter_colours_by_year_and_sizes_by_price() {
        let table = sample_table();
        let view = build(Page::GdpVsHousing, &table, YearRange::new(2010, 2015), &[]);
        let Some(ChartSpec::Scatter {
            markers,
            color_scale: Some(scale),
            ..
        }) = view.charts().next()
        else {
            panic!("expected a scatter chart");
        };
        assert_eq!((scale.min, scale.max), (2010.0, 2015.0));
        assert_eq!(markers.first().unwrap().color, color::viridis(0.0));
        assert_eq!(markers.last().unwrap().color, color::viridis(1.0));
        let largest = markers.iter().map(|m| m.radius).fold(0.0, f32::max);
        assert!((largest - MAX_MARKER_RADIUS).abs() < 1e-4);
        assert!(markers.iter().all(|m| m.radius >= MIN_MARKER_RADIUS));
    }

    #[test]
    fn empty_range_renders_empty_charts() {
        let table = sample_table();
        for page in Page::ALL {
            let view = build(page, &table, YearRange::new(1990, 1995), &DEFAULT_SCATTER_SELECTION);
            assert!(!view.sections.is_empty());
            if let Some(SectionBody::Chart(ChartSpec::Line { series, .. })) =
                view.sections.first().map(|s| &s.body)
            {
                if page != Page::MonthlyTrends {
                    assert!(series.iter().all(|s| s.points.is_empty()));
                }
            }
        }
    }

    #[test]
    fn missing_months_break_the_line() {
        let mut table = sample_table();
        let records: Vec<HousingRecord> = table
            .records()
            .iter()
            .cloned()
            .map(|mut r| {
                if r.year == 2010 && (4..=6).contains(&r.month) {
                    r.mortgage_rate = f64::NAN;
                }
                r
            })
            .collect();
        table = HousingTable::from_records(records);

        let view = build(Page::HousingVsMortgage, &table, YearRange::new(2009, 2011), &[]);
        let Some(ChartSpec::Line { series, .. }) = view.charts().next() else {
            panic!("expected a line chart");
        };
        assert_eq!(series[0].segments().count(), 1);

        let mortgage = &series[1];
        assert_eq!(mortgage.points.len(), 36);
        let runs: Vec<usize> = mortgage.segments().map(|run| run.len()).collect();
        assert_eq!(runs, [15, 18]);

        let json = serde_json::to_value(&view).unwrap();
        let points = &json["sections"][0]["body"]["value"]["series"][1]["points"];
        assert!(points[15][1].is_null());
    }

    #[test]
    fn page_view_serializes_to_json() {
        let table = sample_table();
        let view = build(Page::Home, &table, YearRange::new(2020, 2020), &[]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["sections"][0]["body"]["kind"], "chart");
        assert_eq!(json["sections"][0]["body"]["value"]["type"], "line");
        assert_eq!(json["sections"][0]["body"]["value"]["x_axis"]["kind"], "date");
    }
}
