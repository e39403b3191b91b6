use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{
    uniform_grid_spacer, Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot,
    PlotPoint, PlotPoints, Points,
};

use crate::chart::spec::{Axis, BoxEntry, ColorScale, Marker, Series};
use crate::chart::{AxisKind, ChartSpec, PageView, PairCell, SectionBody};
use crate::color;
use crate::data::model::ordinal_to_date;

const STACKED_CHART_HEIGHT: f32 = 320.0;
const MIN_CHART_HEIGHT: f32 = 280.0;
const HEATMAP_CELL: [f32; 2] = [92.0, 28.0];
const PAIR_CELL_SIZE: f32 = 190.0;

// ---------------------------------------------------------------------------
// Page (central panel)
// ---------------------------------------------------------------------------

/// Render a whole page: title, intro, then each section in order.
pub fn page_view(ui: &mut Ui, view: &PageView) {
    let n_charts = view.charts().count();
    let chart_height = if n_charts > 1 || view.intro.is_some() {
        STACKED_CHART_HEIGHT
    } else {
        (ui.available_height() - 60.0).max(MIN_CHART_HEIGHT)
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new(&view.title).strong());

            if let Some(intro) = &view.intro {
                ui.add_space(4.0);
                ui.label(&intro.paragraph);
                ui.add_space(4.0);
                ui.strong("Key Metrics Explored:");
                for bullet in &intro.bullets {
                    ui.label(format!("  • {bullet}"));
                }
                ui.add_space(4.0);
                ui.label(RichText::new(&intro.footer).italics());
            }

            for (idx, section) in view.sections.iter().enumerate() {
                ui.add_space(8.0);
                if let Some(sub) = &section.subheader {
                    ui.label(RichText::new(sub).size(18.0).strong());
                }
                match &section.body {
                    SectionBody::Chart(chart) => {
                        let id = format!("{}#{idx}", view.title);
                        chart_spec(ui, &id, chart, chart_height);
                    }
                    SectionBody::Notice(msg) => notice(ui, msg),
                }
            }
        });
}

fn notice(ui: &mut Ui, msg: &str) {
    egui::Frame::group(ui.style())
        .fill(Color32::from_rgb(0x1c, 0x33, 0x4f))
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(format!("ℹ  {msg}")).color(Color32::from_rgb(0xcd, 0xe4, 0xff)));
        });
}

/// Dispatch one chart to its renderer.
pub fn chart_spec(ui: &mut Ui, id: &str, chart: &ChartSpec, height: f32) {
    match chart {
        ChartSpec::Line {
            x_axis,
            y_axis,
            legend_title,
            series,
        } => line_chart(ui, id, x_axis, y_axis, legend_title.as_deref(), series, height),
        ChartSpec::Bar {
            x_axis,
            y_axis,
            bar_width,
            series,
        } => bar_chart(ui, id, x_axis, y_axis, *bar_width, series, height),
        ChartSpec::Box {
            x_axis,
            y_axis,
            color,
            boxes,
        } => box_chart(ui, id, x_axis, y_axis, color, boxes, height),
        ChartSpec::Scatter {
            x_axis,
            y_axis,
            color_scale,
            size_by,
            markers,
        } => scatter_chart(
            ui,
            id,
            x_axis,
            y_axis,
            color_scale.as_ref(),
            size_by.as_deref(),
            markers,
            height,
        ),
        ChartSpec::Heatmap {
            labels,
            values,
            color_scale,
            decimals,
        } => heatmap(ui, labels, values, color_scale, *decimals),
        ChartSpec::PairGrid {
            columns,
            marker_color,
            cells,
        } => pair_grid(ui, id, columns, marker_color, cells),
    }
}

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

fn date_label(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    ordinal_to_date(mark.value)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

/// Base plot with axis titles and tick layout taken from the spec.
fn base_plot<'a>(id: &str, x_axis: &Axis, y_axis: &Axis, height: f32) -> Plot<'a> {
    let mut plot = Plot::new(id)
        .height(height)
        .legend(Legend::default())
        .x_axis_label(x_axis.title.clone())
        .y_axis_label(y_axis.title.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    match x_axis.kind {
        AxisKind::Date => {
            plot = plot.x_axis_formatter(date_label).label_formatter(|name, value: &PlotPoint| {
                let date = ordinal_to_date(value.x)
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                if name.is_empty() {
                    format!("{date}\n{:.2}", value.y)
                } else {
                    format!("{name}\n{date}\n{:.2}", value.y)
                }
            });
        }
        AxisKind::Linear => {
            plot = plot.x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]));
        }
        AxisKind::Auto => {}
    }
    plot
}

// ---------------------------------------------------------------------------
// Chart renderers
// ---------------------------------------------------------------------------

fn line_chart(
    ui: &mut Ui,
    id: &str,
    x_axis: &Axis,
    y_axis: &Axis,
    legend_title: Option<&str>,
    series: &[Series],
    height: f32,
) {
    if let Some(title) = legend_title {
        ui.label(RichText::new(title).small().weak());
    }
    base_plot(id, x_axis, y_axis, height).show(ui, |plot_ui| {
        for s in series {
            let color = color::resolve(&s.color);
            // Same name on every segment so the legend shows one entry.
            for run in s.segments() {
                let line = Line::new(PlotPoints::new(run.to_vec()))
                    .name(&s.name)
                    .color(color)
                    .width(1.5);
                plot_ui.line(line);
            }
        }
    });
}

fn bar_chart(
    ui: &mut Ui,
    id: &str,
    x_axis: &Axis,
    y_axis: &Axis,
    bar_width: f64,
    series: &Series,
    height: f32,
) {
    let fill = color::resolve(&series.color);
    let bars: Vec<Bar> = series
        .points
        .iter()
        .map(|&[x, y]| Bar::new(x, y).width(bar_width).fill(fill))
        .collect();

    base_plot(id, x_axis, y_axis, height).show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).name(&series.name).color(fill));
    });
}

fn box_chart(
    ui: &mut Ui,
    id: &str,
    x_axis: &Axis,
    y_axis: &Axis,
    fill: &str,
    boxes: &[BoxEntry],
    height: f32,
) {
    let fill = color::resolve(fill);
    let stroke = Stroke::new(1.5, fill.gamma_multiply(0.6));

    let elems: Vec<BoxElem> = boxes
        .iter()
        .map(|b| {
            let s = &b.summary;
            BoxElem::new(
                b.position,
                BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
            )
            .name(&b.label)
            .box_width(0.6)
            .whisker_width(0.3)
            .fill(fill.gamma_multiply(0.5))
            .stroke(stroke)
        })
        .collect();

    let outliers: Vec<[f64; 2]> = boxes
        .iter()
        .flat_map(|b| b.summary.outliers.iter().map(move |&y| [b.position, y]))
        .collect();

    base_plot(id, x_axis, y_axis, height).show(ui, |plot_ui| {
        plot_ui.box_plot(BoxPlot::new(elems).name(&y_axis.title));
        if !outliers.is_empty() {
            plot_ui.points(
                Points::new(PlotPoints::new(outliers))
                    .radius(2.5)
                    .color(fill)
                    .name("outliers"),
            );
        }
    });
}

#[allow(clippy::too_many_arguments)]
fn scatter_chart(
    ui: &mut Ui,
    id: &str,
    x_axis: &Axis,
    y_axis: &Axis,
    color_scale: Option<&ColorScale>,
    size_by: Option<&str>,
    markers: &[Marker],
    height: f32,
) {
    ui.horizontal(|ui: &mut Ui| {
        if let Some(scale) = color_scale {
            color_bar(ui, scale);
        }
        if let Some(size_by) = size_by {
            ui.label(RichText::new(format!("size: {size_by}")).small().weak());
        }
    });

    base_plot(id, x_axis, y_axis, height)
        .legend(Legend::default().position(egui_plot::Corner::RightBottom))
        .show(ui, |plot_ui| {
            for m in markers {
                plot_ui.points(
                    Points::new(PlotPoints::new(vec![[m.x, m.y]]))
                        .radius(m.radius)
                        .filled(true)
                        .color(color::resolve(&m.color).gamma_multiply(0.85)),
                );
            }
        });
}

/// Horizontal gradient strip labelled with the scale bounds.
fn color_bar(ui: &mut Ui, scale: &ColorScale) {
    const STEPS: usize = 24;
    let sample = |t: f64| match scale.name.as_str() {
        "coolwarm" => color::coolwarm(t),
        _ => color::viridis(t),
    };

    ui.label(RichText::new(format!("{} {}", scale.title, fmt_bound(scale.min))).small());
    let (rect, _) =
        ui.allocate_exact_size(egui::vec2(STEPS as f32 * 6.0, 12.0), egui::Sense::hover());
    let step_w = rect.width() / STEPS as f32;
    for i in 0..STEPS {
        let t = i as f64 / (STEPS - 1) as f64;
        let x0 = rect.left() + i as f32 * step_w;
        let cell = egui::Rect::from_min_size(
            egui::pos2(x0, rect.top()),
            egui::vec2(step_w + 0.5, rect.height()),
        );
        ui.painter().rect_filled(cell, 0.0, color::resolve(&sample(t)));
    }
    ui.label(RichText::new(fmt_bound(scale.max)).small());
}

fn fmt_bound(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

/// Annotated grid with one coloured cell per coefficient.
fn heatmap(
    ui: &mut Ui,
    labels: &[String],
    values: &[Vec<Option<f64>>],
    scale: &ColorScale,
    decimals: usize,
) {
    ui.horizontal(|ui: &mut Ui| color_bar(ui, scale));
    ui.add_space(6.0);

    let span = (scale.max - scale.min).max(f64::EPSILON);
    let [cell_w, cell_h] = HEATMAP_CELL;

    TableBuilder::new(ui)
        .striped(false)
        .column(Column::auto().at_least(130.0))
        .columns(Column::exact(cell_w), labels.len())
        .header(cell_h, |mut header| {
            header.col(|_ui| {});
            for label in labels {
                header.col(|ui| {
                    ui.label(RichText::new(label).small().strong());
                });
            }
        })
        .body(|mut body| {
            for (i, row_values) in values.iter().enumerate() {
                body.row(cell_h, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(&labels[i]).small().strong());
                    });
                    for value in row_values {
                        row.col(|ui| {
                            let (fill, text) = match value {
                                Some(v) => (
                                    color::resolve(&color::coolwarm((v - scale.min) / span)),
                                    format!("{v:.decimals$}"),
                                ),
                                None => (Color32::from_gray(60), "n/a".to_string()),
                            };
                            ui.painter().rect_filled(ui.max_rect(), 0.0, fill);
                            ui.centered_and_justified(|ui: &mut Ui| {
                                ui.label(RichText::new(text).color(color::contrast_text(fill)));
                            });
                        });
                    }
                });
            }
        });
}

/// Scatter matrix: histograms on the diagonal, scatter plots elsewhere.
fn pair_grid(ui: &mut Ui, id: &str, columns: &[String], marker_color: &str, cells: &[PairCell]) {
    let n = columns.len();
    let color = color::resolve(marker_color);

    egui::Grid::new(format!("{id}_grid"))
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for (k, cell) in cells.iter().enumerate() {
                let (row, col) = (k / n, k % n);
                let mut plot = Plot::new(format!("{id}_{row}_{col}"))
                    .width(PAIR_CELL_SIZE)
                    .height(PAIR_CELL_SIZE)
                    .allow_drag(false)
                    .allow_scroll(false)
                    .allow_zoom(false)
                    .show_x(false)
                    .show_y(false);
                if row == n - 1 {
                    plot = plot.x_axis_label(columns[col].clone());
                }
                if col == 0 {
                    plot = plot.y_axis_label(columns[row].clone());
                }

                plot.show(ui, |plot_ui| match cell {
                    PairCell::Histogram { bins, .. } => {
                        let bars = bins
                            .iter()
                            .map(|b| {
                                Bar::new((b.start + b.end) / 2.0, b.count as f64)
                                    .width(b.end - b.start)
                                    .fill(color.gamma_multiply(0.7))
                            })
                            .collect();
                        plot_ui.bar_chart(BarChart::new(bars).color(color));
                    }
                    PairCell::Scatter { points, .. } => {
                        plot_ui.points(
                            Points::new(PlotPoints::new(points.clone()))
                                .radius(1.8)
                                .color(color.gamma_multiply(0.8)),
                        );
                    }
                });

                if col == n - 1 {
                    ui.end_row();
                }
            }
        });
}
