//! Small descriptive statistics over housing records.
//!
//! All functions skip `NaN` cells the way pandas does with `skipna=True`.

use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{HousingRecord, Metric};

/// Arithmetic mean of the finite values, or `None` if there are none.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Pearson correlation over pairwise-complete observations.
///
/// Returns `None` with fewer than two complete pairs or when either side has
/// zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= f64::EPSILON || syy <= f64::EPSILON {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Square, symmetric correlation matrix over a set of metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub metrics: Vec<Metric>,
    /// Row-major cells; `None` where the coefficient is undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    #[cfg(test)]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }
}

pub fn correlation_matrix(rows: &[&HousingRecord], metrics: &[Metric]) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = metrics
        .iter()
        .map(|&m| rows.iter().map(|r| r.value(m)).collect())
        .collect();

    let n = metrics.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        metrics: metrics.to_vec(),
        values,
    }
}

// ---------------------------------------------------------------------------
// Monthly grouping
// ---------------------------------------------------------------------------

/// Mean of each metric for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMean {
    pub month: u32,
    pub means: Vec<Option<f64>>,
}

/// Group rows by `month` (ascending) and average each metric.
pub fn monthly_means<'a, I>(rows: I, metrics: &[Metric]) -> Vec<MonthlyMean>
where
    I: IntoIterator<Item = &'a HousingRecord>,
{
    let mut groups: BTreeMap<u32, Vec<&HousingRecord>> = BTreeMap::new();
    for rec in rows {
        groups.entry(rec.month).or_default().push(rec);
    }

    groups
        .into_iter()
        .map(|(month, recs)| MonthlyMean {
            month,
            means: metrics
                .iter()
                .map(|&m| mean(recs.iter().map(|r| r.value(m))))
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Box plot summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Five-number summary with 1.5×IQR whiskers.
pub fn box_summary<I: IntoIterator<Item = f64>>(values: I) -> Option<BoxSummary> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let fence = 1.5 * (q3 - q1);
    let (lo_fence, hi_fence) = (q1 - fence, q3 + fence);

    let lower_whisker = sorted.iter().copied().find(|v| *v >= lo_fence).unwrap_or(q1);
    let upper_whisker = sorted.iter().rev().copied().find(|v| *v <= hi_fence).unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    Some(BoxSummary {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram over the finite range of `values`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        // max lands in the last bin
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(y: i32, m: u32, hpi: f64, rate: f64, cpi: f64) -> HousingRecord {
        let mut rec = HousingRecord::new(NaiveDate::from_ymd_opt(y, m, 1).unwrap());
        rec.home_price_index = hpi;
        rec.mortgage_rate = rate;
        rec.cpi = cpi;
        rec
    }

    #[test]
    fn mean_skips_nan() {
        assert_eq!(mean([1.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(mean([f64::NAN]), None);
        assert_eq!(mean(Vec::<f64>::new()), None);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let up = [2.0, 4.0, 6.0, 8.0];
        let down = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&xs, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_undefined_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
        // only one complete pair survives
        assert_eq!(pearson(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, f64::NAN]), None);
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let rows = vec![
            record(2010, 1, 100.0, 5.0, 210.0),
            record(2010, 2, 110.0, 4.5, 212.0),
            record(2010, 3, 125.0, 4.7, 211.0),
            record(2010, 4, 130.0, 3.9, 215.0),
        ];
        let refs: Vec<&HousingRecord> = rows.iter().collect();
        let metrics = [Metric::HomePriceIndex, Metric::MortgageRate, Metric::Cpi];
        let corr = correlation_matrix(&refs, &metrics);

        for i in 0..metrics.len() {
            assert_eq!(corr.get(i, i), Some(1.0));
            for j in 0..metrics.len() {
                assert_eq!(corr.get(i, j), corr.get(j, i));
                if let Some(r) = corr.get(i, j) {
                    assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
    }

    #[test]
    fn monthly_means_group_by_calendar_month() {
        let rows = vec![
            record(2010, 1, 100.0, 5.0, 1.0),
            record(2011, 1, 200.0, 7.0, 1.0),
            record(2010, 2, 50.0, f64::NAN, 1.0),
        ];
        let out = monthly_means(&rows, &[Metric::HomePriceIndex, Metric::MortgageRate]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].month, 1);
        assert_eq!(out[0].means, vec![Some(150.0), Some(6.0)]);
        assert_eq!(out[1].means, vec![Some(50.0), None]);
    }

    #[test]
    fn box_summary_flags_outliers() {
        let summary = box_summary([1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(summary.median, 3.5);
        assert_eq!(summary.q1, 2.25);
        assert_eq!(summary.q3, 4.75);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.upper_whisker, 5.0);
        assert_eq!(summary.outliers, vec![100.0]);
        assert!(box_summary([f64::NAN]).is_none());
    }

    #[test]
    fn histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = histogram(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins.last().unwrap().count, 1);

        let flat = histogram(&[3.0, 3.0], 10);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].count, 2);
    }
}
