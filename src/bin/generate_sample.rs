use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;

const METRIC_COLUMNS: [&str; 7] = [
    "Home_Price_Index",
    "Mortgage_Rate",
    "CPI",
    "Unemployment_Rate",
    "Median_Income",
    "Housing_Starts",
    "Real_GDP",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Row {
    date: NaiveDate,
    metrics: [f64; 7],
}

/// Loosely shaped like the 2004–2024 national series: a price run-up, the
/// 2008 bust, a long recovery and the post-2020 surge.
fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for year in 2004..=2024 {
        for month in 1..=12u32 {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) else {
                continue;
            };
            let t = (year - 2004) as f64 + (month - 1) as f64 / 12.0;

            let bust = (-((t - 5.5) / 1.5).powi(2)).exp();
            let surge = if t > 16.0 { (t - 16.0) * 18.0 } else { 0.0 };
            let hpi = 140.0 + 10.0 * t - 45.0 * bust + surge + rng.gauss(0.0, 1.2);
            let mortgage = 6.0 - 0.22 * t + if t > 18.0 { (t - 18.0) * 1.6 } else { 0.0 };
            let cpi = 186.0 + 5.4 * t + if t > 17.0 { (t - 17.0) * 6.0 } else { 0.0 };
            let unemployment = 4.8 + 4.5 * (-((t - 6.5) / 2.2).powi(2)).exp()
                + 9.0 * (-((t - 16.4) / 0.35).powi(2)).exp();
            let income = 44_000.0 + 1_050.0 * t;
            let starts = 1_900.0 - 1_250.0 * bust.sqrt() + 35.0 * t.min(14.0) + rng.gauss(0.0, 60.0);
            let gdp = 14_200.0 + 310.0 * t - 600.0 * bust + rng.gauss(0.0, 25.0);

            rows.push(Row {
                date,
                metrics: [
                    hpi,
                    mortgage.max(2.6) + rng.gauss(0.0, 0.05),
                    cpi + rng.gauss(0.0, 0.4),
                    (unemployment + rng.gauss(0.0, 0.1)).max(3.0),
                    income,
                    starts.max(400.0),
                    gdp,
                ],
            });
        }
    }
    rows
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;

    let mut header = vec!["observation_date"];
    header.extend(METRIC_COLUMNS);
    header.extend(["Year", "Month", "Day"]);
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
        record.extend(row.metrics.iter().map(|v| format!("{v:.3}")));
        record.extend([
            row.date.year().to_string(),
            row.date.month().to_string(),
            row.date.day().to_string(),
        ]);
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let epoch = NaiveDate::default();
    let mut fields = vec![Field::new("observation_date", DataType::Date32, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(Date32Array::from(
        rows.iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    ))];

    for (k, name) in METRIC_COLUMNS.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            rows.iter().map(|r| r.metrics[k]).collect::<Vec<_>>(),
        )));
    }

    let calendar: [(&str, fn(&NaiveDate) -> i64); 3] = [
        ("Year", |d| d.year() as i64),
        ("Month", |d| d.month() as i64),
        ("Day", |d| d.day() as i64),
    ];
    for (name, part) in calendar {
        fields.push(Field::new(name, DataType::Int64, false));
        columns.push(Arc::new(Int64Array::from(
            rows.iter().map(|r| part(&r.date)).collect::<Vec<_>>(),
        )));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "final_housing_data.csv".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(&rows, path)?,
        Some("parquet") | Some("pq") => write_parquet(&rows, path)?,
        other => bail!("Unsupported output extension: {other:?}"),
    }

    println!("Wrote {} monthly observations to {output}", rows.len());
    Ok(())
}
