use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use arrow::array::{Array, ArrayRef, AsArray, Date32Array, Float64Array, Int64Array};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{DataType, Date32Type};
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::DataError;
use super::model::{
    HousingRecord, HousingTable, Metric, DATE_COLUMN, DAY_COLUMN, MONTH_COLUMN, YEAR_COLUMN,
};

type Result<T> = std::result::Result<T, DataError>;

// ---------------------------------------------------------------------------
// Memoized entry-point
// ---------------------------------------------------------------------------

/// Tables loaded so far, keyed by canonical path.
static TABLE_CACHE: LazyLock<Mutex<HashMap<PathBuf, Arc<HousingTable>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Load a table once per process. Later calls for the same file return the
/// same `Arc` without touching the disk. Failed loads are not cached.
pub fn load_cached(path: &Path) -> Result<Arc<HousingTable>> {
    let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    // Held across the load so concurrent callers initialise a path only once.
    let mut cache = TABLE_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(table) = cache.get(&key) {
        log::debug!("Cache hit for {}", key.display());
        return Ok(Arc::clone(table));
    }

    let table = Arc::new(load_file(path)?);
    match (table.years().first(), table.years().last()) {
        (Some(first), Some(last)) => log::info!(
            "Loaded {} rows ({first}–{last}) from {}",
            table.len(),
            path.display()
        ),
        _ => log::warn!("Loaded an empty table from {}", path.display()),
    }
    cache.insert(key, Arc::clone(&table));
    Ok(table)
}

/// Load a housing table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `observation_date` and the metric columns
/// * `.parquet` – same logical schema, dates as Date32/Date64/Timestamp/Utf8
pub fn load_file(path: &Path) -> Result<HousingTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Cell parsing shared by both loaders
// ---------------------------------------------------------------------------

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(s: &str, row: usize) -> Result<NaiveDate> {
    let day_part = s
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or("");
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").map_err(|_| DataError::InvalidDate {
        row,
        value: s.to_string(),
    })
}

/// Empty cells and `NaN` markers become `f64::NAN`.
fn parse_number(s: &str, row: usize, column: &str) -> Result<f64> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na") {
        return Ok(f64::NAN);
    }
    s.parse::<f64>().map_err(|_| DataError::InvalidNumber {
        row,
        column: column.to_string(),
        value: s.to_string(),
    })
}

/// Check a stored Year/Month/Day value against the one derived from the date.
fn check_calendar(row: usize, column: &'static str, expected: i64, found: Option<i64>) -> Result<()> {
    match found {
        Some(found) if found != expected => Err(DataError::CalendarMismatch {
            row,
            column,
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

fn check_calendar_fields(rec: &HousingRecord, row: usize, stored: [Option<i64>; 3]) -> Result<()> {
    let [year, month, day] = stored;
    check_calendar(row, YEAR_COLUMN, rec.year as i64, year)?;
    check_calendar(row, MONTH_COLUMN, rec.month as i64, month)?;
    check_calendar(row, DAY_COLUMN, rec.day as i64, day)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, any column order.
/// `Year`, `Month` and `Day` are optional and derived from the date if absent.
fn load_csv(path: &Path) -> Result<HousingTable> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers()?.clone();

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let require = |name: &str| position(name).ok_or_else(|| DataError::MissingColumn(name.to_string()));

    let date_idx = require(DATE_COLUMN)?;
    let metric_idx = Metric::ALL
        .iter()
        .map(|&m| require(m.column()).map(|i| (m, i)))
        .collect::<Result<Vec<_>>>()?;
    let calendar_idx = [YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN].map(|c| position(c));

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result?;

        let mut rec = HousingRecord::new(parse_date(record.get(date_idx).unwrap_or(""), row)?);
        for &(metric, idx) in &metric_idx {
            rec.set_value(metric, parse_number(record.get(idx).unwrap_or(""), row, metric.column())?);
        }

        let mut stored = [None; 3];
        for (slot, (idx, name)) in stored
            .iter_mut()
            .zip(calendar_idx.iter().zip([YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN]))
        {
            if let Some(idx) = idx {
                let v = parse_number(record.get(*idx).unwrap_or(""), row, name)?;
                *slot = v.is_finite().then_some(v as i64);
            }
        }
        check_calendar_fields(&rec, row, stored)?;

        records.push(rec);
    }

    Ok(HousingTable::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same logical schema as the CSV.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<HousingTable> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let column = |name: &str| schema.index_of(name).ok().map(|i| batch.column(i));
        let require = |name: &str| column(name).ok_or_else(|| DataError::MissingColumn(name.to_string()));

        let dates = require(DATE_COLUMN)?;
        let metrics = Metric::ALL
            .iter()
            .map(|&m| -> Result<(Metric, ArrayRef)> {
                let col = require(m.column())?;
                Ok((m, cast_column(col, m.column(), &DataType::Float64)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut calendar = Vec::with_capacity(3);
        for name in [YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN] {
            calendar.push(
                column(name)
                    .map(|col| cast_column(col, name, &DataType::Int64))
                    .transpose()?,
            );
        }

        let date_values = DateColumn::new(dates)?;
        let offset = records.len();

        for row in 0..batch.num_rows() {
            let row_no = offset + row + 1;
            let mut rec = HousingRecord::new(date_values.get(row, row_no)?);

            for (metric, values) in &metrics {
                let values: &Float64Array = values.as_primitive();
                if values.is_valid(row) {
                    rec.set_value(*metric, values.value(row));
                }
            }

            let mut stored = [None; 3];
            for (slot, values) in stored.iter_mut().zip(&calendar) {
                if let Some(values) = values {
                    let values: &Int64Array = values.as_primitive();
                    *slot = values.is_valid(row).then(|| values.value(row));
                }
            }
            check_calendar_fields(&rec, row_no, stored)?;

            records.push(rec);
        }
    }

    Ok(HousingTable::from_records(records))
}

// -- Parquet / Arrow helpers --

/// Cast a numeric column to `to`, rejecting types Arrow cannot convert.
fn cast_column(col: &ArrayRef, name: &str, to: &DataType) -> Result<ArrayRef> {
    let from = col.data_type();
    if !from.is_numeric() || !can_cast_types(from, to) {
        return Err(DataError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: format!("{from:?}"),
        });
    }
    Ok(cast(col, to)?)
}

/// The observation date column, normalised to either days or text.
enum DateColumn {
    Days(Date32Array),
    Text(Vec<Option<String>>),
}

impl DateColumn {
    fn new(col: &ArrayRef) -> Result<Self> {
        match col.data_type() {
            DataType::Utf8 => Ok(DateColumn::Text(
                col.as_string::<i32>().iter().map(|s| s.map(str::to_string)).collect(),
            )),
            DataType::LargeUtf8 => Ok(DateColumn::Text(
                col.as_string::<i64>().iter().map(|s| s.map(str::to_string)).collect(),
            )),
            DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
                let days = cast(col, &DataType::Date32)?;
                Ok(DateColumn::Days(days.as_primitive::<Date32Type>().clone()))
            }
            other => Err(DataError::UnsupportedColumnType {
                column: DATE_COLUMN.to_string(),
                data_type: format!("{other:?}"),
            }),
        }
    }

    fn get(&self, row: usize, row_no: usize) -> Result<NaiveDate> {
        let invalid = |value: String| DataError::InvalidDate { row: row_no, value };
        match self {
            DateColumn::Days(days) => {
                if days.is_null(row) {
                    return Err(invalid("<null>".to_string()));
                }
                days.value_as_date(row)
                    .ok_or_else(|| invalid(days.value(row).to_string()))
            }
            DateColumn::Text(values) => match &values[row] {
                Some(s) => parse_date(s, row_no),
                None => Err(invalid("<null>".to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::model::date_to_ordinal;

    const HEADER: &str = "observation_date,Home_Price_Index,Mortgage_Rate,CPI,Unemployment_Rate,Median_Income,Housing_Starts,Real_GDP,Year,Month,Day";

    fn fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "housing_loader_{}_{name}",
            std::process::id()
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn parquet_fixture(name: &str, fields: Vec<Field>, columns: Vec<ArrayRef>) -> PathBuf {
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let path = std::env::temp_dir().join(format!("housing_loader_{}_{name}", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn loads_csv_rows() {
        let csv = format!(
            "{HEADER}\n\
             2004-01-01,141.6,5.71,186.3,5.7,44334,2000,14212.3,2004,1,1\n\
             2004-02-01,143.1,5.64,186.7,5.6,44334,1900,14212.3,2004,2,1\n"
        );
        let path = fixture("ok.csv", &csv);
        let table = load_file(&path).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.years(), &[2004]);
        let first = &table.records()[0];
        assert_eq!(first.observation_date, NaiveDate::from_ymd_opt(2004, 1, 1).unwrap());
        assert_eq!(first.value(Metric::HousingStarts), 2000.0);
        assert_eq!(first.value(Metric::RealGdp), 14212.3);
    }

    #[test]
    fn derives_calendar_columns_and_accepts_timestamps() {
        let csv = "Real_GDP,observation_date,Home_Price_Index,Mortgage_Rate,CPI,Unemployment_Rate,Median_Income,Housing_Starts\n\
                   1.0,2015-06-30 00:00:00,1,2,3,4,,6\n";
        let path = fixture("derived.csv", csv);
        let table = load_file(&path).unwrap();
        let rec = &table.records()[0];
        assert_eq!((rec.year, rec.month, rec.day), (2015, 6, 30));
        assert!(rec.median_income.is_nan());
    }

    #[test]
    fn missing_column_is_an_error() {
        let path = fixture("missing.csv", "observation_date,CPI\n2004-01-01,1\n");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(ref c) if c == "Home_Price_Index"));
    }

    #[test]
    fn bad_date_is_an_error() {
        let csv = format!("{HEADER}\nnot-a-date,1,2,3,4,5,6,7,2004,1,1\n");
        let path = fixture("baddate.csv", &csv);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn year_must_match_date() {
        let csv = format!("{HEADER}\n2004-01-01,1,2,3,4,5,6,7,2005,1,1\n");
        let path = fixture("mismatch.csv", &csv);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::CalendarMismatch { column: "Year", .. }));
    }

    #[test]
    fn missing_file_and_unknown_extension() {
        let missing = std::env::temp_dir().join("housing_loader_does_not_exist.csv");
        assert!(matches!(load_file(&missing), Err(DataError::Io { .. })));
        assert!(matches!(
            load_file(Path::new("data.xlsx")),
            Err(DataError::UnsupportedExtension(ref e)) if e == "xlsx"
        ));
    }

    #[test]
    fn cached_load_returns_same_table() {
        let csv = format!("{HEADER}\n2010-03-01,1,2,3,4,5,6,7,2010,3,1\n");
        let path = fixture("cached.csv", &csv);
        let a = load_cached(&path).unwrap();

        // Rewriting the file must not be observed through the cache.
        std::fs::write(&path, format!("{HEADER}\n")).unwrap();
        let b = load_cached(&path).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn loads_parquet_with_date32() {
        let dates = [
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        ];
        let mut fields = vec![Field::new(DATE_COLUMN, DataType::Date32, false)];
        let mut columns: Vec<ArrayRef> = vec![Arc::new(Date32Array::from(
            dates.iter().map(|d| date_to_ordinal(*d) as i32).collect::<Vec<_>>(),
        ))];
        for metric in Metric::ALL {
            fields.push(Field::new(metric.column(), DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(vec![Some(1.5), None])));
        }
        fields.push(Field::new(YEAR_COLUMN, DataType::Int64, false));
        columns.push(Arc::new(Int64Array::from(vec![2020, 2021])));
        fields.push(Field::new("note", DataType::Utf8, true));
        columns.push(Arc::new(StringArray::from(vec![Some("a"), None])));

        let path = parquet_fixture("date32.parquet", fields, columns);
        let table = load_file(&path).unwrap();
        assert_eq!(table.years(), &[2020, 2021]);
        assert_eq!(table.records()[0].cpi, 1.5);
        assert!(table.records()[1].cpi.is_nan());
        assert_eq!(table.records()[1].observation_date, dates[1]);
    }

    #[test]
    fn non_numeric_cell_is_an_error() {
        let csv = format!("{HEADER}\n2004-01-01,1,2,3,4,5,6,7,2004,1,1\n2004-02-01,1,2,abc,4,5,6,7,2004,2,1\n");
        let path = fixture("badnumber.csv", &csv);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidNumber { row: 2, ref column, ref value } if column == "CPI" && value == "abc"
        ));
    }

    #[test]
    fn parquet_date_of_unsupported_type_is_an_error() {
        let mut fields = vec![Field::new(DATE_COLUMN, DataType::Float64, false)];
        let mut columns: Vec<ArrayRef> = vec![Arc::new(Float64Array::from(vec![20040101.0]))];
        for metric in Metric::ALL {
            fields.push(Field::new(metric.column(), DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(vec![1.0])));
        }

        let path = parquet_fixture("floatdate.parquet", fields, columns);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err,
            DataError::UnsupportedColumnType { ref column, ref data_type }
                if column == DATE_COLUMN && data_type == "Float64"
        ));
    }

    #[test]
    fn parquet_text_metric_is_an_error() {
        let mut fields = vec![Field::new(DATE_COLUMN, DataType::Utf8, false)];
        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(vec!["2004-01-01"]))];
        for metric in Metric::ALL {
            let (field, column): (Field, ArrayRef) = if metric == Metric::Cpi {
                (Field::new(metric.column(), DataType::Utf8, true), Arc::new(StringArray::from(vec!["1.0"])))
            } else {
                (Field::new(metric.column(), DataType::Float64, true), Arc::new(Float64Array::from(vec![1.0])))
            };
            fields.push(field);
            columns.push(column);
        }

        let path = parquet_fixture("textmetric.parquet", fields, columns);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedColumnType { ref column, .. } if column == "CPI"));
    }
}
