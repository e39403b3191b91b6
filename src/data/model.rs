use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

pub const DATE_COLUMN: &str = "observation_date";
pub const YEAR_COLUMN: &str = "Year";
pub const MONTH_COLUMN: &str = "Month";
pub const DAY_COLUMN: &str = "Day";

// ---------------------------------------------------------------------------
// Metric – one numeric indicator column
// ---------------------------------------------------------------------------

/// The numeric indicator columns of the housing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    HomePriceIndex,
    MortgageRate,
    Cpi,
    UnemploymentRate,
    MedianIncome,
    HousingStarts,
    RealGdp,
}

impl Metric {
    /// All metrics in column order.
    pub const ALL: [Metric; 7] = [
        Metric::HomePriceIndex,
        Metric::MortgageRate,
        Metric::Cpi,
        Metric::UnemploymentRate,
        Metric::MedianIncome,
        Metric::HousingStarts,
        Metric::RealGdp,
    ];

    /// Column name as it appears in the CSV header.
    pub fn column(self) -> &'static str {
        match self {
            Metric::HomePriceIndex => "Home_Price_Index",
            Metric::MortgageRate => "Mortgage_Rate",
            Metric::Cpi => "CPI",
            Metric::UnemploymentRate => "Unemployment_Rate",
            Metric::MedianIncome => "Median_Income",
            Metric::HousingStarts => "Housing_Starts",
            Metric::RealGdp => "Real_GDP",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// HousingRecord – one row of the time series
// ---------------------------------------------------------------------------

/// A single monthly observation. Missing numeric cells are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingRecord {
    pub observation_date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub home_price_index: f64,
    pub mortgage_rate: f64,
    pub cpi: f64,
    pub unemployment_rate: f64,
    pub median_income: f64,
    pub housing_starts: f64,
    pub real_gdp: f64,
}

impl HousingRecord {
    /// Build a record with `year`/`month`/`day` derived from the date and
    /// every metric set to `NaN`.
    pub fn new(observation_date: NaiveDate) -> Self {
        use chrono::Datelike;

        Self {
            observation_date,
            year: observation_date.year(),
            month: observation_date.month(),
            day: observation_date.day(),
            home_price_index: f64::NAN,
            mortgage_rate: f64::NAN,
            cpi: f64::NAN,
            unemployment_rate: f64::NAN,
            median_income: f64::NAN,
            housing_starts: f64::NAN,
            real_gdp: f64::NAN,
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::HomePriceIndex => self.home_price_index,
            Metric::MortgageRate => self.mortgage_rate,
            Metric::Cpi => self.cpi,
            Metric::UnemploymentRate => self.unemployment_rate,
            Metric::MedianIncome => self.median_income,
            Metric::HousingStarts => self.housing_starts,
            Metric::RealGdp => self.real_gdp,
        }
    }

    pub fn set_value(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::HomePriceIndex => &mut self.home_price_index,
            Metric::MortgageRate => &mut self.mortgage_rate,
            Metric::Cpi => &mut self.cpi,
            Metric::UnemploymentRate => &mut self.unemployment_rate,
            Metric::MedianIncome => &mut self.median_income,
            Metric::HousingStarts => &mut self.housing_starts,
            Metric::RealGdp => &mut self.real_gdp,
        };
        *slot = value;
    }

    /// Days since 1970-01-01, used as the x coordinate on date axes.
    pub fn date_ordinal(&self) -> f64 {
        date_to_ordinal(self.observation_date)
    }
}

pub fn date_to_ordinal(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

pub fn ordinal_to_date(days: f64) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::TimeDelta::try_days(days.round() as i64)?)
}

// ---------------------------------------------------------------------------
// HousingTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. Immutable once built.
#[derive(Debug, Clone)]
pub struct HousingTable {
    records: Vec<HousingRecord>,
    /// Ordered list of column names exposed by the table.
    pub column_names: Vec<String>,
    /// Distinct years present, ascending.
    years: Vec<i32>,
}

impl HousingTable {
    /// Build the table and its year index from parsed records.
    pub fn from_records(records: Vec<HousingRecord>) -> Self {
        let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();

        let mut column_names = vec![DATE_COLUMN.to_string()];
        column_names.extend(Metric::ALL.iter().map(|m| m.column().to_string()));
        column_names.extend([YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN].map(String::from));

        HousingTable {
            records,
            column_names,
            years: years.into_iter().collect(),
        }
    }

    pub fn records(&self) -> &[HousingRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct sorted years.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }
}
