use serde::Serialize;

use super::model::HousingTable;

// ---------------------------------------------------------------------------
// Year range predicate
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` range over the `Year` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Build a range; swapped bounds are reordered so `start <= end`.
    pub fn new(start: i32, end: i32) -> Self {
        if start <= end {
            YearRange { start, end }
        } else {
            YearRange { start: end, end: start }
        }
    }

    /// The full span of years present in `table`, or `None` when it is empty.
    pub fn full(table: &HousingTable) -> Option<Self> {
        let years = table.years();
        Some(YearRange::new(*years.first()?, *years.last()?))
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Return indices of rows whose `Year` lies inside `range`, in table order.
pub fn filtered_indices(table: &HousingTable, range: YearRange) -> Vec<usize> {
    table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| range.contains(rec.year))
        .map(|(i, _)| i)
        .collect()
}

/// Same predicate as [`filtered_indices`], over borrowed records.
#[cfg(test)]
pub fn filter_records<'a, I>(records: I, range: YearRange) -> Vec<&'a super::model::HousingRecord>
where
    I: IntoIterator<Item = &'a super::model::HousingRecord>,
{
    records
        .into_iter()
        .filter(|rec| range.contains(rec.year))
        .collect()
}
