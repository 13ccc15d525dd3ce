// src/process/clean.rs
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::DigestError;
use crate::process::raw_table::{RawExpenditureTable, EXPECTED_COLUMNS};

// Cell positions within the 14-column layout of `raw_table::COLUMN_NAMES`.
const YEAR_LABEL: usize = 0;
const VALUE_CELLS: [usize; 9] = [2, 3, 4, 5, 7, 8, 9, 10, 12];
// Position of `ada_constant_current` within VALUE_CELLS; the percent-change
// column is recomputed from it.
const CURRENT_CONSTANT: usize = 3;

/// Spending basis selector for the aggregation functions in [`crate::cost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostColumn {
    AdaUnadjustedTotal,
    AdaUnadjustedCurrent,
    AdaConstantTotal,
    AdaConstantCurrent,
    EnrollmentUnadjustedTotal,
    EnrollmentUnadjustedCurrent,
    EnrollmentConstantTotal,
    EnrollmentConstantCurrent,
    PctChange,
}

/// Cleaned per-pupil expenditure series.
///
/// Rows are indexed by graduation year (the school year "1929-30" is labeled
/// 1930) and the index is contiguous: every year between `min_year` and
/// `max_year` has a row, with values for years missing from the source
/// filled by linear interpolation. `None` survives only at the leading and
/// trailing edges of a column, where no neighbor exists to interpolate from.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanExpenditureTable {
    /// Contiguous graduation years, ascending. Never empty.
    pub year: Vec<i32>,
    pub ada_unadjusted_total: Vec<Option<f64>>,
    pub ada_unadjusted_current: Vec<Option<f64>>,
    pub ada_constant_total: Vec<Option<f64>>,
    pub ada_constant_current: Vec<Option<f64>>,
    pub enrollment_unadjusted_total: Vec<Option<f64>>,
    pub enrollment_unadjusted_current: Vec<Option<f64>>,
    pub enrollment_constant_total: Vec<Option<f64>>,
    pub enrollment_constant_current: Vec<Option<f64>>,
    /// Year-over-year change of `ada_constant_current`, recomputed after
    /// reindexing. `None` on the first row.
    pub pct_change: Vec<Option<f64>>,
}

impl CleanExpenditureTable {
    pub fn len(&self) -> usize {
        self.year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_empty()
    }

    pub fn min_year(&self) -> i32 {
        self.year[0]
    }

    pub fn max_year(&self) -> i32 {
        self.year[self.year.len() - 1]
    }

    pub fn column(&self, column: CostColumn) -> &[Option<f64>] {
        match column {
            CostColumn::AdaUnadjustedTotal => &self.ada_unadjusted_total,
            CostColumn::AdaUnadjustedCurrent => &self.ada_unadjusted_current,
            CostColumn::AdaConstantTotal => &self.ada_constant_total,
            CostColumn::AdaConstantCurrent => &self.ada_constant_current,
            CostColumn::EnrollmentUnadjustedTotal => &self.enrollment_unadjusted_total,
            CostColumn::EnrollmentUnadjustedCurrent => &self.enrollment_unadjusted_current,
            CostColumn::EnrollmentConstantTotal => &self.enrollment_constant_total,
            CostColumn::EnrollmentConstantCurrent => &self.enrollment_constant_current,
            CostColumn::PctChange => &self.pct_change,
        }
    }
}

/// Convert the scraped grid into a [`CleanExpenditureTable`].
///
/// Pure and total over any 14-column table with at least one year row:
/// unparseable cells become `None` and are recovered by interpolation where
/// interior. A different column count is a structural mismatch and fails
/// loudly instead of misassigning columns.
pub fn clean(raw: &RawExpenditureTable) -> Result<CleanExpenditureTable, DigestError> {
    if raw.column_count() != EXPECTED_COLUMNS {
        return Err(DigestError::StructuralMismatch {
            expected: EXPECTED_COLUMNS,
            found: raw.column_count(),
        });
    }

    // Keep only rows whose label starts with a parseable year; subtotal and
    // footnote rows drop out here. First occurrence wins on duplicates.
    let mut by_year: BTreeMap<i32, [Option<f64>; 9]> = BTreeMap::new();
    for row in &raw.rows {
        let label = row[YEAR_LABEL].trim();
        if label.len() < 4 {
            continue;
        }
        let Some(prefix) = label.get(..4) else {
            continue;
        };
        let Ok(start_year) = prefix.parse::<i32>() else {
            continue;
        };
        // Graduation-year convention: "1929-30" is the year ending in 1930.
        let year = start_year + 1;
        let values: [Option<f64>; 9] = VALUE_CELLS.map(|cell| parse_cell(&row[cell]));
        by_year.entry(year).or_insert(values);
    }

    let (Some((&min_year, _)), Some((&max_year, _))) =
        (by_year.first_key_value(), by_year.last_key_value())
    else {
        return Err(DigestError::EmptyTable);
    };
    let span = (max_year - min_year + 1) as usize;

    // Reindex to a contiguous year range; source tables skip years.
    let mut year = Vec::with_capacity(span);
    let mut columns: [Vec<Option<f64>>; 9] = std::array::from_fn(|_| Vec::with_capacity(span));
    for y in min_year..=max_year {
        year.push(y);
        let row = by_year.get(&y);
        for (i, column) in columns.iter_mut().enumerate() {
            column.push(row.and_then(|values| values[i]));
        }
    }
    for column in columns.iter_mut().take(8) {
        interpolate(column);
    }

    // The scraped percent-change column knows nothing about interpolated
    // years, so recompute it from constant-dollar current expenditure.
    let current = &columns[CURRENT_CONSTANT];
    let mut pct_change = vec![None; span];
    for i in 1..span {
        if let (Some(prev), Some(cur)) = (current[i - 1], current[i]) {
            if prev != 0.0 {
                pct_change[i] = Some((cur - prev) / prev);
            }
        }
    }

    debug!(min_year, max_year, rows = span, "cleaned expenditure table");
    let [ada_unadjusted_total, ada_unadjusted_current, ada_constant_total, ada_constant_current, enrollment_unadjusted_total, enrollment_unadjusted_current, enrollment_constant_total, enrollment_constant_current, _scraped_pct] =
        columns;
    Ok(CleanExpenditureTable {
        year,
        ada_unadjusted_total,
        ada_unadjusted_current,
        ada_constant_total,
        ada_constant_current,
        enrollment_unadjusted_total,
        enrollment_unadjusted_current,
        enrollment_constant_total,
        enrollment_constant_current,
        pct_change,
    })
}

/// Currency/numeric coercion: strip `$` and thousands separators, then
/// parse. Footnote daggers, em dashes, and empty cells become `None`.
fn parse_cell(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(['$', ','], "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Fill interior gaps linearly between the nearest known neighbors. Leading
/// and trailing gaps stay `None`; only values between two observations are
/// synthesized.
fn interpolate(column: &mut [Option<f64>]) {
    let mut last: Option<(usize, f64)> = None;
    for i in 0..column.len() {
        let Some(value) = column[i] else { continue };
        if let Some((j, prev)) = last {
            if i - j > 1 {
                let step = (value - prev) / (i - j) as f64;
                for k in j + 1..i {
                    column[k] = Some(prev + step * (k - j) as f64);
                }
            }
        }
        last = Some((i, value));
    }
}
