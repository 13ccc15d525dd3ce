// src/cost/mod.rs
use crate::process::clean::{CleanExpenditureTable, CostColumn};

/// Years in a K-12 career: kindergarten through grade 12.
pub const CAREER_YEARS: i32 = 13;

/// Sum `column` over the 13-year window ending at `end_year`, approximating
/// the cumulative cost of a K-12 career for a student graduating that year.
///
/// There is no bounds check against the table's year range: window years
/// outside it simply contribute nothing, so windows reaching past either
/// edge silently undercount. Callers near the edges should compare
/// `end_year` against `min_year() + 12` first.
pub fn trailing_sum(table: &CleanExpenditureTable, end_year: i32, column: CostColumn) -> f64 {
    let window = (end_year - (CAREER_YEARS - 1))..=end_year;
    table
        .year
        .iter()
        .zip(table.column(column))
        .filter(|(year, _)| window.contains(*year))
        .filter_map(|(_, value)| *value)
        .sum()
}

/// One trailing sum per year of the table's range, aligned by position with
/// a year axis starting at `min_year()`. The first 12 positions are `None`:
/// no full 13-year window exists for them.
pub fn trailing_sum_series(table: &CleanExpenditureTable, column: CostColumn) -> Vec<Option<f64>> {
    let span = table.len();
    let mut series: Vec<Option<f64>> = vec![None; span.min((CAREER_YEARS - 1) as usize)];
    for end_year in table.min_year() + CAREER_YEARS - 1..=table.max_year() {
        series.push(Some(trailing_sum(table, end_year, column)));
    }
    series
}
