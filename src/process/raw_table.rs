// src/process/raw_table.rs
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

/// The series' first published school year, present in every edition of the
/// table. Used to pick the data table out of the page, which also carries
/// navigation and layout tables. Some editions use an en dash in the label.
static VINTAGE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new("1929(-|–)30").expect("vintage row pattern"));

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("tr selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("td selector"));

/// Fixed layout of the published table. The spacer entries are the empty
/// separator columns NCES renders between column groups; they carry no data
/// and are dropped during cleaning. Any other arity means the site changed
/// the table shape and cleaning refuses to guess at column positions.
pub const COLUMN_NAMES: [&str; 14] = [
    "school_year",
    "spacer_a",
    "ada_unadjusted_total",
    "ada_unadjusted_current",
    "ada_constant_total",
    "ada_constant_current",
    "spacer_b",
    "enrollment_unadjusted_total",
    "enrollment_unadjusted_current",
    "enrollment_constant_total",
    "enrollment_constant_current",
    "spacer_c",
    "pct_change",
    "spacer_d",
];

pub const EXPECTED_COLUMNS: usize = COLUMN_NAMES.len();

/// The scraped expenditure grid, cell text untouched beyond trimming.
/// Immutable once read; all reshaping happens in [`crate::process::clean`].
#[derive(Debug)]
pub struct RawExpenditureTable {
    /// One entry per `<td>` row of the matched table, padded with empty
    /// cells to the table width. Header rows are `<th>`-only and excluded.
    pub rows: Vec<Vec<String>>,
    /// Widest data row observed.
    pub width: usize,
}

impl RawExpenditureTable {
    /// Parse the table page, selecting the first `<table>` whose text
    /// mentions the 1929-30 school year.
    pub fn from_html(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let table = document
            .select(&TABLE)
            .find(|t| VINTAGE_ROW.is_match(&t.text().collect::<String>()))
            .ok_or_else(|| anyhow!("no table mentioning the 1929-30 school year found"))?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut width = 0;
        for tr in table.select(&ROW) {
            let cells: Vec<String> = tr
                .select(&CELL)
                .map(|td| td.text().collect::<String>().trim().to_string())
                .collect();
            if cells.is_empty() {
                continue;
            }
            width = width.max(cells.len());
            rows.push(cells);
        }
        // Footnote and separator rows use colspans and come out narrow.
        for row in &mut rows {
            row.resize(width, String::new());
        }

        debug!(rows = rows.len(), width, "parsed raw expenditure table");
        Ok(Self { rows, width })
    }

    pub fn column_count(&self) -> usize {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table><tr><td>site navigation</td></tr></table>
            <table>
              <tr><th>School year</th><th colspan="13">Expenditure per pupil</th></tr>
              {rows}
            </table>
            </body></html>"#
        )
    }

    fn data_row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<tr>{tds}</tr>")
    }

    #[test]
    fn picks_the_table_with_the_vintage_row() {
        let cells = vec!["1929-30"; 1]
            .into_iter()
            .chain(std::iter::repeat("$1").take(13))
            .collect::<Vec<_>>();
        let html = table_page(&data_row(&cells));
        let raw = RawExpenditureTable::from_html(&html).expect("table parses");
        assert_eq!(raw.column_count(), EXPECTED_COLUMNS);
        assert_eq!(raw.rows.len(), 1);
        assert_eq!(raw.rows[0][0], "1929-30");
    }

    #[test]
    fn en_dash_year_labels_match() {
        let mut cells = vec!["1929–30"];
        cells.extend(std::iter::repeat("$1").take(13));
        let html = table_page(&data_row(&cells));
        assert!(RawExpenditureTable::from_html(&html).is_ok());
    }

    #[test]
    fn narrow_footnote_rows_are_padded_to_table_width() {
        let mut cells = vec!["1929-30"];
        cells.extend(std::iter::repeat("$1").take(13));
        let rows = format!(
            "{}{}",
            data_row(&cells),
            r#"<tr><td colspan="14">NOTE: Beginning in 1980-81...</td></tr>"#
        );
        let raw = RawExpenditureTable::from_html(&table_page(&rows)).expect("table parses");
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[1].len(), EXPECTED_COLUMNS);
        assert!(raw.rows[1][1].is_empty());
    }

    #[test]
    fn page_without_the_table_is_an_error() {
        let err = RawExpenditureTable::from_html("<html><body><p>moved</p></body></html>")
            .expect_err("no table to find");
        assert!(err.to_string().contains("1929-30"));
    }
}
