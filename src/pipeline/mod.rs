// src/pipeline/mod.rs
use anyhow::{anyhow, Context, Result};
use scraper::Html;
use tracing::{info, instrument};

use crate::cost;
use crate::fetch::{locate, Digest, PER_PUPIL_CAPTION};
use crate::process::clean::{self, CleanExpenditureTable, CostColumn};
use crate::process::parquet;
use crate::process::raw_table::RawExpenditureTable;
use crate::store::{ArtifactKey, ArtifactKind, ArtifactStore};

/// Output of one pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    pub table: CleanExpenditureTable,
    /// Trailing 13-year K-12 career cost in constant dollars, aligned by
    /// position with the table's year axis.
    pub career_cost: Vec<Option<f64>>,
}

/// Fetch, locate, clean, and aggregate, caching every artifact through
/// `store`. A cached clean table short-circuits the whole fetch path, so
/// re-runs against a warm store perform no network I/O at all.
#[instrument(skip(digest, store), fields(year = %digest.year_tag()))]
pub fn run(digest: &Digest, store: &dyn ArtifactStore) -> Result<PipelineRun> {
    let tag = digest.year_tag();

    let clean_key = ArtifactKey::new(&tag, ArtifactKind::CleanTable);
    let table = match store.get(&clean_key)? {
        Some(bytes) => {
            info!("using cached clean table");
            parquet::from_parquet_bytes(bytes).context("decoding cached clean table")?
        }
        None => {
            let menu_html = fetch_if_absent(
                store,
                &ArtifactKey::new(&tag, ArtifactKind::TablesMenu),
                || digest.fetch_html(&digest.tables_menu_url()),
            )?;
            let menu = Html::parse_document(&menu_html);
            let table_url = locate::find_table_url(&menu, PER_PUPIL_CAPTION, digest.base_url())
                .ok_or_else(|| {
                    anyhow!("per-pupil expenditure table not found in the {tag} tables menu")
                })?;
            info!(url = %table_url, "located per-pupil expenditure table");

            let table_html = fetch_if_absent(
                store,
                &ArtifactKey::new(&tag, ArtifactKind::ExpenditureTable),
                || digest.fetch_html(&table_url),
            )?;
            let raw = RawExpenditureTable::from_html(&table_html)?;
            let table = clean::clean(&raw)?;
            store.put(&clean_key, &parquet::to_parquet_bytes(&table)?)?;
            table
        }
    };

    info!(
        rows = table.len(),
        min_year = table.min_year(),
        max_year = table.max_year(),
        "clean expenditure table ready"
    );
    let career_cost = cost::trailing_sum_series(&table, CostColumn::AdaConstantCurrent);
    Ok(PipelineRun { table, career_cost })
}

/// Fetch-if-absent: return the cached body, or run `fetch` and cache its
/// result. Presence is the only staleness check.
fn fetch_if_absent(
    store: &dyn ArtifactStore,
    key: &ArtifactKey,
    fetch: impl FnOnce() -> Result<String>,
) -> Result<String> {
    if let Some(bytes) = store.get(key)? {
        return String::from_utf8(bytes).context("cached artifact is not UTF-8");
    }
    let body = fetch()?;
    store.put(key, body.as_bytes())?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use tracing_subscriber::{fmt, EnvFilter};

    fn init_test_logging() {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,edscraper=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn menu_fixture() -> String {
        r#"<html><body><ul>
            <li><a href="d19/tables/dt19_236.55.asp">Table 236.55. Total and current
            expenditures per pupil in public elementary and secondary schools</a></li>
        </ul></body></html>"#
            .to_string()
    }

    fn table_fixture() -> String {
        let mut rows = String::new();
        for (label, value) in [
            ("1929-30", 100.0),
            ("1930-31", 200.0),
            // 1931-32 skipped on purpose; cleaning interpolates it.
            ("1932-33", 400.0),
        ] {
            let mut cells = vec![label.to_string(), String::new()];
            for _ in 0..4 {
                cells.push(format!("${value}"));
            }
            cells.push(String::new());
            for _ in 0..4 {
                cells.push(format!("${value}"));
            }
            cells.push(String::new());
            cells.push("1.0".to_string());
            cells.push(String::new());
            let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
            rows.push_str(&format!("<tr>{tds}</tr>"));
        }
        format!("<html><body><table>{rows}</table></body></html>")
    }

    fn seeded_store() -> MemStore {
        let store = MemStore::new();
        store
            .put(
                &ArtifactKey::new("2019", ArtifactKind::TablesMenu),
                menu_fixture().as_bytes(),
            )
            .unwrap();
        store
            .put(
                &ArtifactKey::new("2019", ArtifactKind::ExpenditureTable),
                table_fixture().as_bytes(),
            )
            .unwrap();
        store
    }

    #[test]
    fn runs_from_seeded_store_without_network() {
        init_test_logging();
        let store = seeded_store();
        let digest = Digest::new(Some(2019)).expect("digest");

        let run_out = run(&digest, &store).expect("pipeline run");
        assert_eq!(run_out.table.year, vec![1930, 1931, 1932, 1933]);
        assert_eq!(
            run_out.table.ada_constant_current,
            vec![Some(100.0), Some(200.0), Some(300.0), Some(400.0)],
        );
        // Too few years for a full 13-year window.
        assert_eq!(run_out.career_cost, vec![None; 4]);
        assert!(store.contains(&ArtifactKey::new("2019", ArtifactKind::CleanTable)));
    }

    #[test]
    fn second_run_reads_the_cached_clean_table() {
        init_test_logging();
        let store = seeded_store();
        let digest = Digest::new(Some(2019)).expect("digest");

        let first = run(&digest, &store).expect("first run");
        // Poison the raw artifacts: a re-run must not touch them.
        store
            .put(
                &ArtifactKey::new("2019", ArtifactKind::TablesMenu),
                b"<html>gone</html>",
            )
            .unwrap();
        store
            .put(
                &ArtifactKey::new("2019", ArtifactKind::ExpenditureTable),
                b"<html>gone</html>",
            )
            .unwrap();
        let second = run(&digest, &store).expect("second run");
        assert_eq!(first.table, second.table);
    }

    #[test]
    fn missing_caption_is_a_descriptive_error() {
        init_test_logging();
        let store = MemStore::new();
        store
            .put(
                &ArtifactKey::new("2019", ArtifactKind::TablesMenu),
                b"<html><body><ul><li><a href='x.asp'>Other table</a></li></ul></body></html>",
            )
            .unwrap();
        let digest = Digest::new(Some(2019)).expect("digest");
        let err = run(&digest, &store).expect_err("caption absent");
        assert!(err.to_string().contains("not found"));
    }
}
