use anyhow::{Context, Result};
use edscraper::{fetch::Digest, pipeline, process::CostColumn, store::FsStore};
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) configure digest year and store ──────────────────────────
    let year = match env::args().nth(1) {
        Some(arg) => Some(
            arg.parse::<u16>()
                .with_context(|| format!("year argument {arg:?} is not a number"))?,
        ),
        None => None,
    };
    let digest = Digest::new(year)?;
    let store = FsStore::new("data");

    // ─── 3) run the pipeline ─────────────────────────────────────────
    let run = pipeline::run(&digest, &store)?;

    // ─── 4) report the latest full-window career cost ────────────────
    let latest = run
        .table
        .year
        .iter()
        .zip(&run.career_cost)
        .filter_map(|(year, cost)| cost.map(|c| (*year, c)))
        .last();
    match latest {
        Some((graduation_year, cost)) => info!(
            graduation_year,
            cost = format!("${cost:.0}"),
            basis = ?CostColumn::AdaConstantCurrent,
            "trailing 13-year per-pupil cost"
        ),
        None => info!("table spans fewer than 13 years; no full career window"),
    }

    info!("all done");
    Ok(())
}
