//! Retrieve, clean, and aggregate the Digest of Education Statistics table of
//! per-pupil expenditures in public elementary and secondary schools.
//!
//! The pipeline is strictly sequential: fetch the digest tables menu, locate
//! the per-pupil expenditure table by caption, fetch and parse the table,
//! clean it into a contiguous annually-indexed series, and derive trailing
//! K-12 career costs. Raw HTML and the cleaned Parquet artifact are cached
//! through an [`store::ArtifactStore`] keyed by digest year, so re-runs skip
//! every step whose output already exists.

pub mod cost;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod store;
