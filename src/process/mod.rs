// src/process/mod.rs
pub mod clean;
pub mod parquet;
pub mod raw_table;

pub use clean::{clean, CleanExpenditureTable, CostColumn};
pub use raw_table::RawExpenditureTable;
