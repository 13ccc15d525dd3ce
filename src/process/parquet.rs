// src/process/parquet.rs
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int32Array};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{BrotliLevel, Compression};
use parquet::file::properties::WriterProperties;

use super::clean::CleanExpenditureTable;

const VALUE_FIELDS: [&str; 9] = [
    "ada_unadjusted_total",
    "ada_unadjusted_current",
    "ada_constant_total",
    "ada_constant_current",
    "enrollment_unadjusted_total",
    "enrollment_unadjusted_current",
    "enrollment_constant_total",
    "enrollment_constant_current",
    "pct_change",
];

fn schema() -> Arc<ArrowSchema> {
    let mut fields = vec![Field::new("year", DataType::Int32, false)];
    fields.extend(
        VALUE_FIELDS
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, true)),
    );
    Arc::new(ArrowSchema::new(fields))
}

fn value_columns(table: &CleanExpenditureTable) -> [&Vec<Option<f64>>; 9] {
    [
        &table.ada_unadjusted_total,
        &table.ada_unadjusted_current,
        &table.ada_constant_total,
        &table.ada_constant_current,
        &table.enrollment_unadjusted_total,
        &table.enrollment_unadjusted_current,
        &table.enrollment_constant_total,
        &table.enrollment_constant_current,
        &table.pct_change,
    ]
}

/// Encode the clean table as a single-batch Parquet buffer.
pub fn to_parquet_bytes(table: &CleanExpenditureTable) -> Result<Vec<u8>> {
    let schema = schema();
    let mut columns: Vec<ArrayRef> = vec![Arc::new(Int32Array::from(table.year.clone()))];
    for column in value_columns(table) {
        columns.push(Arc::new(Float64Array::from(column.clone())));
    }
    let batch =
        RecordBatch::try_new(schema.clone(), columns).context("building clean-table batch")?;

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(
            BrotliLevel::try_new(5).context("brotli level")?,
        ))
        .set_dictionary_enabled(true)
        .build();

    let mut buf = Vec::new();
    let mut writer =
        ArrowWriter::try_new(&mut buf, schema, Some(props)).context("opening parquet writer")?;
    writer.write(&batch).context("writing clean-table batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(buf)
}

/// Decode a buffer produced by [`to_parquet_bytes`].
pub fn from_parquet_bytes(bytes: Vec<u8>) -> Result<CleanExpenditureTable> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))
        .context("opening parquet reader")?
        .build()
        .context("building parquet reader")?;

    let mut year: Vec<i32> = Vec::new();
    let mut values: [Vec<Option<f64>>; 9] = std::array::from_fn(|_| Vec::new());
    for batch in reader {
        let batch = batch.context("reading clean-table batch")?;
        let years = batch
            .column_by_name("year")
            .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
            .ok_or_else(|| anyhow!("cached clean table is missing the year column"))?;
        year.extend(years.values().iter().copied());
        for (i, name) in VALUE_FIELDS.iter().enumerate() {
            let column = batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
                .ok_or_else(|| anyhow!("cached clean table is missing the {name} column"))?;
            values[i].extend(column.iter());
        }
    }
    if year.is_empty() {
        return Err(anyhow!("cached clean table has no rows"));
    }

    let [ada_unadjusted_total, ada_unadjusted_current, ada_constant_total, ada_constant_current, enrollment_unadjusted_total, enrollment_unadjusted_current, enrollment_constant_total, enrollment_constant_current, pct_change] =
        values;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CleanExpenditureTable {
        CleanExpenditureTable {
            year: vec![1930, 1931, 1932],
            ada_unadjusted_total: vec![Some(87.0), Some(88.5), Some(90.0)],
            ada_unadjusted_current: vec![Some(72.0), Some(75.0), Some(78.0)],
            ada_constant_total: vec![Some(1000.0), Some(1100.0), Some(1200.0)],
            ada_constant_current: vec![Some(900.0), Some(950.0), Some(1000.0)],
            enrollment_unadjusted_total: vec![Some(80.0), Some(81.0), Some(82.0)],
            enrollment_unadjusted_current: vec![None, Some(70.0), Some(71.0)],
            enrollment_constant_total: vec![Some(950.0), Some(960.0), None],
            enrollment_constant_current: vec![Some(850.0), Some(860.0), Some(870.0)],
            pct_change: vec![None, Some(0.0555), Some(0.0526)],
        }
    }

    #[test]
    fn round_trip_preserves_rows_and_nulls() {
        let table = sample_table();
        let bytes = to_parquet_bytes(&table).expect("encode");
        let decoded = from_parquet_bytes(bytes).expect("decode");
        assert_eq!(decoded, table);
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(from_parquet_bytes(b"not parquet".to_vec()).is_err());
    }
}
