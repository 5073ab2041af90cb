//! Readers turning response bodies into positional rows.

pub mod parquet;
