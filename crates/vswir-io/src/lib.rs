#![forbid(unsafe_code)]
//! vswir-io: columnar decode of query responses and export writers.
//!
//! Decoding yields positional rows in the order the Parquet reader produces
//! them; nothing here re-sorts.

pub mod error;
pub mod readers;
pub mod writers;

pub use error::{Error, Result};
pub use readers::parquet::decode_rows;
pub use writers::csv::{convert_to_csv, CsvWriter};
pub use writers::jsonl::JsonlWriter;
