//! CSV export of named rows.
//!
//! Every field is quoted, embedded quotes are doubled, object/array cells are
//! JSON-encoded and null cells are empty.

use std::fs::File;
use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;

use vswir_core::row::NamedRow;

use crate::error::{Error, Result};

pub struct CsvWriter<W: Write> {
    inner: csv::Writer<W>,
    // header order fixed by the first batch
    columns: Vec<String>,
}

impl CsvWriter<File> {
    pub fn to_path(path: &str) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        let inner = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);
        Self {
            inner,
            columns: Vec::new(),
        }
    }

    /// Write a header plus one record per row of cells.
    pub fn write_table<I>(&mut self, headers: &[&str], rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        if self.columns.is_empty() {
            self.columns = headers.iter().map(|h| h.to_string()).collect();
            self.inner.write_record(&self.columns)?;
        }
        for row in rows {
            if row.len() != self.columns.len() {
                return Err(Error::Table(format!(
                    "row has {} cells, header has {}",
                    row.len(),
                    self.columns.len()
                )));
            }
            self.inner.write_record(row.iter().map(cell_text))?;
        }
        Ok(())
    }

    /// Write named rows: `id` first, then the plain columns (no `geom`).
    pub fn write_rows(&mut self, rows: &[NamedRow]) -> Result<()> {
        let Some(first) = rows.first() else {
            return Ok(());
        };
        let headers = first.table_columns();
        self.write_table(&headers, rows.iter().map(NamedRow::table_values))
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        self.inner
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

/// Render named rows as a CSV document. Empty input yields an empty string.
pub fn convert_to_csv(rows: &[NamedRow]) -> Result<String> {
    let mut w = CsvWriter::to_writer(Vec::new());
    w.write_rows(rows)?;
    bytes_to_string(w.finish()?)
}

/// Render an arbitrary table as a CSV document.
pub fn table_to_csv(headers: &[&str], rows: Vec<Vec<Value>>) -> Result<String> {
    let mut w = CsvWriter::to_writer(Vec::new());
    w.write_table(headers, rows)?;
    bytes_to_string(w.finish()?)
}

fn bytes_to_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::Table(e.to_string()))
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => v.to_string(),
        other => other.to_string(),
    }
}
