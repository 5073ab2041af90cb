//! Streaming NDJSON writer.

use std::fs::File;
use std::io::{BufWriter, Write};

use serde_json::{Map, Value};

use crate::error::Result;
use vswir_core::row::{NamedRow, ID_COLUMN};

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
    include_geom: bool,
}

impl JsonlWriter<File> {
    pub fn to_path(path: &str, include_geom: bool) -> Result<Self> {
        let f = File::create(path)?;
        Ok(Self::to_writer(f, include_geom))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W, include_geom: bool) -> Self {
        Self {
            writer: BufWriter::new(writer),
            include_geom,
        }
    }

    /// Write one JSON object per row.
    pub fn write_rows(&mut self, rows: &[NamedRow]) -> Result<()> {
        for row in rows {
            let obj = if self.include_geom {
                row.to_json()
            } else {
                let mut obj = Map::new();
                obj.insert(ID_COLUMN.into(), Value::from(row.id));
                for (k, v) in &row.columns {
                    obj.insert(k.clone(), v.clone());
                }
                Value::Object(obj)
            };
            let line = serde_json::to_string(&obj)?;
            writeln!(self.writer, "{}", line)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vswir_core::row::project_page;

    #[test]
    fn one_object_per_line() {
        let select: Vec<String> = ["a", "geom"].iter().map(|s| s.to_string()).collect();
        let rows = project_page(
            &[
                vec![json!(1), json!("POINT(0 1)")],
                vec![json!(2), json!(null)],
            ],
            &select,
            0,
        );

        let mut w = JsonlWriter::to_writer(Vec::new(), true);
        w.write_rows(&rows).unwrap();
        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["geom"]["type"], "Point");
        assert_eq!(lines[1], json!({"id": 1, "a": 2}));
    }

    #[test]
    fn geom_can_be_left_out() {
        let select: Vec<String> = ["geom"].iter().map(|s| s.to_string()).collect();
        let rows = project_page(&[vec![json!("POINT(0 1)")]], &select, 3);
        let mut w = JsonlWriter::to_writer(Vec::new(), false);
        w.write_rows(&rows).unwrap();
        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(text.trim(), r#"{"id":3}"#);
    }
}
