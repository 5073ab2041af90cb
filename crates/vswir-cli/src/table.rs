//! Plain-text table rendering for terminal output.

use std::io::{self, Write};

use vswir_core::row::NamedRow;
use vswir_core::summary::{column_label, summarize_value};

/// Widest a rendered cell may get before it is cut.
const MAX_CELL: usize = 40;

fn clip(s: String) -> String {
    if s.chars().count() <= MAX_CELL {
        return s;
    }
    let mut out: String = s.chars().take(MAX_CELL - 1).collect();
    out.push('…');
    out
}

/// Render `rows` as aligned columns: `id`, then every non-geometry column.
pub fn render<W: Write>(out: &mut W, rows: &[NamedRow], summarize: usize) -> io::Result<()> {
    let Some(first) = rows.first() else {
        return writeln!(out, "(no rows)");
    };
    let headers: Vec<String> = first
        .table_columns()
        .into_iter()
        .map(column_label)
        .collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            r.table_values()
                .iter()
                .map(|v| clip(summarize_value(v, summarize)))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row) {
            *w = (*w).max(c.chars().count());
        }
    }

    write_line(out, &headers, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_line(out, &rule, &widths)?;
    for row in &cells {
        write_line(out, row, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> io::Result<()> {
    let mut line = String::new();
    for (i, (c, w)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(c);
        let pad = w.saturating_sub(c.chars().count());
        line.extend(std::iter::repeat(' ').take(pad));
    }
    writeln!(out, "{}", line.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vswir_core::row::project_row;

    #[test]
    fn renders_header_and_rows() {
        let select = vec!["plot_name".to_string(), "geom".to_string(), "pixel_ids".to_string()];
        let rows = vec![project_row(
            &[json!("276-ER18"), json!("POINT(1 2)"), json!([1, 2, 3, 4, 5, 6, 7, 8])],
            &select,
            7,
        )];
        let mut buf = Vec::new();
        render(&mut buf, &rows, 2).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Id  Plot Name"));
        assert!(lines[0].ends_with("Pixel Ids"));
        assert!(lines[2].starts_with("7   276-ER18"));
        assert!(lines[2].ends_with("[1, 2, ..., 7, 8]"));
        assert!(!text.contains("POINT"));
    }

    #[test]
    fn empty_page() {
        let mut buf = Vec::new();
        render(&mut buf, &[], 3).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "(no rows)\n");
    }

    #[test]
    fn long_cells_are_clipped() {
        let s = clip("x".repeat(100));
        assert_eq!(s.chars().count(), MAX_CELL);
        assert!(s.ends_with('…'));
    }
}
