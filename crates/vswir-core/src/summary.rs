//! Compact cell rendering for table display.

use serde_json::Value;

/// Placeholder shown for null cells.
pub const NULL_CELL: &str = "—";

/// Render a cell for a table. Long arrays keep `n` items from each end.
pub fn summarize_value(v: &Value, n: usize) -> String {
    match v {
        Value::Null => NULL_CELL.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.len() > 2 * n => {
            let head: Vec<String> = items[..n].iter().map(plain).collect();
            let tail: Vec<String> = items[items.len() - n..].iter().map(plain).collect();
            format!("[{}, ..., {}]", head.join(", "), tail.join(", "))
        }
        Value::Array(_) | Value::Object(_) => v.to_string(),
        other => other.to_string(),
    }
}

fn plain(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `plot_name` -> `Plot Name`.
pub fn column_label(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_arrays_are_elided() {
        assert_eq!(summarize_value(&json!([1, 2, 3, 4, 5, 6]), 2), "[1, 2, ..., 5, 6]");
        assert_eq!(summarize_value(&json!([1, 2, 3, 4]), 2), "[1,2,3,4]");
    }

    #[test]
    fn scalars_and_null() {
        assert_eq!(summarize_value(&Value::Null, 2), "—");
        assert_eq!(summarize_value(&json!("x"), 2), "x");
        assert_eq!(summarize_value(&json!(1.5), 2), "1.5");
        assert_eq!(summarize_value(&json!({"a": 1}), 2), r#"{"a":1}"#);
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(column_label("plot_name"), "Plot Name");
        assert_eq!(column_label("id"), "Id");
    }
}
