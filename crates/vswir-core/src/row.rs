//! Positional wire rows and their named re-projection.

use serde_json::{Map, Value};

use crate::geometry::{feature_collection, FeatureCollection, Geometry, RawGeometry, GEOM_COLUMN};

/// One decoded row, positionally aligned to the view's select columns.
pub type RawRow = Vec<Value>;

/// Name of the client-assigned display key.
pub const ID_COLUMN: &str = "id";

/// A row re-projected onto column names.
///
/// `id` is assigned by the client (`page_offset + index`), it is not server
/// data. `geom` is kept apart from the plain table columns: the parsed shape
/// feeds the map overlay, `geom_raw` keeps the cell as the server sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRow {
    pub id: u64,
    pub columns: Vec<(String, Value)>,
    pub geom: Option<Geometry>,
    pub geom_raw: Option<Value>,
}

impl NamedRow {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Column names in table order: `id` first, `geom` excluded.
    pub fn table_columns(&self) -> Vec<&str> {
        std::iter::once(ID_COLUMN)
            .chain(self.columns.iter().map(|(k, _)| k.as_str()))
            .collect()
    }

    /// Table cells in [`NamedRow::table_columns`] order.
    pub fn table_values(&self) -> Vec<Value> {
        std::iter::once(Value::from(self.id))
            .chain(self.columns.iter().map(|(_, v)| v.clone()))
            .collect()
    }

    /// JSON object form, including `geom` when present. Geometry the parser
    /// could not read is emitted as the original cell.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(ID_COLUMN.into(), Value::from(self.id));
        for (k, v) in &self.columns {
            obj.insert(k.clone(), v.clone());
        }
        let geom = match (&self.geom, &self.geom_raw) {
            (Some(g), _) => Some(g.to_value()),
            (None, Some(raw)) => Some(raw.clone()),
            (None, None) => None,
        };
        if let Some(g) = geom {
            obj.insert(GEOM_COLUMN.into(), g);
        }
        Value::Object(obj)
    }
}

/// Re-project one positional row.
///
/// Missing trailing cells become `null`. A view column literally named `id`
/// is shadowed by the synthetic id.
pub fn project_row(row: &[Value], select_columns: &[String], id: u64) -> NamedRow {
    let mut columns = Vec::with_capacity(select_columns.len());
    let mut geom = None;
    let mut geom_raw = None;

    for (idx, name) in select_columns.iter().enumerate() {
        let cell = row.get(idx).cloned().unwrap_or(Value::Null);
        if name == GEOM_COLUMN {
            geom = RawGeometry::from_value(&cell).and_then(|raw| {
                let resolved = raw.resolve();
                if resolved.is_none() {
                    tracing::debug!(row = id, "unparsable geometry left off the overlay");
                }
                resolved
            });
            if !cell.is_null() {
                geom_raw = Some(cell);
            }
        } else if name == ID_COLUMN {
            tracing::trace!(row = id, "view id column shadowed by display key");
        } else {
            columns.push((name.clone(), cell));
        }
    }

    NamedRow {
        id,
        columns,
        geom,
        geom_raw,
    }
}

/// Re-project a whole page, numbering rows from `offset`.
pub fn project_page(rows: &[RawRow], select_columns: &[String], offset: u64) -> Vec<NamedRow> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| project_row(row, select_columns, offset + idx as u64))
        .collect()
}

/// Map overlay for a page, or `None` when the view has no `geom` column or
/// every row's geometry is null.
pub fn page_overlay(
    raw: &[RawRow],
    named: &[NamedRow],
    select_columns: &[String],
) -> Option<FeatureCollection> {
    let geom_idx = select_columns.iter().position(|c| c == GEOM_COLUMN)?;
    let any_present = raw
        .iter()
        .any(|row| row.get(geom_idx).is_some_and(|v| !v.is_null()));
    if !any_present {
        return None;
    }
    Some(feature_collection(named.iter().map(|r| r.geom.as_ref())))
}
