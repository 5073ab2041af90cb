//! Filter builder: raw user input into a normalized [`FilterSet`].

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::ranges::RangeList;

/// Field whose input is a comma-separated list.
pub const LIST_FIELD: &str = "plot_name";

/// Filter key carrying pixel ranges on extraction requests.
pub const PIXEL_ID_FILTER: &str = "pixel_id";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    List(Vec<String>),
    Ranges(RangeList),
}

/// Normalized filters for one query.
///
/// `geom` is always emitted (possibly `null`) so consumers have a stable key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub fields: BTreeMap<String, FilterValue>,
    pub geom: Option<Value>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&FilterValue> {
        self.fields.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: FilterValue) {
        self.fields.insert(id.into(), value);
    }

    /// Scope the filters to the given pixel ranges (extraction submission).
    pub fn with_pixel_ranges(mut self, ranges: RangeList) -> Self {
        self.fields
            .insert(PIXEL_ID_FILTER.into(), FilterValue::Ranges(ranges));
        self
    }

    /// Non-null entries as a JSON object, or `None` when nothing remains.
    pub fn to_payload(&self) -> Option<serde_json::Map<String, Value>> {
        let mut out = serde_json::Map::new();
        for (k, v) in &self.fields {
            // FilterValue serialization cannot fail.
            if let Ok(v) = serde_json::to_value(v) {
                out.insert(k.clone(), v);
            }
        }
        if let Some(g) = self.geom.as_ref().filter(|g| !g.is_null()) {
            out.insert("geom".into(), g.clone());
        }
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

impl Serialize for FilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry("geom", &self.geom)?;
        map.end()
    }
}

/// Build a [`FilterSet`] from raw form values and optional GeoJSON text.
///
/// Empty values are dropped. `plot_name` is split on commas and each part
/// trimmed. Malformed GeoJSON is logged and ignored; this never fails.
pub fn parse_filters(raw: &BTreeMap<String, String>, geojson: Option<&str>) -> FilterSet {
    let mut filters = FilterSet::new();

    for (key, value) in raw {
        if value.is_empty() {
            continue;
        }
        let v = if key == LIST_FIELD {
            FilterValue::List(value.split(',').map(|p| p.trim().to_string()).collect())
        } else {
            FilterValue::Text(value.clone())
        };
        filters.fields.insert(key.clone(), v);
    }

    if let Some(text) = geojson.filter(|t| !t.is_empty()) {
        match serde_json::from_str::<Value>(text) {
            Ok(v) => filters.geom = Some(v),
            Err(e) => tracing::warn!(error = %e, "ignoring malformed GeoJSON region"),
        }
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::to_ranges;
    use serde_json::json;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_values_are_dropped() {
        let f = parse_filters(&raw(&[("campaign_name", ""), ("sensor_name", "NEON")]), None);
        assert!(f.get("campaign_name").is_none());
        assert_eq!(f.get("sensor_name"), Some(&FilterValue::Text("NEON".into())));
    }

    #[test]
    fn plot_name_becomes_trimmed_list() {
        let f = parse_filters(&raw(&[("plot_name", "276-ER18, 001-ER18 ")]), None);
        assert_eq!(
            f.get("plot_name"),
            Some(&FilterValue::List(vec!["276-ER18".into(), "001-ER18".into()]))
        );
    }

    #[test]
    fn geom_key_is_always_serialized() {
        let f = parse_filters(&BTreeMap::new(), None);
        assert_eq!(serde_json::to_value(&f).unwrap(), json!({"geom": null}));
    }

    #[test]
    fn invalid_geojson_leaves_geom_null() {
        let f = parse_filters(&BTreeMap::new(), Some("{not json"));
        assert!(f.geom.is_none());
    }

    #[test]
    fn valid_geojson_is_parsed() {
        let f = parse_filters(&BTreeMap::new(), Some(r#"{"type":"Polygon","coordinates":[]}"#));
        assert_eq!(f.geom.unwrap()["type"], "Polygon");
    }

    #[test]
    fn payload_omits_null_entries() {
        let f = parse_filters(&BTreeMap::new(), None);
        assert!(f.to_payload().is_none());

        let f = parse_filters(&raw(&[("trait", "lma")]), None);
        assert_eq!(Value::Object(f.to_payload().unwrap()), json!({"trait": "lma"}));
    }

    #[test]
    fn pixel_ranges_serialize_as_pairs() {
        let f = FilterSet::new().with_pixel_ranges(to_ranges(&[1, 2, 5]).unwrap());
        assert_eq!(
            Value::Object(f.to_payload().unwrap()),
            json!({"pixel_id": [[1, 2], [5, 5]]})
        );
    }
}
