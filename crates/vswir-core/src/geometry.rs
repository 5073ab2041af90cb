//! Geometry ingestion and the GeoJSON map overlay.
//!
//! The `geom` column arrives either as WKT text or as an already structured
//! GeoJSON geometry. Both are resolved once, at ingestion, into [`Geometry`].
//! Only `POINT(x y)` and single-ring `POLYGON((...))` WKT are understood.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Column name that carries per-row geometry.
pub const GEOM_COLUMN: &str = "geom";

/// Geometry as it appears on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
    Wkt(String),
    Structured(Value),
}

impl RawGeometry {
    /// Classify a cell value. `null` (and other non-geometry scalars) yield `None`.
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) => Some(RawGeometry::Wkt(s.clone())),
            Value::Object(_) => Some(RawGeometry::Structured(v.clone())),
            _ => None,
        }
    }

    /// Resolve into the canonical representation, or `None` when unparsable.
    pub fn resolve(self) -> Option<Geometry> {
        match self {
            RawGeometry::Wkt(text) => parse_wkt(&text),
            RawGeometry::Structured(Value::Object(obj)) => {
                if obj.get("type").and_then(Value::as_str).is_some() {
                    Some(Geometry(obj))
                } else {
                    None
                }
            }
            RawGeometry::Structured(_) => None,
        }
    }
}

/// A GeoJSON geometry object. Always carries a string `type` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geometry(Map<String, Value>);

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Self::from_parts("Point", json!([x, y]))
    }

    pub fn polygon(ring: Vec<[f64; 2]>) -> Self {
        Self::from_parts("Polygon", json!([ring]))
    }

    fn from_parts(kind: &str, coordinates: Value) -> Self {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(kind.into()));
        obj.insert("coordinates".into(), coordinates);
        Geometry(obj)
    }

    pub fn kind(&self) -> &str {
        self.0.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn coordinates(&self) -> Option<&Value> {
        self.0.get("coordinates")
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            kind: "Feature".into(),
            geometry,
            properties: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".into(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Build an overlay from resolved geometries; `None` entries are dropped.
pub fn feature_collection<'a, I>(geoms: I) -> FeatureCollection
where
    I: IntoIterator<Item = Option<&'a Geometry>>,
{
    let features = geoms
        .into_iter()
        .flatten()
        .cloned()
        .map(Feature::new)
        .collect();
    FeatureCollection::new(features)
}

/// Parse the two supported WKT shapes. An `SRID=...;` prefix is tolerated.
pub fn parse_wkt(text: &str) -> Option<Geometry> {
    let mut s = text.trim();
    if let Some(idx) = s.find(';') {
        if s[..idx].trim().to_ascii_uppercase().starts_with("SRID=") {
            s = s[idx + 1..].trim_start();
        }
    }

    if let Some(body) = strip_keyword(s, "POINT") {
        let inner = unwrap_parens(body)?;
        let [x, y] = parse_pair(inner)?;
        return Some(Geometry::point(x, y));
    }

    if let Some(body) = strip_keyword(s, "POLYGON") {
        let outer = unwrap_parens(body)?;
        let ring = unwrap_parens(outer)?;
        // A second ring means holes, which are not supported.
        if ring.contains('(') || ring.contains(')') {
            return None;
        }
        let coords = ring
            .split(',')
            .map(parse_pair)
            .collect::<Option<Vec<_>>>()?;
        if coords.is_empty() {
            return None;
        }
        return Some(Geometry::polygon(coords));
    }

    None
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let head = s.get(..keyword.len())?;
    if head.eq_ignore_ascii_case(keyword) {
        Some(s[keyword.len()..].trim_start())
    } else {
        None
    }
}

fn unwrap_parens(s: &str) -> Option<&str> {
    let s = s.trim();
    let inner = s.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.trim())
}

fn parse_pair(s: &str) -> Option<[f64; 2]> {
    let mut parts = s.split_whitespace();
    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some([x, y])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point() {
        let g = parse_wkt("POINT(-106.95 38.92)").unwrap();
        assert_eq!(g.kind(), "Point");
        assert_eq!(g.coordinates().unwrap(), &json!([-106.95, 38.92]));
    }

    #[test]
    fn point_is_case_and_space_insensitive() {
        let g = parse_wkt("  point ( 1.5   2 ) ").unwrap();
        assert_eq!(g.coordinates().unwrap(), &json!([1.5, 2.0]));
    }

    #[test]
    fn parses_single_ring_polygon() {
        let g = parse_wkt("POLYGON((0 0, 1 0, 1 1, 0 0))").unwrap();
        assert_eq!(g.kind(), "Polygon");
        assert_eq!(
            g.coordinates().unwrap(),
            &json!([[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]])
        );
    }

    #[test]
    fn srid_prefix_is_ignored() {
        assert!(parse_wkt("SRID=4326;POINT(1 2)").is_some());
    }

    #[test]
    fn holes_and_other_shapes_are_unsupported() {
        assert!(parse_wkt("POLYGON((0 0, 1 0, 1 1, 0 0),(0.2 0.2, 0.3 0.2, 0.2 0.2))").is_none());
        assert!(parse_wkt("LINESTRING(0 0, 1 1)").is_none());
        assert!(parse_wkt("POINT(a b)").is_none());
        assert!(parse_wkt("").is_none());
    }

    #[test]
    fn structured_geometry_passes_through() {
        let v = json!({"type": "Point", "coordinates": [3.0, 4.0]});
        let g = RawGeometry::from_value(&v).unwrap().resolve().unwrap();
        assert_eq!(g.to_value(), v);
    }

    #[test]
    fn structured_without_type_is_dropped() {
        let v = json!({"coordinates": [3.0, 4.0]});
        assert!(RawGeometry::from_value(&v).unwrap().resolve().is_none());
        assert!(RawGeometry::from_value(&Value::Null).is_none());
    }

    #[test]
    fn collection_skips_missing_geometry() {
        let a = Geometry::point(0.0, 0.0);
        let fc = feature_collection(vec![Some(&a), None, Some(&a)]);
        assert_eq!(fc.len(), 2);
        let v = serde_json::to_value(&fc).unwrap();
        assert_eq!(v["type"], "FeatureCollection");
        assert_eq!(v["features"][0]["type"], "Feature");
        assert_eq!(v["features"][0]["properties"], json!({}));
    }
}
