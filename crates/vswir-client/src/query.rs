//! Request bodies for `POST /views/{view}`.

use serde::Serialize;
use serde_json::{Map, Value};

use vswir_core::filter::FilterSet;
use vswir_core::view::{ViewDescriptor, EXTRACTION_VIEW};

/// Response encoding requested from the query service.
pub const FORMAT_PARQUET: &str = "parquet";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPayload {
    pub view: String,
    pub format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Absent means "no paging": the whole result set is returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Map<String, Value>>,
    pub debug: bool,
}

impl QueryPayload {
    /// One page (or, with `limit = None`, the full result) of a view.
    pub fn page(view: &ViewDescriptor, filters: &FilterSet, limit: Option<u64>, offset: u64) -> Self {
        Self {
            view: view.name.clone(),
            format: FORMAT_PARQUET,
            select: Some(view.select_columns.clone()),
            offset: Some(offset),
            limit,
            filters: filters.to_payload(),
            debug: true,
        }
    }

    /// Extraction submission; `filters` is expected to carry `pixel_id` ranges.
    pub fn extraction(filters: &FilterSet) -> Self {
        Self {
            view: EXTRACTION_VIEW.to_string(),
            format: FORMAT_PARQUET,
            select: None,
            offset: None,
            limit: None,
            filters: filters.to_payload(),
            debug: true,
        }
    }
}
