//! Static view configuration.
//!
//! A view is a named, server-defined virtual table. Rows coming back from a
//! view are positional; `select_columns` gives each position its name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ranges::PIXEL_IDS_COLUMN;

/// View used to submit spectral extraction jobs.
pub const EXTRACTION_VIEW: &str = "extracted_spectra_view";

/// View selected when none is given.
pub const DEFAULT_VIEW: &str = "plot_pixels_mv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub kind: String,
    #[serde(default)]
    pub placeholder: String,
}

fn default_field_type() -> String {
    "text".into()
}

impl FilterField {
    fn text(id: &str, label: &str, placeholder: &str) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: default_field_type(),
            placeholder: placeholder.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub name: String,
    pub select_columns: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FilterField>,
    /// Whether the "extract spectra" action applies to this view.
    #[serde(default = "default_extractable")]
    pub extractable: bool,
}

fn default_extractable() -> bool {
    true
}

impl ViewDescriptor {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.select_columns.iter().position(|c| c == name)
    }

    /// Extraction needs the flag and a pixel id column to read from.
    pub fn supports_extraction(&self) -> bool {
        self.extractable && self.column_index(PIXEL_IDS_COLUMN).is_some()
    }

    pub fn filter_field(&self, id: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.id == id)
    }

    /// Reject raw filter ids this view does not declare.
    pub fn check_filter_fields<'a, I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for id in ids {
            if self.filter_field(id).is_none() {
                return Err(Error::UnknownFilter {
                    view: self.name.clone(),
                    field: id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Set of known views, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewCatalog {
    views: BTreeMap<String, ViewDescriptor>,
}

impl ViewCatalog {
    pub fn new(views: impl IntoIterator<Item = ViewDescriptor>) -> Self {
        Self {
            views: views.into_iter().map(|v| (v.name.clone(), v)).collect(),
        }
    }

    /// Parse a catalog from a JSON array of view descriptors.
    pub fn from_json(text: &str) -> Result<Self> {
        let views: Vec<ViewDescriptor> = serde_json::from_str(text)?;
        if views.is_empty() {
            return Err(Error::Config("view catalog is empty".into()));
        }
        for v in &views {
            if v.select_columns.is_empty() {
                return Err(Error::Config(format!(
                    "view '{}' has no select columns",
                    v.name
                )));
            }
        }
        Ok(Self::new(views))
    }

    pub fn get(&self, name: &str) -> Result<&ViewDescriptor> {
        self.views
            .get(name)
            .ok_or_else(|| Error::UnknownView(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewDescriptor> {
        self.views.values()
    }

    /// The views served by the VSWIR query API.
    pub fn builtin() -> Self {
        let plot_name = FilterField::text(
            "plot_name",
            "Plot Name (comma-separated):",
            "e.g., 276-ER18,001-ER18",
        );
        let campaign = FilterField::text("campaign_name", "Campaign Name:", "e.g., East River 2018");
        let start = FilterField::text("start_date", "Start Date:", "YYYY-MM-DD");
        let end = FilterField::text("end_date", "End Date:", "YYYY-MM-DD");

        let plot_pixels = ViewDescriptor {
            name: "plot_pixels_mv".into(),
            select_columns: columns(&[
                "plot_id",
                "plot_name",
                "campaign_name",
                "sensor_name",
                "granule_id",
                "granule_date",
                "pixel_ids",
                "geom",
            ]),
            filters: vec![
                plot_name.clone(),
                campaign.clone(),
                FilterField::text("sensor_name", "Sensor Name:", "e.g., NEON AIS 1"),
                FilterField::text("granule_id", "Granule ID:", "e.g., NIS01_20180621_172130"),
                start.clone(),
                end.clone(),
            ],
            extractable: true,
        };

        let insitu = ViewDescriptor {
            name: "insitu_sample_trait_mv".into(),
            select_columns: columns(&[
                "campaign_name",
                "site_id",
                "plot_name",
                "sample_name",
                "collection_date",
                "trait",
                "value",
                "units",
                "method",
                "handling",
                "error",
                "error_type",
                "taxa",
                "veg_or_cover_type",
                "phenophase",
                "sample_fc_class",
                "sample_fc_percent",
                "plant_status",
                "plot_veg_type",
                "subplot_cover_method",
                "floristic_survey",
                "plot_method",
                "geom",
            ]),
            filters: vec![
                campaign,
                FilterField::text("site_id", "Site ID:", "e.g., ER"),
                plot_name.clone(),
                FilterField::text("sample_name", "Sample Name:", "e.g., SAMPLE001"),
                FilterField::text("collection_date", "Collection Date:", "YYYY-MM-DD"),
                FilterField::text("trait", "Trait:", "e.g., leaf_area, chlorophyll"),
                FilterField::text("taxa", "Taxa:", "e.g., Salix planifolia"),
                FilterField::text(
                    "veg_or_cover_type",
                    "Vegetation/Cover Type:",
                    "e.g., shrub, forb",
                ),
                FilterField::text("phenophase", "Phenophase:", "e.g., flowering, senescent"),
                FilterField::text("plant_status", "Plant Status:", "e.g., live, dead"),
                FilterField::text("plot_veg_type", "Plot Vegetation Type:", "e.g., riparian"),
                start.clone(),
                end.clone(),
            ],
            extractable: false,
        };

        let spectra = ViewDescriptor {
            name: "pixel_spectra_mv".into(),
            select_columns: columns(&[
                "plot_name",
                "granule_id",
                "granule_date",
                "pixel_id",
                "radiance",
            ]),
            filters: vec![
                plot_name,
                FilterField::text("granule_id", "Granule ID:", "e.g., NIS01_20180621_172130"),
                start,
                end,
            ],
            extractable: false,
        };

        Self::new([plot_pixels, insitu, spectra])
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
