//! Convenient re-exports for downstream crates.

pub use crate::config::ClientConfig;
pub use crate::error::{Error, Result};
pub use crate::filter::{parse_filters, FilterSet, FilterValue};
pub use crate::geometry::{FeatureCollection, Geometry, RawGeometry};
pub use crate::id::{JobId, RequestSeq};
pub use crate::job::{JobProgress, JobState, JobStatusBody, JobStatusReport};
pub use crate::ranges::{extract_pixel_ids, to_ranges, PixelRange, RangeList};
pub use crate::row::{project_page, project_row, NamedRow, RawRow};
pub use crate::view::{ViewCatalog, ViewDescriptor};
