//! Spectra extraction submission.
//!
//! The full (unpaged) result set of the current filters is fetched, its
//! `pixel_ids` are compressed into ranges and a job is submitted against
//! `extracted_spectra_view`.

use vswir_core::filter::FilterSet;
use vswir_core::id::JobId;
use vswir_core::ranges::{extract_pixel_ids, to_ranges, RangeList};
use vswir_core::view::ViewDescriptor;

use crate::error::{Error, Result};
use crate::pager::PagedFetcher;
use crate::query::QueryPayload;
use crate::service::ViewService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    pub job_id: JobId,
    pub ranges: RangeList,
    pub pixel_count: usize,
}

pub async fn submit_extraction<S>(
    fetcher: &PagedFetcher<S>,
    view: &ViewDescriptor,
    filters: &FilterSet,
) -> Result<ExtractionJob>
where
    S: ViewService + ?Sized,
{
    if !view.supports_extraction() {
        return Err(Error::NotExtractable(view.name.clone()));
    }

    let rows = fetcher.fetch_raw(view, filters, None, 0).await?;
    let ids = extract_pixel_ids(&rows, &view.select_columns);
    if ids.is_empty() {
        return Err(Error::NoPixelIds);
    }

    let ranges = to_ranges(&ids)?;
    tracing::info!(
        view = %view.name,
        rows = rows.len(),
        pixels = ids.len(),
        ranges = ranges.len(),
        "submitting extraction"
    );

    let payload = QueryPayload::extraction(&FilterSet::new().with_pixel_ranges(ranges.clone()));
    let job_id = fetcher.service().submit_job(&payload).await?;
    tracing::info!(%job_id, "extraction job accepted");

    Ok(ExtractionJob {
        job_id,
        ranges,
        pixel_count: ids.len(),
    })
}
