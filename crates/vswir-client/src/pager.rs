//! Paged retrieval of view rows.
//!
//! [`PagedFetcher`] turns one query into a [`Page`]: decoded, re-projected
//! rows plus an optional map overlay. [`Pager`] keeps the caller's offset and
//! discards pages that arrive after a newer request was issued.

use std::sync::Arc;

use vswir_core::filter::FilterSet;
use vswir_core::geometry::FeatureCollection;
use vswir_core::id::RequestSeq;
use vswir_core::row::{page_overlay, project_page, NamedRow, RawRow};
use vswir_core::view::ViewDescriptor;

use crate::error::Result;
use crate::query::QueryPayload;
use crate::sequence::RequestSequencer;
use crate::service::ViewService;

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub offset: u64,
    pub rows: Vec<NamedRow>,
    pub geojson: Option<FeatureCollection>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct PagedFetcher<S: ?Sized> {
    service: Arc<S>,
}

impl<S: ?Sized> Clone for PagedFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: ViewService + ?Sized> PagedFetcher<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Positional rows in decoder order. `limit = None` fetches everything.
    pub async fn fetch_raw(
        &self,
        view: &ViewDescriptor,
        filters: &FilterSet,
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<RawRow>> {
        let payload = QueryPayload::page(view, filters, limit, offset);
        let bytes = self.service.query_view(&payload).await?;
        let rows = vswir_io::decode_rows(bytes)?;
        tracing::debug!(view = %view.name, offset, rows = rows.len(), "fetched rows");
        Ok(rows)
    }

    pub async fn fetch(
        &self,
        view: &ViewDescriptor,
        filters: &FilterSet,
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Page> {
        let raw = self.fetch_raw(view, filters, limit, offset).await?;
        let rows = project_page(&raw, &view.select_columns, offset);
        let geojson = page_overlay(&raw, &rows, &view.select_columns);
        Ok(Page {
            offset,
            rows,
            geojson,
        })
    }
}

/// A page request in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: RequestSeq,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct Pager {
    page_size: u64,
    offset: u64,
    has_more: bool,
    sequencer: RequestSequencer,
}

impl Pager {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
            offset: 0,
            has_more: true,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Offset of the last accepted page.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    /// Start over from the first page (new filters).
    pub fn begin_apply(&self) -> PageRequest {
        self.begin_at(0)
    }

    pub fn begin_next(&self) -> PageRequest {
        self.begin_at(self.offset + self.page_size)
    }

    pub fn begin_at(&self, offset: u64) -> PageRequest {
        PageRequest {
            ticket: self.sequencer.issue(),
            offset,
            limit: self.page_size,
        }
    }

    /// Record a completed page. Returns `false`, leaving state untouched,
    /// when a newer request has been issued since `req`.
    pub fn accept(&mut self, req: PageRequest, page: &Page) -> bool {
        if !self.sequencer.is_current(req.ticket) {
            tracing::debug!(ticket = %req.ticket, offset = req.offset, "discarding stale page");
            return false;
        }
        self.offset = req.offset;
        self.has_more = !page.is_empty();
        true
    }

    pub async fn run<S>(
        &mut self,
        fetcher: &PagedFetcher<S>,
        req: PageRequest,
        view: &ViewDescriptor,
        filters: &FilterSet,
    ) -> Result<Option<Page>>
    where
        S: ViewService + ?Sized,
    {
        let page = fetcher
            .fetch(view, filters, Some(req.limit), req.offset)
            .await?;
        Ok(self.accept(req, &page).then_some(page))
    }

    pub async fn apply<S>(
        &mut self,
        fetcher: &PagedFetcher<S>,
        view: &ViewDescriptor,
        filters: &FilterSet,
    ) -> Result<Option<Page>>
    where
        S: ViewService + ?Sized,
    {
        let req = self.begin_apply();
        self.run(fetcher, req, view, filters).await
    }

    pub async fn next<S>(
        &mut self,
        fetcher: &PagedFetcher<S>,
        view: &ViewDescriptor,
        filters: &FilterSet,
    ) -> Result<Option<Page>>
    where
        S: ViewService + ?Sized,
    {
        let req = self.begin_next();
        self.run(fetcher, req, view, filters).await
    }
}
