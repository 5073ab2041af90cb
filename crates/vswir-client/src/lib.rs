#![forbid(unsafe_code)]
//! vswir-client: talks to the VSWIR query, job and admin services.
//!
//! - [`http::HttpClient`] is the transport; credentials are injected through
//!   [`auth::CredentialProvider`] and read on every request.
//! - [`pager`] fetches and re-projects pages and guards against stale
//!   responses.
//! - [`extract`] turns an unpaged result set into a range-scoped extraction job.
//! - [`poller::JobPoller`] follows that job until it completes or fails.

pub mod admin;
pub mod auth;
pub mod error;
pub mod extract;
pub mod http;
pub mod pager;
pub mod poller;
pub mod query;
pub mod sequence;
pub mod service;

pub use error::{Error, Result};
pub use extract::{submit_extraction, ExtractionJob};
pub use http::HttpClient;
pub use pager::{Page, PagedFetcher, Pager};
pub use poller::JobPoller;
pub use service::{JobStatusSource, ViewService};
