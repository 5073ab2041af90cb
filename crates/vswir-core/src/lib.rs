#![forbid(unsafe_code)]
//! vswir-core: views, filters, row re-projection, geometry, pixel ranges and
//! job state for the VSWIR data client.
//!
//! Everything here is pure. Network access lives in `vswir-client`, columnar
//! decoding and export writers in `vswir-io`.

pub mod claims;
pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod id;
pub mod job;
pub mod prelude;
pub mod ranges;
pub mod row;
pub mod summary;
pub mod view;

pub use error::{Error, Result};
