//! VSWIR data client.
//!
//! Facade over the workspace crates; integration tests and benches build
//! against this package.

pub use vswir_client;
pub use vswir_core;
pub use vswir_io;
