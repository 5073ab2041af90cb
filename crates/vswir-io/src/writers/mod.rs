//! Export writers for named rows.

pub mod csv;
pub mod jsonl;
