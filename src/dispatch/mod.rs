//! The request engine behind every declared endpoint: resolution, body
//! parsing, required-field checks, filtering, table aggregation and the
//! per-endpoint request log.

pub mod aggregate;
pub mod fields;
pub mod filter;
pub mod journal;
pub mod parser;
pub mod pipeline;
pub mod resolve;
