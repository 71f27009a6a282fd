//! Input helpers: CSV ingest of a design matrix and response.

pub mod ingest;

pub use ingest::*;
