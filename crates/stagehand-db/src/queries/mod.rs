//! Database query modules.
//!
//! - catalog: per-type catalog listing, upsert and sweep

pub mod catalog;
