//! Stagehand - media file classification and catalog reconciliation
//!
//! This library crate exposes the configuration, metadata refinement and
//! catalog manager used by the `stagehand` binary.

pub mod config;
pub mod manager;
pub mod metadata;
