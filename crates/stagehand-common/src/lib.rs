//! Stagehand-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across stagehand:
//!
//! - **Core Types**: the [`MediaType`] enum naming the three catalogued kinds
//! - **Path Utilities**: extension helpers and base-directory relative paths
//! - **Error Handling**: the catalog [`Error`] type and its result alias
//!
//! # Examples
//!
//! ```
//! use stagehand_common::{MediaType, Error, Result};
//! use stagehand_common::paths::lowercase_extension;
//! use std::path::Path;
//!
//! let media_type: MediaType = "shows".parse().unwrap();
//! assert_eq!(media_type, MediaType::Shows);
//!
//! assert_eq!(lowercase_extension(Path::new("Movie.MKV")).as_deref(), Some("mkv"));
//!
//! fn example() -> Result<()> {
//!     Err(Error::database("no such table: mm_movies"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
