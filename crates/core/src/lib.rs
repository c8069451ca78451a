//! Shared domain types for the video catalog.
//!
//! This crate has no I/O. It holds the id/timestamp aliases, the domain
//! error, field-level validation helpers, list filter normalization and the
//! catalog constants (cast member types, ratings, upload rules) used by the
//! repository, event and HTTP layers.

pub mod catalog;
pub mod error;
pub mod filter;
pub mod types;
pub mod validation;
