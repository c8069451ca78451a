//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Validate` input DTO read from the request payload, shared by
//!   store and (full-record) update
//! - A list filter with the resource-specific query parameters

pub mod cast_member;
pub mod category;
pub mod genre;
pub mod video;
