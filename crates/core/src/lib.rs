//! `inkpost-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the shared error model and strongly-typed record identifiers.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AuthorId, PostId};
