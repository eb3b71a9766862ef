//! Blog domain module (authors and posts).
//!
//! This crate contains the record shapes, the validated creation/change sets
//! and the response projections, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod author;
pub mod post;
pub mod projection;

pub use author::{Author, AuthorChanges, NewAuthor};
pub use post::{Comment, NewPost, Post, PostChanges, PostWithAuthor};
pub use projection::{AuthorSummary, CreatedAuthor, PostDetail, PostListItem};
