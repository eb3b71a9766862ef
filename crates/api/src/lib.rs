//! HTTP API: server lifecycle, routing, and request/response mapping.

pub mod app;
pub mod middleware;
pub mod server;

pub use server::{ServerHandle, start, start_with_stores};
