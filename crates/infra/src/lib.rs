//! Infrastructure layer: configuration and document storage.

pub mod config;
pub mod store;

pub use config::{ConfigError, Settings, StorageBackend};
pub use store::{AuthorStore, InMemoryStore, MongoStore, PostStore, StoreError, StoreResult, Stores};
