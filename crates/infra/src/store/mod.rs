//! Document storage boundary for authors and posts.
//!
//! The HTTP layer only talks to the [`AuthorStore`] and [`PostStore`] traits.
//! Two implementations exist: [`InMemoryStore`] (tests/dev) and
//! [`MongoStore`] (production).
//!
//! ## Uniqueness of `userName`
//!
//! Callers check `find_author_by_user_name` before writing so that clients get
//! a clean "already taken" answer. That check-then-write is not atomic under
//! concurrent requests, so every implementation also enforces uniqueness on
//! write and reports a violation as [`StoreError::DuplicateUserName`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use inkpost_blog::{Author, Post};
use inkpost_core::{AuthorId, PostId};

use crate::config::{Settings, StorageBackend};

pub mod in_memory;
pub mod mongo;

pub use in_memory::InMemoryStore;
pub use mongo::MongoStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The write would give two authors the same `userName`.
    #[error("userName '{0}' is already taken")]
    DuplicateUserName(String),

    /// Any other failure of the underlying store.
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// All authors, in creation order.
    async fn list_authors(&self) -> StoreResult<Vec<Author>>;

    async fn get_author(&self, id: AuthorId) -> StoreResult<Option<Author>>;

    /// The subset of `ids` that exist. Order is unspecified.
    async fn get_authors(&self, ids: &[AuthorId]) -> StoreResult<Vec<Author>>;

    async fn find_author_by_user_name(&self, user_name: &str) -> StoreResult<Option<Author>>;

    async fn insert_author(&self, author: Author) -> StoreResult<()>;

    /// Replace a stored author. Returns `false` if no author has that id.
    async fn update_author(&self, author: Author) -> StoreResult<bool>;

    /// Returns `false` if no author has that id.
    async fn delete_author(&self, id: AuthorId) -> StoreResult<bool>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// At most `limit` posts, oldest first.
    async fn list_posts(&self, limit: usize) -> StoreResult<Vec<Post>>;

    async fn get_post(&self, id: PostId) -> StoreResult<Option<Post>>;

    async fn insert_post(&self, post: Post) -> StoreResult<()>;

    /// Replace a stored post. Returns `false` if no post has that id.
    async fn update_post(&self, post: Post) -> StoreResult<bool>;

    /// Returns `false` if no post has that id.
    async fn delete_post(&self, id: PostId) -> StoreResult<bool>;

    /// Delete every post referencing `author`. Returns the number deleted.
    async fn delete_posts_by_author(&self, author: AuthorId) -> StoreResult<u64>;
}

#[derive(Clone)]
enum Connection {
    InMemory,
    Mongo(MongoStore),
}

/// Handles to both stores plus the connection they share.
#[derive(Clone)]
pub struct Stores {
    pub authors: Arc<dyn AuthorStore>,
    pub posts: Arc<dyn PostStore>,
    connection: Connection,
}

impl Stores {
    /// Open the store selected by `settings.storage`.
    pub async fn connect(settings: &Settings) -> StoreResult<Self> {
        match settings.storage {
            StorageBackend::Memory => Ok(Self::in_memory()),
            StorageBackend::MongoDb => {
                let store = MongoStore::connect(&settings.database_url, &settings.database_name).await?;
                let shared = Arc::new(store.clone());
                Ok(Self {
                    authors: shared.clone(),
                    posts: shared,
                    connection: Connection::Mongo(store),
                })
            }
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            authors: store.clone(),
            posts: store,
            connection: Connection::InMemory,
        }
    }

    /// Assemble from arbitrary implementations (tests, fault injection).
    pub fn from_parts(authors: Arc<dyn AuthorStore>, posts: Arc<dyn PostStore>) -> Self {
        Self {
            authors,
            posts,
            connection: Connection::InMemory,
        }
    }

    /// Release the underlying connection. Safe to call more than once.
    pub async fn close(&self) {
        if let Connection::Mongo(store) = &self.connection {
            store.close().await;
        }
    }
}
