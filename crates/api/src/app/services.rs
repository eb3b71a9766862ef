//! Service handles shared by all handlers.

use std::collections::HashMap;
use std::sync::Arc;

use inkpost_blog::{Author, Post, PostWithAuthor};
use inkpost_core::AuthorId;
use inkpost_infra::{AuthorStore, PostStore, Stores};

use crate::app::errors::{self, ApiError};

/// Maximum number of posts returned by the listing endpoint.
pub const POST_LIST_LIMIT: usize = 20;

#[derive(Clone)]
pub struct AppServices {
    stores: Stores,
}

impl AppServices {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub fn authors(&self) -> &Arc<dyn AuthorStore> {
        &self.stores.authors
    }

    pub fn posts(&self) -> &Arc<dyn PostStore> {
        &self.stores.posts
    }

    /// Fails with a conflict if another author already uses `user_name`.
    ///
    /// This is check-then-write: a concurrent request can still claim the
    /// name in between. The store's own uniqueness check catches that case.
    pub async fn ensure_user_name_available(
        &self,
        user_name: &str,
        owner: Option<AuthorId>,
    ) -> Result<(), ApiError> {
        match self.authors().find_author_by_user_name(user_name).await? {
            Some(existing) if Some(existing.id) != owner => {
                Err(ApiError::Conflict(errors::user_name_taken(user_name)))
            }
            _ => Ok(()),
        }
    }

    /// Join one post with its author.
    ///
    /// A post whose author is gone is a broken invariant (author deletion
    /// removes its posts first), reported as an internal error.
    pub async fn resolve_post(&self, post: Post) -> Result<PostWithAuthor, ApiError> {
        let (post_id, author_id) = (post.id, post.author);
        self.authors()
            .get_author(author_id)
            .await?
            .and_then(|author| PostWithAuthor::new(post, author))
            .ok_or_else(|| {
                ApiError::Internal(format!(
                    "post {post_id} references missing author {author_id}"
                ))
            })
    }

    /// Join a batch of posts with their authors using a single author lookup.
    /// Posts whose author is gone are left out and logged.
    pub async fn resolve_posts(&self, posts: Vec<Post>) -> Result<Vec<PostWithAuthor>, ApiError> {
        let mut ids: Vec<AuthorId> = posts.iter().map(|p| p.author).collect();
        ids.sort();
        ids.dedup();

        let authors: HashMap<AuthorId, Author> = self
            .authors()
            .get_authors(&ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(posts
            .into_iter()
            .filter_map(|post| match authors.get(&post.author) {
                Some(author) => PostWithAuthor::new(post, author.clone()),
                None => {
                    tracing::warn!(
                        post_id = %post.id,
                        author_id = %post.author,
                        "skipping post whose author no longer exists"
                    );
                    None
                }
            })
            .collect())
    }
}
