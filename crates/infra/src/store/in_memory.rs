use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use inkpost_blog::{Author, Post};
use inkpost_core::{AuthorId, PostId};

use super::{AuthorStore, PostStore, StoreError, StoreResult};

/// In-memory author + post store.
///
/// Intended for tests/dev. Ids are UUIDv7, so `BTreeMap` iteration order is
/// creation order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    authors: RwLock<BTreeMap<AuthorId, Author>>,
    posts: RwLock<BTreeMap<PostId, Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }

    fn user_name_taken(
        authors: &BTreeMap<AuthorId, Author>,
        user_name: &str,
        except: AuthorId,
    ) -> bool {
        authors
            .values()
            .any(|a| a.id != except && a.user_name == user_name)
    }
}

#[async_trait]
impl AuthorStore for InMemoryStore {
    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let authors = self.authors.read().map_err(|_| Self::poisoned())?;
        Ok(authors.values().cloned().collect())
    }

    async fn get_author(&self, id: AuthorId) -> StoreResult<Option<Author>> {
        let authors = self.authors.read().map_err(|_| Self::poisoned())?;
        Ok(authors.get(&id).cloned())
    }

    async fn get_authors(&self, ids: &[AuthorId]) -> StoreResult<Vec<Author>> {
        let authors = self.authors.read().map_err(|_| Self::poisoned())?;
        Ok(ids.iter().filter_map(|id| authors.get(id).cloned()).collect())
    }

    async fn find_author_by_user_name(&self, user_name: &str) -> StoreResult<Option<Author>> {
        let authors = self.authors.read().map_err(|_| Self::poisoned())?;
        Ok(authors.values().find(|a| a.user_name == user_name).cloned())
    }

    async fn insert_author(&self, author: Author) -> StoreResult<()> {
        let mut authors = self.authors.write().map_err(|_| Self::poisoned())?;
        if Self::user_name_taken(&authors, &author.user_name, author.id) {
            return Err(StoreError::DuplicateUserName(author.user_name));
        }
        authors.insert(author.id, author);
        Ok(())
    }

    async fn update_author(&self, author: Author) -> StoreResult<bool> {
        let mut authors = self.authors.write().map_err(|_| Self::poisoned())?;
        if !authors.contains_key(&author.id) {
            return Ok(false);
        }
        if Self::user_name_taken(&authors, &author.user_name, author.id) {
            return Err(StoreError::DuplicateUserName(author.user_name));
        }
        authors.insert(author.id, author);
        Ok(true)
    }

    async fn delete_author(&self, id: AuthorId) -> StoreResult<bool> {
        let mut authors = self.authors.write().map_err(|_| Self::poisoned())?;
        Ok(authors.remove(&id).is_some())
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn list_posts(&self, limit: usize) -> StoreResult<Vec<Post>> {
        let posts = self.posts.read().map_err(|_| Self::poisoned())?;
        Ok(posts.values().take(limit).cloned().collect())
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Option<Post>> {
        let posts = self.posts.read().map_err(|_| Self::poisoned())?;
        Ok(posts.get(&id).cloned())
    }

    async fn insert_post(&self, post: Post) -> StoreResult<()> {
        let mut posts = self.posts.write().map_err(|_| Self::poisoned())?;
        posts.insert(post.id, post);
        Ok(())
    }

    async fn update_post(&self, post: Post) -> StoreResult<bool> {
        let mut posts = self.posts.write().map_err(|_| Self::poisoned())?;
        match posts.get_mut(&post.id) {
            Some(slot) => {
                *slot = post;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: PostId) -> StoreResult<bool> {
        let mut posts = self.posts.write().map_err(|_| Self::poisoned())?;
        Ok(posts.remove(&id).is_some())
    }

    async fn delete_posts_by_author(&self, author: AuthorId) -> StoreResult<u64> {
        let mut posts = self.posts.write().map_err(|_| Self::poisoned())?;
        let before = posts.len();
        posts.retain(|_, p| p.author != author);
        Ok((before - posts.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inkpost_blog::NewPost;

    fn author(user_name: &str) -> Author {
        Author {
            id: AuthorId::new(),
            first_name: Some("Test".into()),
            last_name: "Author".into(),
            user_name: user_name.into(),
        }
    }

    fn post_by(author: AuthorId, title: &str) -> Post {
        NewPost {
            title: title.into(),
            content: "body".into(),
            author,
        }
        .into_post(PostId::new(), Utc::now())
    }

    #[tokio::test]
    async fn insert_enforces_unique_user_name() {
        let store = InMemoryStore::new();
        store.insert_author(author("dup")).await.unwrap();

        let err = store.insert_author(author("dup")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateUserName("dup".into()));
        assert_eq!(store.list_authors().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_enforces_unique_user_name_but_allows_keeping_own() {
        let store = InMemoryStore::new();
        let mut a = author("alice");
        let b = author("bob");
        store.insert_author(a.clone()).await.unwrap();
        store.insert_author(b).await.unwrap();

        a.last_name = "Changed".into();
        assert!(store.update_author(a.clone()).await.unwrap());

        a.user_name = "bob".into();
        let err = store.update_author(a).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUserName(_)));
    }

    #[tokio::test]
    async fn update_of_missing_records_reports_false() {
        let store = InMemoryStore::new();
        assert!(!store.update_author(author("ghost")).await.unwrap());
        assert!(!store.update_post(post_by(AuthorId::new(), "t")).await.unwrap());
    }

    #[tokio::test]
    async fn list_posts_is_capped_and_ordered_by_creation() {
        let store = InMemoryStore::new();
        let owner = AuthorId::new();
        for i in 0..25 {
            store.insert_post(post_by(owner, &format!("post {i}"))).await.unwrap();
        }

        let listed = store.list_posts(20).await.unwrap();
        assert_eq!(listed.len(), 20);
        assert_eq!(listed[0].title, "post 0");
        assert_eq!(listed[19].title, "post 19");
    }

    #[tokio::test]
    async fn delete_posts_by_author_leaves_other_authors_posts() {
        let store = InMemoryStore::new();
        let (x, y) = (AuthorId::new(), AuthorId::new());
        store.insert_post(post_by(x, "x1")).await.unwrap();
        store.insert_post(post_by(x, "x2")).await.unwrap();
        store.insert_post(post_by(y, "y1")).await.unwrap();

        assert_eq!(store.delete_posts_by_author(x).await.unwrap(), 2);
        let remaining = store.list_posts(usize::MAX).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].author, y);
    }

    #[tokio::test]
    async fn get_authors_returns_only_existing() {
        let store = InMemoryStore::new();
        let a = author("a");
        store.insert_author(a.clone()).await.unwrap();

        let found = store.get_authors(&[a.id, AuthorId::new()]).await.unwrap();
        assert_eq!(found, vec![a]);
    }
}
