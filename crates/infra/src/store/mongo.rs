//! MongoDB-backed store.
//!
//! Two collections: `authors` and `posts`. Documents use the string form of
//! the domain ids as `_id`, and `posts.author` holds the author's id string.
//! `authors.userName` carries a unique index, created at connect time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use inkpost_blog::{Author, Comment, Post};
use inkpost_core::{AuthorId, PostId};

use super::{AuthorStore, PostStore, StoreError, StoreResult};

const AUTHORS: &str = "authors";
const POSTS: &str = "posts";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    last_name: String,
    user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommentDocument {
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    content: String,
    author: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created: DateTime<Utc>,
    #[serde(default)]
    comments: Vec<CommentDocument>,
}

impl From<&Author> for AuthorDocument {
    fn from(a: &Author) -> Self {
        Self {
            id: a.id.to_string(),
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            user_name: a.user_name.clone(),
        }
    }
}

impl TryFrom<AuthorDocument> for Author {
    type Error = StoreError;

    fn try_from(d: AuthorDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: d.id.parse().map_err(corrupt("authors", &d.id))?,
            first_name: d.first_name,
            last_name: d.last_name,
            user_name: d.user_name,
        })
    }
}

impl From<&Post> for PostDocument {
    fn from(p: &Post) -> Self {
        Self {
            id: p.id.to_string(),
            title: p.title.clone(),
            content: p.content.clone(),
            author: p.author.to_string(),
            created: p.created,
            comments: p
                .comments
                .iter()
                .map(|c| CommentDocument {
                    content: c.content.clone(),
                })
                .collect(),
        }
    }
}

impl TryFrom<PostDocument> for Post {
    type Error = StoreError;

    fn try_from(d: PostDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: d.id.parse().map_err(corrupt("posts", &d.id))?,
            author: d.author.parse().map_err(corrupt("posts", &d.id))?,
            title: d.title,
            content: d.content,
            created: d.created,
            comments: d
                .comments
                .into_iter()
                .map(|c| Comment { content: c.content })
                .collect(),
        })
    }
}

fn corrupt<E: std::fmt::Display>(collection: &'static str, id: &str) -> impl FnOnce(E) -> StoreError {
    let id = id.to_string();
    move |e| StoreError::Backend(format!("corrupt document {id} in {collection}: {e}"))
}

fn map_mongo_error(operation: &'static str, err: mongodb::error::Error) -> StoreError {
    StoreError::Backend(format!("{operation}: {err}"))
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn by_id(id: impl ToString) -> Document {
    doc! { "_id": id.to_string() }
}

/// MongoDB implementation of [`AuthorStore`] and [`PostStore`].
///
/// Cloning is cheap: the driver's `Client` is a shared connection pool.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect, verify the server answers a ping, and ensure indexes exist.
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| map_mongo_error("connect", e))?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| map_mongo_error("ping", e))?;

        let store = Self { client, db };
        store.ensure_indexes().await?;

        tracing::info!(database, "connected to mongodb");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique_user_name = IndexModel::builder()
            .keys(doc! { "userName": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.authors()
            .create_index(unique_user_name)
            .await
            .map_err(|e| map_mongo_error("create_index authors.userName", e))?;

        let by_author = IndexModel::builder().keys(doc! { "author": 1 }).build();
        self.posts()
            .create_index(by_author)
            .await
            .map_err(|e| map_mongo_error("create_index posts.author", e))?;

        Ok(())
    }

    fn authors(&self) -> Collection<AuthorDocument> {
        self.db.collection(AUTHORS)
    }

    fn posts(&self) -> Collection<PostDocument> {
        self.db.collection(POSTS)
    }

    /// Shut the driver down. Later calls find nothing left to close.
    pub async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("mongodb connection closed");
    }

    fn write_error(operation: &'static str, user_name: &str, err: mongodb::error::Error) -> StoreError {
        if is_duplicate_key(&err) {
            StoreError::DuplicateUserName(user_name.to_string())
        } else {
            map_mongo_error(operation, err)
        }
    }
}

#[async_trait]
impl AuthorStore for MongoStore {
    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let docs: Vec<AuthorDocument> = self
            .authors()
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|e| map_mongo_error("find authors", e))?
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("read authors", e))?;
        docs.into_iter().map(Author::try_from).collect()
    }

    async fn get_author(&self, id: AuthorId) -> StoreResult<Option<Author>> {
        self.authors()
            .find_one(by_id(id))
            .await
            .map_err(|e| map_mongo_error("find author", e))?
            .map(Author::try_from)
            .transpose()
    }

    async fn get_authors(&self, ids: &[AuthorId]) -> StoreResult<Vec<Author>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let docs: Vec<AuthorDocument> = self
            .authors()
            .find(doc! { "_id": { "$in": keys } })
            .await
            .map_err(|e| map_mongo_error("find authors by id", e))?
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("read authors by id", e))?;
        docs.into_iter().map(Author::try_from).collect()
    }

    async fn find_author_by_user_name(&self, user_name: &str) -> StoreResult<Option<Author>> {
        self.authors()
            .find_one(doc! { "userName": user_name })
            .await
            .map_err(|e| map_mongo_error("find author by userName", e))?
            .map(Author::try_from)
            .transpose()
    }

    async fn insert_author(&self, author: Author) -> StoreResult<()> {
        self.authors()
            .insert_one(AuthorDocument::from(&author))
            .await
            .map_err(|e| Self::write_error("insert author", &author.user_name, e))?;
        Ok(())
    }

    async fn update_author(&self, author: Author) -> StoreResult<bool> {
        let result = self
            .authors()
            .replace_one(by_id(author.id), AuthorDocument::from(&author))
            .await
            .map_err(|e| Self::write_error("replace author", &author.user_name, e))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_author(&self, id: AuthorId) -> StoreResult<bool> {
        let result = self
            .authors()
            .delete_one(by_id(id))
            .await
            .map_err(|e| map_mongo_error("delete author", e))?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl PostStore for MongoStore {
    async fn list_posts(&self, limit: usize) -> StoreResult<Vec<Post>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let docs: Vec<PostDocument> = self
            .posts()
            .find(doc! {})
            .sort(doc! { "created": 1, "_id": 1 })
            .limit(limit)
            .await
            .map_err(|e| map_mongo_error("find posts", e))?
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("read posts", e))?;
        docs.into_iter().map(Post::try_from).collect()
    }

    async fn get_post(&self, id: PostId) -> StoreResult<Option<Post>> {
        self.posts()
            .find_one(by_id(id))
            .await
            .map_err(|e| map_mongo_error("find post", e))?
            .map(Post::try_from)
            .transpose()
    }

    async fn insert_post(&self, post: Post) -> StoreResult<()> {
        self.posts()
            .insert_one(PostDocument::from(&post))
            .await
            .map_err(|e| map_mongo_error("insert post", e))?;
        Ok(())
    }

    async fn update_post(&self, post: Post) -> StoreResult<bool> {
        let result = self
            .posts()
            .replace_one(by_id(post.id), PostDocument::from(&post))
            .await
            .map_err(|e| map_mongo_error("replace post", e))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_post(&self, id: PostId) -> StoreResult<bool> {
        let result = self
            .posts()
            .delete_one(by_id(id))
            .await
            .map_err(|e| map_mongo_error("delete post", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_posts_by_author(&self, author: AuthorId) -> StoreResult<u64> {
        let result = self
            .posts()
            .delete_many(doc! { "author": author.to_string() })
            .await
            .map_err(|e| map_mongo_error("delete posts by author", e))?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpost_blog::NewPost;

    #[test]
    fn author_document_round_trips_through_domain() {
        let author = Author {
            id: AuthorId::new(),
            first_name: None,
            last_name: "Knuth".into(),
            user_name: "dek".into(),
        };
        let doc = AuthorDocument::from(&author);
        assert_eq!(doc.id, author.id.to_string());

        let bson = bson::to_document(&doc).unwrap();
        assert!(bson.get("firstName").is_none());
        assert_eq!(bson.get_str("userName").unwrap(), "dek");

        let back: AuthorDocument = bson::from_document(bson).unwrap();
        assert_eq!(Author::try_from(back).unwrap(), author);
    }

    #[test]
    fn post_document_stores_created_as_datetime() {
        let post = Post {
            id: PostId::new(),
            title: "t".into(),
            content: "c".into(),
            author: AuthorId::new(),
            created: Utc::now(),
            comments: vec![Comment { content: "hi".into() }],
        };
        let bson = bson::to_document(&PostDocument::from(&post)).unwrap();
        assert!(bson.get_datetime("created").is_ok());
        assert_eq!(bson.get_str("author").unwrap(), post.author.to_string());
    }

    #[test]
    fn post_read_back_equals_post_written() {
        let mut post = NewPost {
            title: "Round".into(),
            content: "trip".into(),
            author: AuthorId::new(),
        }
        .into_post(PostId::new(), Utc::now());
        post.comments.push(Comment { content: "first".into() });

        let bson = bson::to_document(&PostDocument::from(&post)).unwrap();
        let back: PostDocument = bson::from_document(bson).unwrap();
        assert_eq!(Post::try_from(back).unwrap(), post);
    }

    #[test]
    fn corrupt_ids_surface_as_backend_errors() {
        let doc = AuthorDocument {
            id: "not-a-uuid".into(),
            first_name: None,
            last_name: "x".into(),
            user_name: "x".into(),
        };
        assert!(matches!(Author::try_from(doc), Err(StoreError::Backend(_))));
    }
}
