//! Response projections.
//!
//! Each HTTP response contract has exactly one projection type here. Handlers
//! never assemble response JSON by hand.

use chrono::{DateTime, Utc};
use serde::Serialize;

use inkpost_core::{AuthorId, PostId};

use crate::author::Author;
use crate::post::{Comment, PostWithAuthor};

/// Author as listed and as returned after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: AuthorId,
    pub name: String,
    pub user_name: String,
}

impl From<&Author> for AuthorSummary {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.display_name(),
            user_name: author.user_name.clone(),
        }
    }
}

/// Author as returned by the creation endpoint (keyed by `_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAuthor {
    #[serde(rename = "_id")]
    pub id: AuthorId,
    pub name: String,
    pub user_name: String,
}

impl From<&Author> for CreatedAuthor {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.display_name(),
            user_name: author.user_name.clone(),
        }
    }
}

/// A single post with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    pub id: PostId,
    pub title: String,
    pub author: String,
    pub created: DateTime<Utc>,
    pub content: String,
    pub comments: Vec<Comment>,
}

impl From<&PostWithAuthor> for PostDetail {
    fn from(joined: &PostWithAuthor) -> Self {
        let post = &joined.post;
        Self {
            id: post.id,
            title: post.title.clone(),
            author: joined.author_name(),
            created: post.created,
            content: post.content.clone(),
            comments: post.comments.clone(),
        }
    }
}

/// An entry of the post listing. Same shape as [`PostDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PostListItem(PostDetail);

impl From<&PostWithAuthor> for PostListItem {
    fn from(joined: &PostWithAuthor) -> Self {
        Self(PostDetail::from(joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{NewPost, PostWithAuthor};

    fn author(first: Option<&str>) -> Author {
        Author {
            id: AuthorId::new(),
            first_name: first.map(str::to_string),
            last_name: "Hopper".into(),
            user_name: "grace".into(),
        }
    }

    #[test]
    fn author_summary_uses_camel_case_keys() {
        let a = author(Some("Grace"));
        let json = serde_json::to_value(AuthorSummary::from(&a)).unwrap();
        assert_eq!(json["id"], a.id.to_string());
        assert_eq!(json["name"], "Grace Hopper");
        assert_eq!(json["userName"], "grace");
        assert!(json.get("user_name").is_none());
    }

    #[test]
    fn created_author_is_keyed_by_underscore_id() {
        let a = author(None);
        let json = serde_json::to_value(CreatedAuthor::from(&a)).unwrap();
        assert_eq!(json["_id"], a.id.to_string());
        assert!(json.get("id").is_none());
        assert_eq!(json["name"], "Hopper");
    }

    #[test]
    fn post_projections_carry_resolved_author_name() {
        let a = author(Some("Grace"));
        let mut post = NewPost {
            title: "COBOL".into(),
            content: "notes".into(),
            author: a.id,
        }
        .into_post(PostId::new(), Utc::now());
        post.comments.push(Comment {
            content: "nice".into(),
        });
        let joined = PostWithAuthor::new(post.clone(), a).unwrap();

        let detail = serde_json::to_value(PostDetail::from(&joined)).unwrap();
        assert_eq!(detail["id"], post.id.to_string());
        assert_eq!(detail["author"], "Grace Hopper");
        assert_eq!(detail["title"], "COBOL");
        assert_eq!(detail["comments"][0]["content"], "nice");

        let item = serde_json::to_value(PostListItem::from(&joined)).unwrap();
        assert_eq!(item, detail);
    }
}
