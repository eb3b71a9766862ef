use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use inkpost_core::{AuthorId, DomainError, DomainResult, PostId};

use crate::author::Author;

/// A comment embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub content: String,
}

/// A blog entry owned by exactly one author.
///
/// `author` is a reference only. Use [`PostWithAuthor`] whenever the author's
/// display name is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: AuthorId,
    pub created: DateTime<Utc>,
    pub comments: Vec<Comment>,
}

/// Validated post creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: AuthorId,
}

impl NewPost {
    /// Checks field presence in request order: `title`, `content`,
    /// `author_id`. A malformed `author_id` cannot reference an author and is
    /// rejected as a validation failure.
    pub fn from_fields(
        title: Option<String>,
        content: Option<String>,
        author_id: Option<String>,
    ) -> DomainResult<Self> {
        let title = title.ok_or_else(|| DomainError::missing_field("title"))?;
        let content = content.ok_or_else(|| DomainError::missing_field("content"))?;
        let author_id = author_id.ok_or_else(|| DomainError::missing_field("author_id"))?;

        let author = author_id
            .parse::<AuthorId>()
            .map_err(|_| DomainError::validation(format!("Author {author_id} does not exist")))?;

        Ok(Self {
            title,
            content,
            author,
        })
    }

    /// `created` is kept at millisecond precision, the resolution the
    /// document store persists.
    pub fn into_post(self, id: PostId, created: DateTime<Utc>) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            author: self.author,
            created: created.trunc_subsecs(3),
            comments: Vec::new(),
        }
    }
}

/// Partial post update: only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
    }
}

/// A post joined with the author it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithAuthor {
    pub(crate) post: Post,
    pub(crate) author: Author,
}

impl PostWithAuthor {
    /// Pairs a post with its author. Returns `None` if `author` is not the
    /// record the post references.
    pub fn new(post: Post, author: Author) -> Option<Self> {
        (post.author == author.id).then_some(Self { post, author })
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn author_name(&self) -> String {
        self.author.display_name()
    }
}
