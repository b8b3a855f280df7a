use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slug::derive_slug;
use super::user::AuthorSummary;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(format!("Invalid status: {other}")),
        }
    }
}

/// A post's hosted image and the handle needed to delete it from the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostImage {
    pub url: String,
    pub external_id: String,
}

/// Post entity - a blog article and its publication metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub meta_description: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub image: Option<PostImage>,
    pub is_featured: bool,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post. The slug is derived from the title.
    pub fn new(author_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            slug: derive_slug(&title),
            title,
            content,
            excerpt: None,
            meta_description: None,
            tags: Vec::new(),
            status: PostStatus::default(),
            image: None,
            is_featured: false,
            view_count: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the title, re-deriving the slug only when the title actually changes.
    ///
    /// Returns `true` if the slug was recomputed.
    pub fn retitle(&mut self, title: String) -> bool {
        if title == self.title {
            return false;
        }
        self.slug = derive_slug(&title);
        self.title = title;
        true
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A post together with the display-safe projection of its author.
#[derive(Debug, Clone)]
pub struct PostDetails {
    pub post: Post,
    pub author: AuthorSummary,
}
