//! Typed inputs for post create/update and their field validation.

use crate::domain::{PostStatus, TagInput};
use crate::error::DomainError;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 200;
const CONTENT_MIN: usize = 50;
const SUMMARY_MAX: usize = 300;

/// Fields for a new post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub meta_description: Option<String>,
    pub tags: Option<TagInput>,
    pub status: Option<PostStatus>,
    /// Honored only for admins.
    pub is_featured: Option<bool>,
}

/// Partial update of a post. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub meta_description: Option<String>,
    pub tags: Option<TagInput>,
    pub status: Option<PostStatus>,
    /// Honored only for admins.
    pub is_featured: Option<bool>,
}

impl NewPost {
    pub(crate) fn validate(mut self) -> Result<Self, DomainError> {
        self.title = title(&self.title)?;
        content(&self.content)?;
        summary("Excerpt", self.excerpt.as_deref())?;
        summary("Meta description", self.meta_description.as_deref())?;
        Ok(self)
    }
}

impl PostPatch {
    pub(crate) fn validate(mut self) -> Result<Self, DomainError> {
        if let Some(raw) = self.title.as_deref() {
            self.title = Some(title(raw)?);
        }
        if let Some(body) = self.content.as_deref() {
            content(body)?;
        }
        summary("Excerpt", self.excerpt.as_deref())?;
        summary("Meta description", self.meta_description.as_deref())?;
        Ok(self)
    }
}

/// Trimmed title of 3 to 200 characters.
fn title(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        return Err(DomainError::Validation(format!(
            "Title must be between {TITLE_MIN} and {TITLE_MAX} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn content(body: &str) -> Result<(), DomainError> {
    if body.chars().count() < CONTENT_MIN {
        return Err(DomainError::Validation(format!(
            "Content must be at least {CONTENT_MIN} characters"
        )));
    }
    Ok(())
}

fn summary(field: &str, value: Option<&str>) -> Result<(), DomainError> {
    match value {
        Some(text) if text.chars().count() > SUMMARY_MAX => Err(DomainError::Validation(format!(
            "{field} must be less than {SUMMARY_MAX} characters"
        ))),
        _ => Ok(()),
    }
}
