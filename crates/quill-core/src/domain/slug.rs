//! Slug derivation for post titles.

use chrono::Utc;

/// Derive a URL-safe slug from a title.
///
/// Lowercases the title, keeps only `[a-z0-9]`, turns runs of spaces and
/// hyphens into a single hyphen and trims hyphens at both ends. An empty
/// result falls back to `post-<epoch-millis>`.
///
/// Uniqueness is not checked here; the post store rejects colliding slugs.
pub fn derive_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for ch in title.to_lowercase().chars() {
        match ch {
            'a'..='z' | '0'..='9' => slug.push(ch),
            ' ' | '-' => {
                if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            _ => {}
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        return format!("post-{}", Utc::now().timestamp_millis());
    }
    slug
}
