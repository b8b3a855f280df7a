//! Listing filters, sort orders and the shared pagination arithmetic.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{PostStatus, Requester};

pub const DEFAULT_LIMIT: u64 = 10;
pub const ADMIN_DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;
/// Highest page served; keeps the row offset inside a signed 64-bit OFFSET.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

/// Field constraints for a post listing. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub tag: Option<String>,
}

impl PostFilter {
    /// Public listing: published posts, optionally narrowed by tag and author.
    pub fn public(tag: Option<&str>, author_id: Option<Uuid>) -> Self {
        Self {
            status: Some(PostStatus::Published),
            author_id,
            tag: tag
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        }
    }

    /// Owner listing: every post by `owner_id`, or only the published ones
    /// when the requester neither owns them nor is an admin.
    pub fn owned_by(owner_id: Uuid, requester: &Requester) -> Self {
        let status = (!requester.acts_for(owner_id)).then_some(PostStatus::Published);
        Self {
            status,
            author_id: Some(owner_id),
            tag: None,
        }
    }

    /// Admin listing: all authors, optional status.
    pub fn admin(status: Option<PostStatus>) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Sort orders used by the listing presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSort {
    /// `published_at desc` (nulls last), then `created_at desc`.
    RecentlyPublished,
    /// `created_at desc`.
    Newest,
}

/// A validated page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Build a page request, treating missing or zero values as defaults and
    /// clamping the page to `MAX_PAGE` and the limit to `MAX_LIMIT`.
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1).min(MAX_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// One page of results plus the counters clients need to paginate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(request.limit);
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total_items,
            total_pages,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}
