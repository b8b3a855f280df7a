//! In-memory repositories - used when no database is configured, and in tests.
//! Note: Data is lost on process restart.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{AuthorSummary, Post, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};
use quill_core::query::{PageRequest, PostFilter, PostSort};

/// Post repository backed by a `HashMap` behind an async `RwLock`.
///
/// Enforces the unique slug index the database would.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn slug_taken(store: &HashMap<Uuid, Post>, slug: &str, except: Uuid) -> bool {
        store.values().any(|p| p.slug == slug && p.id != except)
    }

    fn matches(post: &Post, filter: &PostFilter) -> bool {
        filter.status.is_none_or(|status| post.status == status)
            && filter.author_id.is_none_or(|author| post.author_id == author)
            && filter
                .tag
                .as_ref()
                .is_none_or(|tag| post.tags.iter().any(|t| t == tag))
    }

    fn compare(a: &Post, b: &Post, sort: PostSort) -> Ordering {
        let newest = b.created_at.cmp(&a.created_at);
        match sort {
            // `None < Some`, so comparing b against a puts unpublished dates last.
            PostSort::RecentlyPublished => b.published_at.cmp(&a.published_at).then(newest),
            PostSort::Newest => newest,
        }
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&post.id) {
            return Err(RepoError::Constraint("id".to_string()));
        }
        if Self::slug_taken(&store, &post.slug, post.id) {
            return Err(RepoError::Constraint("slug".to_string()));
        }
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        let Some(stored) = store.get(&post.id) else {
            return Err(RepoError::NotFound);
        };
        // Views only move through `record_view`.
        post.view_count = stored.view_count;
        if Self::slug_taken(&store, &post.slug, post.id) {
            return Err(RepoError::Constraint("slug".to_string()));
        }
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn record_view(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let mut store = self.store.write().await;
        let post = store
            .values_mut()
            .find(|p| p.slug == slug && p.is_published());

        Ok(post.map(|p| {
            p.view_count += 1;
            p.clone()
        }))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let store = self.store.read().await;
        let mut matching: Vec<&Post> = store
            .values()
            .filter(|p| Self::matches(p, filter))
            .collect();
        matching.sort_by(|a, b| Self::compare(a, b, sort));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.skip() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }
}

/// User repository backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.values().any(|u| u.username == user.username) {
            return Err(RepoError::Constraint("username".to_string()));
        }
        if store.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("email".to_string()));
        }
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        match store.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<AuthorSummary>, RepoError> {
        let store = self.store.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| store.get(id))
            .map(User::summary)
            .collect())
    }
}
