use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuthorSummary, Post, User};
use crate::error::RepoError;
use crate::query::{PageRequest, PostFilter, PostSort};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity. Unique-key collisions surface as `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity (last write wins).
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Only the author projection is needed by the post core.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Author projections for the given ids. Unknown ids are skipped.
    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<AuthorSummary>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Atomically add one to the view counter of the published post with
    /// this slug and return it. `None` if no published post matches.
    async fn record_view(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// One page of posts matching `filter`, plus the total match count.
    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<(Vec<Post>, u64), RepoError>;
}
