//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use quill_core::domain::{AuthorSummary, Post};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, UserRepository};
use quill_core::query::{PageRequest, PostFilter, PostSort};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, read_error, write_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Columns selected for the author projection; credentials are never read.
#[derive(Debug, FromQueryResult)]
struct AuthorRow {
    id: Uuid,
    username: String,
    avatar: Option<String>,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<AuthorSummary>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = UserEntity::find()
            .select_only()
            .column(user::Column::Id)
            .column(user::Column::Username)
            .column(user::Column::Avatar)
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .into_model::<AuthorRow>()
            .all(&self.db)
            .await
            .map_err(read_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AuthorSummary {
                id: row.id,
                username: Some(row.username),
                avatar: row.avatar,
            })
            .collect())
    }
}

fn filtered(filter: &PostFilter) -> Select<PostEntity> {
    let mut select = PostEntity::find();

    if let Some(status) = filter.status {
        select = select.filter(post::Column::Status.eq(post::Status::from(status)));
    }
    if let Some(author_id) = filter.author_id {
        select = select.filter(post::Column::AuthorId.eq(author_id));
    }
    if let Some(tag) = &filter.tag {
        select = select.filter(Expr::cust_with_values("$1 = ANY(\"tags\")", [tag.clone()]));
    }
    select
}

fn sorted(select: Select<PostEntity>, sort: PostSort) -> Select<PostEntity> {
    match sort {
        PostSort::RecentlyPublished => select
            .order_by_with_nulls(post::Column::PublishedAt, Order::Desc, NullOrdering::Last)
            .order_by_desc(post::Column::CreatedAt),
        PostSort::Newest => select.order_by_desc(post::Column::CreatedAt),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn record_view(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        tracing::debug!(slug, "Recording post view");

        // Single UPDATE ... RETURNING so concurrent readers never lose an increment.
        let mut updated = PostEntity::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::Status.eq(post::Status::Published))
            .exec_with_returning(&self.db)
            .await
            .map_err(write_error)?;

        Ok(updated.pop().map(Into::into))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        let paginator = sorted(filtered(filter), sort).paginate(&self.db, page.limit);

        let items = paginator
            .fetch_page(page.page - 1)
            .await
            .map_err(read_error)?;
        let total = paginator.num_items().await.map_err(read_error)?;

        Ok((items.into_iter().map(Into::into).collect(), total))
    }
}
