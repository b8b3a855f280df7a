#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use uuid::Uuid;

    use crate::database::entity::post;
    use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};
    use quill_core::domain::{Post, PostStatus};
    use quill_core::ports::{BaseRepository, PostRepository, UserRepository};
    use quill_core::query::{PageRequest, PostFilter, PostSort};

    fn model(slug: &str, status: post::Status, view_count: i64) -> post::Model {
        let now = Utc::now();
        post::Model {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "Test Post".to_owned(),
            slug: slug.to_owned(),
            content: "Content".to_owned(),
            excerpt: None,
            meta_description: None,
            tags: vec!["rust".to_owned()],
            status,
            image_url: Some("https://img.example/cover.png".to_owned()),
            image_external_id: Some("blog-posts/cover".to_owned()),
            is_featured: false,
            view_count,
            published_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let row = model("test-post", post::Status::Published, 3);
        let post_id = row.id;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();
        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        let post = result.unwrap();
        assert_eq!(post.id, post_id);
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.tags, vec!["rust"]);
        assert_eq!(post.image.unwrap().external_id, "blog-posts/cover");
    }

    #[tokio::test]
    async fn test_record_view_returns_incremented_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model("hello", post::Status::Published, 8)]])
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();
        let repo = PostgresPostRepository::new(db);

        let viewed = repo.record_view("hello").await.unwrap().unwrap();
        assert_eq!(viewed.view_count, 8);

        assert!(repo.record_view("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_never_writes_view_count() {
        let stored = model("busy-post", post::Status::Published, 5);
        let mut stale: Post = stored.clone().into();
        stale.view_count = 0;
        stale.title = "Busy Post".to_owned();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored]])
            .into_connection();
        let repo = PostgresPostRepository::new(db);

        let saved = repo.update(stale).await.unwrap();
        assert_eq!(saved.view_count, 5);

        let log = format!("{:?}", repo.db.into_transaction_log());
        let set_clause = log.split("WHERE").next().unwrap_or_default();
        assert!(set_clause.contains("UPDATE"));
        assert!(set_clause.contains("title"));
        assert!(!set_clause.contains("view_count"));
    }

    #[tokio::test]
    async fn test_list_returns_page_and_total() {
        let rows: Vec<post::Model> = (0..10)
            .map(|i| model(&format!("post-{i}"), post::Status::Published, 0))
            .collect();
        let count = BTreeMap::from([("num_items", Value::from(25i64))]);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .append_query_results([vec![count]])
            .into_connection();
        let repo = PostgresPostRepository::new(db);

        let (items, total) = repo
            .list(
                &PostFilter::public(Some("rust"), None),
                PostSort::RecentlyPublished,
                PageRequest::new(Some(2), Some(10), 10),
            )
            .await
            .unwrap();

        assert_eq!(items.len(), 10);
        assert_eq!(total, 25);
    }

    #[tokio::test]
    async fn test_find_summaries_reads_projection_only() {
        let author_id = Uuid::new_v4();
        let row = BTreeMap::from([
            ("id", Value::from(author_id)),
            ("username", Value::from("ada")),
            ("avatar", Value::from(None::<String>)),
        ]);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();
        let repo = PostgresUserRepository::new(db);

        let summaries = repo.find_summaries(&[author_id]).await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, author_id);
        assert_eq!(summaries[0].username.as_deref(), Some("ada"));
        assert_eq!(summaries[0].avatar, None);
    }

    #[tokio::test]
    async fn test_find_summaries_skips_query_for_empty_ids() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PostgresUserRepository::new(db);

        assert!(repo.find_summaries(&[]).await.unwrap().is_empty());
    }
}
