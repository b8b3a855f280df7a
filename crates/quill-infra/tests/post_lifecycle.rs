//! End-to-end lifecycle tests for `PostService` over the in-memory adapters.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use uuid::Uuid;

use quill_core::DomainError;
use quill_core::domain::{ImageUpload, PostStatus, Requester, Role, TagInput, User};
use quill_core::domain::Post;
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, DeleteOutcome, ObjectStore, ObjectStoreError, PostRepository, StoredObject,
};
use quill_core::query::{PageRequest, PostFilter, PostSort};
use quill_core::service::{NewPost, PostPatch, PostService, PublicPostQuery};
use quill_infra::{
    ImageCrateInspector, InMemoryObjectStore, InMemoryPostRepository, InMemoryUserRepository,
};

/// Wraps the in-memory store, recording deletes and failing on demand.
#[derive(Default)]
struct RecordingStore {
    inner: InMemoryObjectStore,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    deleted: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn deletes_of(&self, external_id: &str) -> usize {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == external_id)
            .count()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<StoredObject, ObjectStoreError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Rejected("upload refused".into()));
        }
        self.inner.upload(bytes, name).await
    }

    async fn delete(&self, external_id: &str) -> Result<DeleteOutcome, ObjectStoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Request("connection reset".into()));
        }
        self.deleted.lock().unwrap().push(external_id.to_string());
        self.inner.delete(external_id).await
    }
}

/// Post repository where a public read lands right after every load.
#[derive(Default)]
struct ReaderRaceRepository {
    inner: InMemoryPostRepository,
}

#[async_trait]
impl BaseRepository<Post, Uuid> for ReaderRaceRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let loaded = self.inner.find_by_id(id).await?;
        if let Some(post) = &loaded {
            self.inner.record_view(&post.slug).await?;
        }
        Ok(loaded)
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        self.inner.insert(post).await
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        self.inner.update(post).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl PostRepository for ReaderRaceRepository {
    async fn record_view(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.inner.record_view(slug).await
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<(Vec<Post>, u64), RepoError> {
        self.inner.list(filter, sort, page).await
    }
}

struct Fixture {
    service: Arc<PostService>,
    store: Arc<RecordingStore>,
    author: Requester,
    other_author: Requester,
    admin: Requester,
}

async fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserRepository::new());
    let author = users
        .insert(User::new("ada".into(), "ada@example.com".into(), Role::Author))
        .await
        .unwrap();
    let other = users
        .insert(User::new("grace".into(), "grace@example.com".into(), Role::Author))
        .await
        .unwrap();
    let admin = users
        .insert(User::new("root".into(), "root@example.com".into(), Role::Admin))
        .await
        .unwrap();

    let store = Arc::new(RecordingStore::default());
    let service = PostService::new(
        Arc::new(InMemoryPostRepository::new()),
        users,
        store.clone(),
        Arc::new(ImageCrateInspector),
    );

    Fixture {
        service: Arc::new(service),
        store,
        author: Requester::new(author.id, author.role),
        other_author: Requester::new(other.id, other.role),
        admin: Requester::new(admin.id, admin.role),
    }
}

fn new_post(title: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: "A body long enough to satisfy the minimum content length rule.".to_string(),
        status: Some(PostStatus::Published),
        ..NewPost::default()
    }
}

fn cover(width: u32, height: u32) -> ImageUpload {
    let mut bytes = Vec::new();
    RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    ImageUpload::new("cover.png", Some("image/png".to_string()), bytes)
}

#[tokio::test]
async fn test_create_derives_slug_and_attaches_author() {
    let fx = fixture().await;

    let created = fx
        .service
        .create(&fx.author, new_post("Hello, World!"), None)
        .await
        .unwrap();

    assert_eq!(created.post.slug, "hello-world");
    assert_eq!(created.post.view_count, 0);
    assert_eq!(created.author.username.as_deref(), Some("ada"));
    assert!(created.post.published_at.is_none());
}

#[tokio::test]
async fn test_duplicate_title_is_rejected() {
    let fx = fixture().await;
    fx.service
        .create(&fx.author, new_post("Hello World"), None)
        .await
        .unwrap();

    let second = fx
        .service
        .create(&fx.other_author, new_post("hello   world"), None)
        .await;

    assert!(matches!(second, Err(DomainError::Duplicate(_))));
}

#[tokio::test]
async fn test_plain_user_cannot_create() {
    let fx = fixture().await;
    let reader = Requester::new(Uuid::new_v4(), Role::User);

    let result = fx.service.create(&reader, new_post("Reader Post"), None).await;

    assert!(matches!(result, Err(DomainError::Forbidden(_))));
}

#[tokio::test]
async fn test_featured_flag_needs_admin() {
    let fx = fixture().await;
    let input = NewPost {
        is_featured: Some(true),
        ..new_post("Wants The Spotlight")
    };

    let by_author = fx.service.create(&fx.author, input.clone(), None).await.unwrap();
    assert!(!by_author.post.is_featured);

    let by_admin = fx
        .service
        .create(&fx.admin, NewPost { title: "Admin Pick".into(), ..input }, None)
        .await
        .unwrap();
    assert!(by_admin.post.is_featured);

    let toggled = fx
        .service
        .toggle_featured(&fx.admin, by_author.post.id)
        .await
        .unwrap();
    assert!(toggled.post.is_featured);

    assert!(matches!(
        fx.service.toggle_featured(&fx.author, by_author.post.id).await,
        Err(DomainError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_tags_are_normalized() {
    let fx = fixture().await;
    let input = NewPost {
        tags: Some(TagInput::Delimited(" Rust, WEB ,,async ".to_string())),
        ..new_post("Tagged Post")
    };

    let created = fx.service.create(&fx.author, input, None).await.unwrap();

    assert_eq!(created.post.tags, vec!["rust", "web", "async"]);
}

#[tokio::test]
async fn test_each_public_read_counts_one_view() {
    let fx = fixture().await;
    fx.service
        .create(&fx.author, new_post("Popular Post"), None)
        .await
        .unwrap();

    let first = fx.service.get_by_slug("popular-post").await.unwrap();
    let second = fx.service.get_by_slug("popular-post").await.unwrap();
    assert_eq!(first.post.view_count, 1);
    assert_eq!(second.post.view_count, 2);

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let service = fx.service.clone();
            tokio::spawn(async move { service.get_by_slug("popular-post").await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let third = fx.service.get_by_slug("popular-post").await.unwrap();
    assert_eq!(third.post.view_count, 23);
}

#[tokio::test]
async fn test_edits_keep_views_recorded_while_loading() {
    let users = Arc::new(InMemoryUserRepository::new());
    let ada = users
        .insert(User::new("ada".into(), "ada@example.com".into(), Role::Author))
        .await
        .unwrap();
    let root = users
        .insert(User::new("root".into(), "root@example.com".into(), Role::Admin))
        .await
        .unwrap();
    let service = PostService::new(
        Arc::new(ReaderRaceRepository::default()),
        users,
        Arc::new(InMemoryObjectStore::default()),
        Arc::new(ImageCrateInspector),
    );
    let author = Requester::new(ada.id, ada.role);
    let admin = Requester::new(root.id, root.role);

    let created = service.create(&author, new_post("Busy Post"), None).await.unwrap();
    let patch = PostPatch {
        content: Some("Rewritten body that still clears the fifty character minimum.".into()),
        ..PostPatch::default()
    };

    let updated = service
        .update(&author, created.post.id, patch, None)
        .await
        .unwrap();
    assert_eq!(updated.post.view_count, 1);

    let featured = service
        .toggle_featured(&admin, created.post.id)
        .await
        .unwrap();
    assert_eq!(featured.post.view_count, 2);

    let read = service.get_by_slug("busy-post").await.unwrap();
    assert_eq!(read.post.view_count, 3);
}

#[tokio::test]
async fn test_drafts_are_not_publicly_readable() {
    let fx = fixture().await;
    let draft = NewPost {
        status: None,
        ..new_post("Work In Progress")
    };
    let created = fx.service.create(&fx.author, draft, None).await.unwrap();
    assert_eq!(created.post.status, PostStatus::Draft);

    assert!(matches!(
        fx.service.get_by_slug("work-in-progress").await,
        Err(DomainError::NotFound { .. })
    ));

    let own = fx.service.get_by_id(&fx.author, created.post.id).await.unwrap();
    assert_eq!(own.post.view_count, 0);
    assert!(matches!(
        fx.service.get_by_id(&fx.other_author, created.post.id).await,
        Err(DomainError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_non_owner_update_leaves_post_untouched() {
    let fx = fixture().await;
    let created = fx
        .service
        .create(&fx.author, new_post("Original Title"), None)
        .await
        .unwrap();

    let patch = PostPatch {
        title: Some("Hijacked Title".into()),
        ..PostPatch::default()
    };
    let result = fx
        .service
        .update(&fx.other_author, created.post.id, patch, None)
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    let stored = fx.service.get_by_id(&fx.author, created.post.id).await.unwrap();
    assert_eq!(stored.post.title, "Original Title");
    assert_eq!(stored.post.slug, "original-title");
}

#[tokio::test]
async fn test_owner_without_author_role_cannot_update() {
    let fx = fixture().await;
    let created = fx
        .service
        .create(&fx.author, new_post("Before Demotion"), None)
        .await
        .unwrap();
    let demoted = Requester::new(fx.author.id, Role::User);

    let patch = PostPatch {
        title: Some("After Demotion".into()),
        ..PostPatch::default()
    };
    let result = fx.service.update(&demoted, created.post.id, patch, None).await;

    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    let stored = fx.service.get_by_id(&fx.author, created.post.id).await.unwrap();
    assert_eq!(stored.post.slug, "before-demotion");
}

#[tokio::test]
async fn test_retitle_recomputes_slug_and_admin_may_edit() {
    let fx = fixture().await;
    let created = fx
        .service
        .create(&fx.author, new_post("First Draft"), None)
        .await
        .unwrap();

    let patch = PostPatch {
        title: Some("Second Thoughts".into()),
        ..PostPatch::default()
    };
    let updated = fx
        .service
        .update(&fx.admin, created.post.id, patch, None)
        .await
        .unwrap();

    assert_eq!(updated.post.slug, "second-thoughts");
    assert_eq!(updated.post.author_id, fx.author.id);
    assert!(updated.post.updated_at >= created.post.updated_at);
}

#[tokio::test]
async fn test_replacing_image_releases_old_blob_once() {
    let fx = fixture().await;
    let created = fx
        .service
        .create(&fx.author, new_post("Illustrated"), Some(cover(1600, 900)))
        .await
        .unwrap();
    let old = created.post.image.clone().unwrap();

    let updated = fx
        .service
        .update(
            &fx.author,
            created.post.id,
            PostPatch::default(),
            Some(cover(1024, 768)),
        )
        .await
        .unwrap();
    let new = updated.post.image.unwrap();

    assert_ne!(new.external_id, old.external_id);
    assert_eq!(fx.store.deletes_of(&old.external_id), 1);
    assert!(!fx.store.inner.contains(&old.external_id).await);
    assert!(fx.store.inner.contains(&new.external_id).await);
}

#[tokio::test]
async fn test_failed_upload_keeps_previous_image() {
    let fx = fixture().await;
    let created = fx
        .service
        .create(&fx.author, new_post("Keep My Cover"), Some(cover(1600, 900)))
        .await
        .unwrap();
    let old = created.post.image.clone().unwrap();

    fx.store.fail_uploads.store(true, Ordering::SeqCst);
    let patch = PostPatch {
        content: Some("Updated body that is still comfortably above fifty characters.".into()),
        ..PostPatch::default()
    };
    let result = fx
        .service
        .update(&fx.author, created.post.id, patch, Some(cover(1600, 900)))
        .await;
    assert!(matches!(result, Err(DomainError::Upstream(_))));

    let stored = fx.service.get_by_id(&fx.author, created.post.id).await.unwrap();
    assert_eq!(stored.post.image, Some(old.clone()));
    assert_eq!(stored.post.content, created.post.content);
    assert_eq!(fx.store.deletes_of(&old.external_id), 0);
}

#[tokio::test]
async fn test_invalid_images_are_rejected_before_upload() {
    let fx = fixture().await;

    let too_small = fx
        .service
        .create(&fx.author, new_post("Tiny Cover"), Some(cover(640, 360)))
        .await;
    assert!(matches!(too_small, Err(DomainError::Validation(_))));

    let square = fx
        .service
        .create(&fx.author, new_post("Square Cover"), Some(cover(1000, 1000)))
        .await;
    assert!(matches!(square, Err(DomainError::Validation(_))));

    assert!(fx.store.inner.is_empty().await);
}

#[tokio::test]
async fn test_delete_removes_blob_then_record() {
    let fx = fixture().await;
    let created = fx
        .service
        .create(&fx.author, new_post("Short Lived"), Some(cover(1600, 900)))
        .await
        .unwrap();
    let image = created.post.image.clone().unwrap();

    fx.service.delete(&fx.author, created.post.id).await.unwrap();

    assert_eq!(fx.store.deletes_of(&image.external_id), 1);
    assert!(matches!(
        fx.service.get_by_id(&fx.author, created.post.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_keeps_record_when_store_fails() {
    let fx = fixture().await;
    let created = fx
        .service
        .create(&fx.author, new_post("Sticky Post"), Some(cover(1600, 900)))
        .await
        .unwrap();

    fx.store.fail_deletes.store(true, Ordering::SeqCst);
    let result = fx.service.delete(&fx.author, created.post.id).await;
    assert!(matches!(result, Err(DomainError::Upstream(_))));

    let stored = fx.service.get_by_id(&fx.author, created.post.id).await.unwrap();
    assert_eq!(stored.post.image, created.post.image);
}

#[tokio::test]
async fn test_public_listing_pages() {
    let fx = fixture().await;
    for i in 0..25 {
        fx.service
            .create(&fx.author, new_post(&format!("Listed Post {i}")), None)
            .await
            .unwrap();
    }
    fx.service
        .create(
            &fx.author,
            NewPost {
                status: None,
                ..new_post("Hidden Draft")
            },
            None,
        )
        .await
        .unwrap();

    let page = fx
        .service
        .list_public(PublicPostQuery {
            tag: None,
            author_id: None,
            page: PageRequest::new(Some(2), Some(10), 10),
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 10);
    assert_eq!(page.total_items, 25);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next);
    assert!(page.has_prev);
    assert!(page.items.iter().all(|d| d.author.username.as_deref() == Some("ada")));
}

#[tokio::test]
async fn test_far_page_is_empty() {
    let fx = fixture().await;
    fx.service
        .create(&fx.author, new_post("Only Post"), None)
        .await
        .unwrap();

    let page = fx
        .service
        .list_public(PublicPostQuery {
            tag: None,
            author_id: None,
            page: PageRequest::new(Some(u64::MAX), None, 10),
        })
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 1);
    assert!(!page.has_next);
    assert!(page.has_prev);
}

#[tokio::test]
async fn test_owner_listing_includes_drafts_only_for_owner() {
    let fx = fixture().await;
    fx.service
        .create(&fx.author, new_post("Visible One"), None)
        .await
        .unwrap();
    fx.service
        .create(
            &fx.author,
            NewPost {
                status: None,
                ..new_post("Private One")
            },
            None,
        )
        .await
        .unwrap();

    let own = fx
        .service
        .list_for_owner(&fx.author, fx.author.id, PageRequest::new(None, None, 10))
        .await
        .unwrap();
    assert_eq!(own.total_items, 2);

    let by_admin = fx
        .service
        .list_admin(&fx.admin, Some(PostStatus::Draft), PageRequest::new(None, None, 20))
        .await
        .unwrap();
    assert_eq!(by_admin.total_items, 1);

    assert!(matches!(
        fx.service
            .list_for_owner(&fx.other_author, fx.author.id, PageRequest::new(None, None, 10))
            .await,
        Err(DomainError::Forbidden(_))
    ));
}
