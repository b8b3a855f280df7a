//! Post lifecycle manager: create, read, update, delete and feature posts while
//! enforcing authorization and keeping image blobs in step with post records.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    AuthorSummary, ImageRules, ImageUpload, Post, PostDetails, PostImage, PostStatus, Requester,
    TagInput,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{DeleteOutcome, ImageInspector, ObjectStore, PostRepository, UserRepository};
use crate::query::{Page, PageRequest, PostFilter, PostSort};

use super::input::{NewPost, PostPatch};

/// Public listing parameters.
#[derive(Debug, Clone)]
pub struct PublicPostQuery {
    pub tag: Option<String>,
    pub author_id: Option<Uuid>,
    pub page: PageRequest,
}

/// Single authority over the post lifecycle.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    store: Arc<dyn ObjectStore>,
    inspector: Arc<dyn ImageInspector>,
    image_rules: ImageRules,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        store: Arc<dyn ObjectStore>,
        inspector: Arc<dyn ImageInspector>,
    ) -> Self {
        Self {
            posts,
            users,
            store,
            inspector,
            image_rules: ImageRules::default(),
        }
    }

    /// Create a post authored by `requester`.
    ///
    /// An attached image is validated and uploaded before anything is written;
    /// if the post then fails to persist, the fresh blob is released again.
    pub async fn create(
        &self,
        requester: &Requester,
        input: NewPost,
        image: Option<ImageUpload>,
    ) -> Result<PostDetails, DomainError> {
        if !requester.can_author() {
            return Err(DomainError::forbidden(
                "Access denied. Author or admin required.",
            ));
        }
        let input = input.validate()?;

        let uploaded = match image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        let mut post = Post::new(requester.id, input.title, input.content);
        post.excerpt = input.excerpt;
        post.meta_description = input.meta_description;
        post.tags = input.tags.map(TagInput::normalize).unwrap_or_default();
        post.status = input.status.unwrap_or_default();
        post.is_featured = requester.is_admin() && input.is_featured.unwrap_or(false);
        post.image = uploaded.clone();

        let saved = match self.posts.insert(post).await {
            Ok(saved) => saved,
            Err(err) => {
                if let Some(image) = &uploaded {
                    self.release_image(image).await;
                }
                return Err(err.into());
            }
        };

        tracing::info!(post_id = %saved.id, slug = %saved.slug, author_id = %saved.author_id, "Post created");
        self.with_author(saved).await
    }

    /// Apply a partial update. A replacement image is uploaded first; the
    /// superseded blob is deleted only after the record has been saved.
    pub async fn update(
        &self,
        requester: &Requester,
        post_id: Uuid,
        patch: PostPatch,
        image: Option<ImageUpload>,
    ) -> Result<PostDetails, DomainError> {
        if !requester.can_author() {
            return Err(DomainError::forbidden(
                "Access denied. Author or admin required.",
            ));
        }
        let mut post = self.load(post_id).await?;
        if !requester.acts_for(post.author_id) {
            return Err(DomainError::forbidden("Not authorized to update this post"));
        }
        let patch = patch.validate()?;

        let replacement = match image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        if let Some(title) = patch.title {
            if post.retitle(title) {
                tracing::debug!(post_id = %post.id, slug = %post.slug, "Slug recomputed");
            }
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            post.excerpt = Some(excerpt);
        }
        if let Some(meta) = patch.meta_description {
            post.meta_description = Some(meta);
        }
        if let Some(tags) = patch.tags {
            post.tags = tags.normalize();
        }
        if let Some(status) = patch.status {
            post.status = status;
        }
        match patch.is_featured {
            Some(featured) if requester.is_admin() => post.is_featured = featured,
            Some(_) => tracing::debug!(post_id = %post.id, "Ignoring isFeatured from non-admin"),
            None => {}
        }
        let superseded = match &replacement {
            Some(image) => post.image.replace(image.clone()),
            None => None,
        };
        post.touch();

        let saved = match self.posts.update(post).await {
            Ok(saved) => saved,
            Err(err) => {
                if let Some(image) = &replacement {
                    self.release_image(image).await;
                }
                return Err(not_found_as_post(err, post_id));
            }
        };

        if let Some(old) = &superseded {
            self.release_image(old).await;
        }

        tracing::info!(post_id = %saved.id, "Post updated");
        self.with_author(saved).await
    }

    /// Delete a post. Its image blob is deleted first; if the object store
    /// fails, the post record is kept and the error is returned.
    pub async fn delete(&self, requester: &Requester, post_id: Uuid) -> Result<(), DomainError> {
        let post = self.load(post_id).await?;
        if !requester.acts_for(post.author_id) {
            return Err(DomainError::forbidden("Not authorized to delete this post"));
        }

        if let Some(image) = &post.image {
            match self.store.delete(&image.external_id).await {
                Ok(DeleteOutcome::Deleted) => {}
                Ok(DeleteOutcome::NotFound) => {
                    tracing::warn!(post_id = %post.id, external_id = %image.external_id, "Image blob already missing");
                }
                Err(err) => {
                    tracing::error!(post_id = %post.id, error = %err, "Failed to delete image blob; keeping post");
                    return Err(err.into());
                }
            }
        }

        self.posts
            .delete(post_id)
            .await
            .map_err(|err| not_found_as_post(err, post_id))?;

        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Public read of a published post. Counts as one view.
    pub async fn get_by_slug(&self, slug: &str) -> Result<PostDetails, DomainError> {
        let post = self
            .posts
            .record_view(slug)
            .await?
            .ok_or_else(|| DomainError::post_not_found(slug))?;
        self.with_author(post).await
    }

    /// Private read for the author or an admin, regardless of status.
    pub async fn get_by_id(
        &self,
        requester: &Requester,
        post_id: Uuid,
    ) -> Result<PostDetails, DomainError> {
        let post = self.load(post_id).await?;
        if !requester.acts_for(post.author_id) {
            return Err(DomainError::forbidden("Not authorized to view this post"));
        }
        self.with_author(post).await
    }

    pub async fn toggle_featured(
        &self,
        requester: &Requester,
        post_id: Uuid,
    ) -> Result<PostDetails, DomainError> {
        if !requester.is_admin() {
            return Err(DomainError::forbidden("Admin access required"));
        }
        let mut post = self.load(post_id).await?;
        post.is_featured = !post.is_featured;
        post.touch();

        let saved = self
            .posts
            .update(post)
            .await
            .map_err(|err| not_found_as_post(err, post_id))?;
        tracing::info!(post_id = %saved.id, featured = saved.is_featured, "Featured flag toggled");
        self.with_author(saved).await
    }

    pub async fn list_public(&self, query: PublicPostQuery) -> Result<Page<PostDetails>, DomainError> {
        let filter = PostFilter::public(query.tag.as_deref(), query.author_id);
        self.page_of(&filter, PostSort::RecentlyPublished, query.page)
            .await
    }

    pub async fn list_for_owner(
        &self,
        requester: &Requester,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<PostDetails>, DomainError> {
        if !requester.acts_for(owner_id) {
            return Err(DomainError::forbidden("Not authorized to view these posts"));
        }
        let filter = PostFilter::owned_by(owner_id, requester);
        self.page_of(&filter, PostSort::Newest, page).await
    }

    pub async fn list_admin(
        &self,
        requester: &Requester,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> Result<Page<PostDetails>, DomainError> {
        if !requester.is_admin() {
            return Err(DomainError::forbidden("Admin access required"));
        }
        self.page_of(&PostFilter::admin(status), PostSort::Newest, page)
            .await
    }

    async fn load(&self, post_id: Uuid) -> Result<Post, DomainError> {
        tracing::debug!(post_id = %post_id, "Loading post");
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    async fn store_image(&self, upload: ImageUpload) -> Result<PostImage, DomainError> {
        self.image_rules.check_format(&upload)?;
        let (width, height) = self.inspector.dimensions(&upload.bytes)?;
        self.image_rules.check_dimensions(width, height)?;

        let stored = self.store.upload(upload.bytes, &upload.file_name).await?;
        tracing::debug!(external_id = %stored.external_id, width, height, "Image uploaded");
        Ok(PostImage {
            url: stored.url,
            external_id: stored.external_id,
        })
    }

    /// Best-effort blob deletion. Failures are logged and swallowed.
    async fn release_image(&self, image: &PostImage) {
        if let Err(err) = self.store.delete(&image.external_id).await {
            tracing::warn!(external_id = %image.external_id, error = %err, "Failed to delete image blob");
        }
    }

    async fn with_author(&self, post: Post) -> Result<PostDetails, DomainError> {
        let author = self
            .users
            .find_summaries(&[post.author_id])
            .await?
            .into_iter()
            .next()
            .unwrap_or_else(|| AuthorSummary::unknown(post.author_id));
        Ok(PostDetails { post, author })
    }

    async fn page_of(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<Page<PostDetails>, DomainError> {
        let (posts, total) = self.posts.list(filter, sort, page).await?;

        let mut author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<Uuid, AuthorSummary> = self
            .users
            .find_summaries(&author_ids)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();

        Ok(Page::new(posts, page, total).map(|post| {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .unwrap_or_else(|| AuthorSummary::unknown(post.author_id));
            PostDetails { post, author }
        }))
    }
}

fn not_found_as_post(err: RepoError, post_id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::post_not_found(post_id),
        other => other.into(),
    }
}
