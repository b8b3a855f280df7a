//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use quill_core::PostService;
use quill_core::ports::{ObjectStore, PostRepository, UserRepository};
use quill_infra::{
    ImageCrateInspector, InMemoryObjectStore, InMemoryPostRepository, InMemoryUserRepository,
};

#[cfg(feature = "postgres")]
use quill_infra::{DatabaseConnections, PostgresPostRepository, PostgresUserRepository};

#[cfg(feature = "cloudinary")]
use quill_infra::CloudinaryObjectStore;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    /// Accounts behind bearer tokens.
    pub users: Arc<dyn UserRepository>,
    /// Deadline applied to every post operation.
    pub request_timeout: Duration,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (db, post_repo, user_repo) = Self::repositories(config).await;

        #[cfg(not(feature = "postgres"))]
        let (post_repo, user_repo): (Arc<dyn PostRepository>, Arc<dyn UserRepository>) = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            (
                Arc::new(InMemoryPostRepository::new()),
                Arc::new(InMemoryUserRepository::new()),
            )
        };

        let store = Self::object_store(config);
        let posts = PostService::new(
            post_repo,
            user_repo.clone(),
            store,
            Arc::new(ImageCrateInspector),
        );

        tracing::info!("Application state initialized");

        Self {
            posts: Arc::new(posts),
            users: user_repo,
            request_timeout: config.request_timeout,
            #[cfg(feature = "postgres")]
            db,
        }
    }

    /// State backed entirely by in-memory adapters.
    #[cfg(test)]
    pub fn in_memory(request_timeout: Duration) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let posts = PostService::new(
            Arc::new(InMemoryPostRepository::new()),
            users.clone(),
            Arc::new(InMemoryObjectStore::default()),
            Arc::new(ImageCrateInspector),
        );

        Self {
            posts: Arc::new(posts),
            users,
            request_timeout,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(
        config: &AppConfig,
    ) -> (
        Option<Arc<DatabaseConnections>>,
        Arc<dyn PostRepository>,
        Arc<dyn UserRepository>,
    ) {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return (
                None,
                Arc::new(InMemoryPostRepository::new()),
                Arc::new(InMemoryUserRepository::new()),
            );
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => {
                let conn = Arc::new(connections);
                let posts: Arc<dyn PostRepository> =
                    Arc::new(PostgresPostRepository::new(conn.main.clone()));
                let users: Arc<dyn UserRepository> =
                    Arc::new(PostgresUserRepository::new(conn.main.clone()));
                (Some(conn), posts, users)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                (
                    None,
                    Arc::new(InMemoryPostRepository::new()),
                    Arc::new(InMemoryUserRepository::new()),
                )
            }
        }
    }

    #[cfg(feature = "cloudinary")]
    fn object_store(config: &AppConfig) -> Arc<dyn ObjectStore> {
        let Some(cloudinary) = config.cloudinary.clone() else {
            tracing::warn!("Cloudinary not configured. Images are kept in memory.");
            return Arc::new(InMemoryObjectStore::default());
        };

        let folder = cloudinary.folder.clone();
        match CloudinaryObjectStore::new(cloudinary) {
            Ok(store) => {
                tracing::info!(folder = %folder, "Cloudinary object store ready");
                Arc::new(store)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build Cloudinary client. Images are kept in memory.");
                Arc::new(InMemoryObjectStore::new(folder))
            }
        }
    }

    #[cfg(not(feature = "cloudinary"))]
    fn object_store(_config: &AppConfig) -> Arc<dyn ObjectStore> {
        tracing::info!("Running without cloudinary feature - images are kept in memory");
        Arc::new(InMemoryObjectStore::default())
    }
}
