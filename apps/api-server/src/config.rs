//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use quill_infra::JwtConfig;
use quill_infra::database::DatabaseConfig;

#[cfg(feature = "cloudinary")]
use quill_infra::CloudinaryConfig;

use crate::telemetry::TelemetryConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on in-memory repositories.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    /// `None` keeps uploaded images in memory.
    #[cfg(feature = "cloudinary")]
    pub cloudinary: Option<CloudinaryConfig>,
    /// Deadline for a single post operation.
    pub request_timeout: Duration,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parsed("DB_MAX_CONNECTIONS", 20),
            min_connections: parsed("DB_MIN_CONNECTIONS", 2),
        });

        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expiration_hours: parsed("JWT_EXPIRATION_HOURS", defaults.expiration_hours),
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080),
            database,
            jwt,
            #[cfg(feature = "cloudinary")]
            cloudinary: Self::cloudinary_from_env(),
            request_timeout: Duration::from_secs(parsed("REQUEST_TIMEOUT_SECS", 30)),
            telemetry: TelemetryConfig::from_env(),
        }
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt.secret == JwtConfig::default().secret
    }

    /// All three credentials must be present; a partial set is treated as absent.
    #[cfg(feature = "cloudinary")]
    fn cloudinary_from_env() -> Option<CloudinaryConfig> {
        let cloud_name = env::var("CLOUDINARY_CLOUD_NAME").ok()?;
        let api_key = env::var("CLOUDINARY_API_KEY").ok()?;
        let api_secret = env::var("CLOUDINARY_API_SECRET").ok()?;

        let mut config = CloudinaryConfig::new(cloud_name, api_key, api_secret);
        if let Ok(folder) = env::var("CLOUDINARY_FOLDER") {
            config.folder = folder;
        }
        Some(config)
    }
}

/// Read and parse an environment variable, falling back on absence or parse failure.
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
