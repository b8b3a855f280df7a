//! Cloudinary object store: signed uploads and deletes over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use quill_core::ports::{DeleteOutcome, ObjectStore, ObjectStoreError, StoredObject};

/// Cloudinary account and transport settings.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder uploads are placed in.
    pub folder: String,
    /// API root, overridable for tests.
    pub api_base: String,
    pub timeout: Duration,
}

impl CloudinaryConfig {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            cloud_name,
            api_key,
            api_secret,
            folder: "blog-posts".to_string(),
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Cloudinary-backed object store.
pub struct CloudinaryObjectStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryObjectStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ObjectStoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// SHA-256 request signature: sorted `key=value` pairs joined by `&`,
    /// followed by the API secret. `params` must already be sorted by key.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let payload = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        hex::encode(Sha256::digest(format!("{payload}{}", self.config.api_secret)))
    }

    fn signed_form(&self, params: &[(&str, &str)]) -> Form {
        let signature = self.sign(params);
        params
            .iter()
            .fold(Form::new(), |form, (key, value)| {
                form.text(key.to_string(), value.to_string())
            })
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn send(&self, action: &str, form: Form) -> Result<reqwest::Response, ObjectStoreError> {
        let response = self
            .client
            .post(self.endpoint(action))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Rejected(format!("{status}: {body}")));
        }
        Ok(response)
    }
}

fn transport_error(err: reqwest::Error) -> ObjectStoreError {
    if err.is_timeout() {
        ObjectStoreError::Timeout
    } else {
        ObjectStoreError::Request(err.to_string())
    }
}

#[async_trait]
impl ObjectStore for CloudinaryObjectStore {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<StoredObject, ObjectStoreError> {
        let timestamp = Utc::now().timestamp().to_string();
        let form = self
            .signed_form(&[("folder", &self.config.folder), ("timestamp", &timestamp)])
            .part("file", Part::bytes(bytes).file_name(name.to_string()));

        let uploaded: UploadResponse = self
            .send("upload", form)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        tracing::info!(public_id = %uploaded.public_id, "Image uploaded to Cloudinary");
        Ok(StoredObject {
            url: uploaded.secure_url,
            external_id: uploaded.public_id,
        })
    }

    async fn delete(&self, external_id: &str) -> Result<DeleteOutcome, ObjectStoreError> {
        let timestamp = Utc::now().timestamp().to_string();
        let form = self.signed_form(&[("public_id", external_id), ("timestamp", &timestamp)]);

        let destroyed: DestroyResponse = self
            .send("destroy", form)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        match destroyed.result.as_str() {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not found" => Ok(DeleteOutcome::NotFound),
            other => Err(ObjectStoreError::Rejected(format!(
                "unexpected destroy result: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: String) -> CloudinaryConfig {
        CloudinaryConfig {
            api_base,
            timeout: Duration::from_millis(500),
            ..CloudinaryConfig::new("demo".into(), "key".into(), "secret".into())
        }
    }

    #[test]
    fn test_signature_is_sha256_of_sorted_params_and_secret() {
        let store = CloudinaryObjectStore::new(config("http://unused".into())).unwrap();

        let signature = store.sign(&[("folder", "blog-posts"), ("timestamp", "1700000000")]);

        let expected = hex::encode(Sha256::digest(
            "folder=blog-posts&timestamp=1700000000secret",
        ));
        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 64);
    }

    #[tokio::test]
    async fn test_upload_returns_url_and_public_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "https://res.cloudinary.com/demo/blog-posts/abc.png",
                "public_id": "blog-posts/abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = CloudinaryObjectStore::new(config(server.uri())).unwrap();
        let stored = store.upload(vec![1, 2, 3], "cover.png").await.unwrap();

        assert_eq!(stored.external_id, "blog-posts/abc");
        assert!(stored.url.ends_with("abc.png"));
    }

    #[tokio::test]
    async fn test_upload_rejection_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Signature"))
            .mount(&server)
            .await;

        let store = CloudinaryObjectStore::new(config(server.uri())).unwrap();
        let result = store.upload(vec![1], "cover.png").await;

        assert!(matches!(result, Err(ObjectStoreError::Rejected(msg)) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_destroy_outcomes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/destroy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "not found" })))
            .mount(&server)
            .await;

        let store = CloudinaryObjectStore::new(config(server.uri())).unwrap();

        assert_eq!(
            store.delete("blog-posts/gone").await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_slow_upstream_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": "ok" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let store = CloudinaryObjectStore::new(config(server.uri())).unwrap();

        assert!(matches!(
            store.delete("blog-posts/slow").await,
            Err(ObjectStoreError::Timeout)
        ));
    }
}
