//! Create/update request bodies: JSON, or multipart form data with an image.

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::TryStreamExt;
use futures::future::LocalBoxFuture;

use quill_core::domain::{ImageRules, ImageUpload};
use quill_shared::{PostForm, TagsField};

use crate::middleware::error::AppError;

/// Form fields plus an optional image file.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub form: PostForm,
    pub image: Option<ImageUpload>,
}

impl FromRequest for PostSubmission {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::new(req.headers(), payload.take());
            Box::pin(read_multipart(multipart))
        } else {
            let json = web::Json::<PostForm>::from_request(req, payload);
            Box::pin(async move {
                let form = json
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .into_inner();
                Ok(PostSubmission { form, image: None })
            })
        }
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {err}"))
}

async fn read_multipart(mut multipart: Multipart) -> Result<PostSubmission, AppError> {
    let mut submission = PostSubmission::default();
    let mut tags: Vec<String> = Vec::new();

    while let Some(mut field) = multipart.try_next().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default()
                .to_string();
            let content_type = field.content_type().map(|m| m.essence_str().to_string());
            let bytes = read_bytes(&mut field, "Image").await?;
            submission.image = Some(ImageUpload::new(file_name, content_type, bytes));
            continue;
        }

        let value = read_text(&mut field).await?;
        let form = &mut submission.form;
        match name.as_str() {
            "title" => form.title = Some(value),
            "content" => form.content = Some(value),
            "excerpt" => form.excerpt = Some(value),
            "metaDescription" => form.meta_description = Some(value),
            "status" => form.status = Some(value),
            "isFeatured" => form.is_featured = Some(value.trim() == "true"),
            "tags" | "tags[]" => tags.push(value),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    // A single `tags` field is a comma-separated list; repeated fields are items.
    submission.form.tags = match tags.len() {
        0 => None,
        1 => tags.pop().map(TagsField::Csv),
        _ => Some(TagsField::List(tags)),
    };

    Ok(submission)
}

/// Buffer a field, refusing anything past the image size cap.
async fn read_bytes(field: &mut Field, label: &str) -> Result<Vec<u8>, AppError> {
    let limit = ImageRules::default().max_bytes;
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::BadRequest(format!(
                "{label} must be at most {} MB",
                limit / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_text(field: &mut Field) -> Result<String, AppError> {
    let bytes = read_bytes(field, "Form field").await?;
    String::from_utf8(bytes).map_err(|_| AppError::BadRequest("Form fields must be UTF-8".into()))
}
