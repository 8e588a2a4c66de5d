use std::path::PathBuf;

use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::models::shared::Message;
use crate::models::upload::{ImageInfo, ImageListResponse, ImageResponse};
use crate::policy::{self, Action};
use crate::state::AppState;
use crate::utils::filename::{
    has_allowed_extension, validate_flat_filename, with_stem_suffix,
};

/// Request body cap for image uploads, leaving multipart framing headroom
/// over the configured per-file limit.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024)
}

#[utoipa::path(
    post,
    path = "/images",
    tag = "Uploads",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Multipart upload of a single `file` field. The file must \
        be an image with an allowed extension and fit the configured size \
        cap. A name collision gets a timestamp suffix instead of \
        overwriting.",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "Not an image, bad filename, or too large (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, multipart))]
pub async fn upload_image(
    current: CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&current.principal(), &Action::ManageImages)?;

    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => {
                return Err(AppError::BadRequest(
                    "Missing multipart field 'file'".into(),
                ));
            }
        }
    };

    let filename = field
        .file_name()
        .ok_or_else(|| AppError::BadRequest("Missing filename".into()))?;
    let filename = validate_flat_filename(filename)
        .map_err(|e| AppError::BadRequest(e.message().into()))?
        .to_string();

    let content_type = field
        .content_type()
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()))
        .unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest("File must be an image".into()));
    }

    if !has_allowed_extension(&filename, &state.config.uploads.allowed_extensions) {
        return Err(AppError::BadRequest(format!(
            "File extension not allowed. Allowed: {}",
            state.config.uploads.allowed_extensions.join(", ")
        )));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
    if data.len() > state.config.uploads.max_file_size {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {} bytes",
            state.config.uploads.max_file_size
        )));
    }

    let dir = PathBuf::from(&state.config.uploads.dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {}", e)))?;

    let mut stored_name = filename;
    if tokio::fs::try_exists(dir.join(&stored_name))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to stat file: {}", e)))?
    {
        stored_name = with_stem_suffix(
            &stored_name,
            &format!("_{}", chrono::Utc::now().timestamp()),
        );
    }

    tokio::fs::write(dir.join(&stored_name), &data)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save file: {}", e)))?;

    tracing::info!(filename = %stored_name, size = data.len(), "image uploaded");

    Ok((
        StatusCode::CREATED,
        Json(ImageResponse {
            url: format!("/uploads/{}", stored_name),
            filename: stored_name,
            size: data.len() as u64,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/images",
    tag = "Uploads",
    operation_id = "listImages",
    summary = "List uploaded images",
    responses(
        (status = 200, description = "Uploaded images, newest first", body = ImageListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn list_images(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ImageListResponse>, AppError> {
    policy::authorize(&current.principal(), &Action::ManageImages)?;

    let dir = PathBuf::from(&state.config.uploads.dir);
    let mut images = Vec::new();

    if tokio::fs::try_exists(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to stat upload dir: {}", e)))?
    {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read upload dir: {}", e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read upload dir: {}", e)))?
        {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !has_allowed_extension(&name, &state.config.uploads.allowed_extensions) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let upload_date = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            images.push(ImageInfo {
                url: format!("/uploads/{}", name),
                filename: name,
                size: meta.len(),
                upload_date,
            });
        }
    }

    images.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));

    Ok(Json(ImageListResponse {
        count: images.len() as u64,
        data: images,
    }))
}

#[utoipa::path(
    delete,
    path = "/images/{filename}",
    tag = "Uploads",
    operation_id = "deleteImage",
    summary = "Delete an uploaded image",
    params(("filename" = String, Path, description = "Image filename")),
    responses(
        (status = 200, description = "Image deleted", body = Message),
        (status = 400, description = "Bad filename (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn delete_image(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Message>, AppError> {
    policy::authorize(&current.principal(), &Action::ManageImages)?;

    let filename = validate_flat_filename(&filename)
        .map_err(|e| AppError::BadRequest(e.message().into()))?
        .to_string();

    let path = PathBuf::from(&state.config.uploads.dir).join(&filename);
    if !tokio::fs::try_exists(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to stat file: {}", e)))?
    {
        return Err(AppError::NotFound("Image not found".into()));
    }

    tokio::fs::remove_file(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to delete file: {}", e)))?;

    Ok(Json(Message::new(format!(
        "Image {filename} deleted successfully"
    ))))
}
