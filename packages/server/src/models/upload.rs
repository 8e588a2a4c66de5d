use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    pub filename: String,
    /// File size in bytes.
    pub size: u64,
    /// Public path the image is served from.
    pub url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageInfo {
    pub filename: String,
    pub size: u64,
    pub url: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageListResponse {
    pub data: Vec<ImageInfo>,
    pub count: u64,
}
