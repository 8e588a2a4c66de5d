use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::blog_post;
use crate::error::AppError;

use super::comment::CommentResponse;
use super::shared::{double_option, validate_length, validate_slug};
use super::tag::TagResponse;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBlogPostRequest {
    pub title: String,
    /// URL slug, the public lookup key.
    pub url: String,
    pub content: String,
    pub image_path: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub publication_date: Option<DateTime<Utc>>,
    /// IDs of existing tags. Every ID must resolve.
    #[serde(default)]
    pub tags: Vec<i32>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateBlogPostRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_path: Option<Option<String>>,
    pub featured: Option<bool>,
    pub publication_date: Option<DateTime<Utc>>,
    /// When present, replaces the full tag set.
    pub tags: Option<Vec<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogPostResponse {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub content: String,
    pub image_path: Option<String>,
    pub featured: bool,
    pub publication_date: DateTime<Utc>,
    pub tags: Vec<TagResponse>,
}

impl BlogPostResponse {
    pub fn from_model(post: blog_post::Model, tags: Vec<TagResponse>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            url: post.url,
            content: post.content,
            image_path: post.image_path,
            featured: post.featured,
            publication_date: post.publication_date,
            tags,
        }
    }
}

/// A blog post with its comment thread, as served on the article page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogPostDetailResponse {
    #[serde(flatten)]
    pub post: BlogPostResponse,
    pub comments: Vec<CommentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogPostListResponse {
    pub data: Vec<BlogPostResponse>,
    pub count: u64,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct BlogPostListQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    /// Case-insensitive title substring search.
    pub search: Option<String>,
}

pub fn validate_create_blog_post(payload: &CreateBlogPostRequest) -> Result<(), AppError> {
    validate_length(&payload.title, "Title", 255)?;
    validate_slug(&payload.url)?;
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("Content must not be empty".into()));
    }
    Ok(())
}

pub fn validate_update_blog_post(payload: &UpdateBlogPostRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_length(title, "Title", 255)?;
    }
    if let Some(ref url) = payload.url {
        validate_slug(url)?;
    }
    if let Some(ref content) = payload.content
        && content.trim().is_empty()
    {
        return Err(AppError::Validation("Content must not be empty".into()));
    }
    Ok(())
}
