use serde::{Deserialize, Serialize};

use crate::entity::tag;
use crate::error::AppError;

use super::blog_post::BlogPostResponse;
use super::shared::validate_length;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateTagRequest {
    pub name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(tag: tag::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TagListResponse {
    pub data: Vec<TagResponse>,
    pub count: u64,
}

/// A tag together with every blog post carrying it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TagWithPostsResponse {
    pub id: i32,
    pub name: String,
    pub blog_posts: Vec<BlogPostResponse>,
}

pub fn validate_tag_name(name: &str) -> Result<(), AppError> {
    validate_length(name, "Tag name", 50)
}
