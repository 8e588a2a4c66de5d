use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::comment;
use crate::error::AppError;

use super::shared::validate_length;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    pub content: String,
    /// Parent comment ID when replying. Must reference a comment on the
    /// same blog post.
    pub reply_to: Option<i32>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub content: String,
    pub comment_date: DateTime<Utc>,
    /// NULL once the author's account has been deleted.
    pub user_id: Option<Uuid>,
    pub blog_post_id: i32,
    pub reply_to: Option<i32>,
    /// Author name, resolved when the author still exists.
    pub username: Option<String>,
}

impl CommentResponse {
    pub fn from_model(comment: comment::Model, username: Option<String>) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            comment_date: comment.comment_date,
            user_id: comment.user_id,
            blog_post_id: comment.blog_post_id,
            reply_to: comment.reply_to,
            username,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentListResponse {
    pub data: Vec<CommentResponse>,
    pub count: u64,
}

pub fn validate_comment_content(content: &str) -> Result<(), AppError> {
    validate_length(content, "Comment", 1000)
}
