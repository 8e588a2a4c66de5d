use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::comment::*;
use crate::models::shared::{ListQuery, Message, page_window};
use crate::policy::{self, Action};
use crate::state::AppState;

use super::blog_post::find_blog_post;

#[utoipa::path(
    get,
    path = "/",
    tag = "Comments",
    operation_id = "listComments",
    summary = "List every comment",
    params(ListQuery),
    responses(
        (status = 200, description = "List of comments", body = CommentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, query))]
pub async fn list_comments(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    policy::authorize(&current.principal(), &Action::ListAllComments)?;

    let (skip, limit) = page_window(&query);

    let count = comment::Entity::find().count(&state.db).await?;
    let rows = comment::Entity::find()
        .find_also_related(user::Entity)
        .order_by_desc(comment::Column::CommentDate)
        .offset(skip)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(CommentListResponse {
        data: rows
            .into_iter()
            .map(|(c, author)| CommentResponse::from_model(c, author.map(|u| u.name)))
            .collect(),
        count,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Comments",
    operation_id = "getComment",
    summary = "Get a comment by ID",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "The comment", body = CommentResponse),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = find_comment(&state.db, id).await?;
    let username = author_name(&state.db, &comment).await?;

    Ok(Json(CommentResponse::from_model(comment, username)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Author or superuser only. Replies to the comment are \
        deleted with it.",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = Message),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn delete_comment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Message>, AppError> {
    let comment = find_comment(&state.db, id).await?;
    policy::authorize(
        &current.principal(),
        &Action::DeleteComment {
            author_id: comment.user_id,
        },
    )?;

    delete_comment_tree(&state.db, comment.id).await?;

    Ok(Json(Message::new("Comment deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "listBlogPostComments",
    summary = "List a blog post's comments",
    params(("id" = i32, Path, description = "Blog post ID"), ListQuery),
    responses(
        (status = 200, description = "The post's comments", body = CommentListResponse),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_blog_post_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    find_blog_post(&state.db, id).await?;

    let (skip, limit) = page_window(&query);

    let select = comment::Entity::find().filter(comment::Column::BlogPostId.eq(id));
    let count = select.clone().count(&state.db).await?;
    let rows = select
        .find_also_related(user::Entity)
        .order_by_asc(comment::Column::CommentDate)
        .offset(skip)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(CommentListResponse {
        data: rows
            .into_iter()
            .map(|(c, author)| CommentResponse::from_model(c, author.map(|u| u.name)))
            .collect(),
        count,
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a blog post",
    description = "Any active user may comment. A reply must target a \
        comment on the same blog post.",
    params(("id" = i32, Path, description = "Blog post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Reply target on another post (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blog post or reply target not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload))]
pub async fn create_comment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&current.principal(), &Action::CreateComment)?;
    validate_comment_content(&payload.content)?;

    find_blog_post(&state.db, id).await?;

    if let Some(reply_to) = payload.reply_to {
        let parent = find_comment(&state.db, reply_to).await?;
        policy::ensure_reply_target(&parent, id)?;
    }

    let new_comment = comment::ActiveModel {
        content: Set(payload.content),
        comment_date: Set(chrono::Utc::now()),
        user_id: Set(Some(current.0.id)),
        blog_post_id: Set(id),
        reply_to: Set(payload.reply_to),
        ..Default::default()
    };

    let model = new_comment.insert(&state.db).await?;
    let username = Some(current.0.name);

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::from_model(model, username)),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Update a comment",
    description = "Author only. The comment timestamp is refreshed on \
        every update.",
    params(
        ("id" = i32, Path, description = "Blog post ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated comment", body = CommentResponse),
        (status = 400, description = "Comment on another post (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Blog post or comment not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload))]
pub async fn update_comment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    find_blog_post(&state.db, id).await?;
    let comment = find_comment(&state.db, comment_id).await?;
    policy::ensure_comment_on_post(&comment, id)?;
    policy::authorize(
        &current.principal(),
        &Action::UpdateComment {
            author_id: comment.user_id,
        },
    )?;

    if let Some(ref content) = payload.content {
        validate_comment_content(content)?;
    }

    let mut active: comment::ActiveModel = comment.into();
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    active.comment_date = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    let username = author_name(&state.db, &model).await?;

    Ok(Json(CommentResponse::from_model(model, username)))
}

#[utoipa::path(
    delete,
    path = "/{id}/comments/{comment_id}",
    tag = "Comments",
    operation_id = "deleteBlogPostComment",
    summary = "Delete a comment on a blog post",
    description = "Author or superuser only. Replies to the comment are \
        deleted with it.",
    params(
        ("id" = i32, Path, description = "Blog post ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment deleted", body = Message),
        (status = 400, description = "Comment on another post (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Blog post or comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn delete_blog_post_comment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(i32, i32)>,
) -> Result<Json<Message>, AppError> {
    find_blog_post(&state.db, id).await?;
    let comment = find_comment(&state.db, comment_id).await?;
    policy::ensure_comment_on_post(&comment, id)?;
    policy::authorize(
        &current.principal(),
        &Action::DeleteComment {
            author_id: comment.user_id,
        },
    )?;

    delete_comment_tree(&state.db, comment.id).await?;

    Ok(Json(Message::new("Comment deleted successfully")))
}

async fn find_comment<C: ConnectionTrait>(conn: &C, id: i32) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

async fn author_name<C: ConnectionTrait>(
    conn: &C,
    comment: &comment::Model,
) -> Result<Option<String>, AppError> {
    let Some(user_id) = comment.user_id else {
        return Ok(None);
    };
    Ok(user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|u| u.name))
}

/// Delete a comment together with its whole reply tree.
///
/// Replies are collected level by level and removed deepest-first so the
/// self-referencing parent constraint never trips.
async fn delete_comment_tree(db: &DatabaseConnection, root: i32) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let mut levels = vec![vec![root]];
    loop {
        let children: Vec<i32> = comment::Entity::find()
            .filter(comment::Column::ReplyTo.is_in(levels[levels.len() - 1].clone()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if children.is_empty() {
            break;
        }
        levels.push(children);
    }

    for level in levels.into_iter().rev() {
        comment::Entity::delete_many()
            .filter(comment::Column::Id.is_in(level))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;
    Ok(())
}
