use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog_post, blog_post_tag, tag};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::blog_post::BlogPostResponse;
use crate::models::shared::{ListQuery, Message, page_window};
use crate::models::tag::*;
use crate::policy::{self, Action};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List tags",
    params(ListQuery),
    responses(
        (status = 200, description = "List of tags", body = TagListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TagListResponse>, AppError> {
    let (skip, limit) = page_window(&query);

    let count = tag::Entity::find().count(&state.db).await?;
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .offset(skip)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(TagListResponse {
        data: tags.into_iter().map(TagResponse::from).collect(),
        count,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Tags",
    operation_id = "getTag",
    summary = "Get a tag by ID",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "The tag", body = TagResponse),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagResponse>, AppError> {
    let tag = find_tag(&state.db, id).await?;
    Ok(Json(TagResponse::from(tag)))
}

#[utoipa::path(
    get,
    path = "/{id}/blogposts",
    tag = "Tags",
    operation_id = "getTagBlogPosts",
    summary = "Get a tag with every blog post carrying it",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "The tag and its blog posts", body = TagWithPostsResponse),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_tag_blog_posts(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TagWithPostsResponse>, AppError> {
    let tag = find_tag(&state.db, id).await?;

    let posts = tag
        .find_related(blog_post::Entity)
        .order_by_desc(blog_post::Column::PublicationDate)
        .all(&state.db)
        .await?;
    let post_tags = posts
        .load_many_to_many(tag::Entity, blog_post_tag::Entity, &state.db)
        .await?;

    let blog_posts = posts
        .into_iter()
        .zip(post_tags)
        .map(|(post, tags)| {
            BlogPostResponse::from_model(post, tags.into_iter().map(TagResponse::from).collect())
        })
        .collect();

    Ok(Json(TagWithPostsResponse {
        id: tag.id,
        name: tag.name,
        blog_posts,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 409, description = "Tag name already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload), fields(name = %payload.name))]
pub async fn create_tag(
    current: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&current.principal(), &Action::ManageTags)?;
    validate_tag_name(&payload.name)?;

    let name = payload.name.trim().to_string();
    ensure_name_free(&state.db, &name, None).await?;

    let new_tag = tag::ActiveModel {
        name: Set(name),
        ..Default::default()
    };

    let model = new_tag.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A tag with this name already exists".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Rename a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Updated tag", body = TagResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Tag name already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload))]
pub async fn update_tag(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    policy::authorize(&current.principal(), &Action::ManageTags)?;
    validate_tag_name(&payload.name)?;

    let tag = find_tag(&state.db, id).await?;

    let name = payload.name.trim().to_string();
    if name != tag.name {
        ensure_name_free(&state.db, &name, Some(id)).await?;
    }

    let mut active: tag::ActiveModel = tag.into();
    active.name = Set(name);
    let model = active.update(&state.db).await?;

    Ok(Json(TagResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Removes the tag and its blog post links. The blog posts \
        themselves survive.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag deleted", body = Message),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn delete_tag(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Message>, AppError> {
    policy::authorize(&current.principal(), &Action::ManageTags)?;

    let txn = state.db.begin().await?;

    find_tag(&txn, id).await?;

    blog_post_tag::Entity::delete_many()
        .filter(blog_post_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    tag::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    Ok(Json(Message::new("Tag deleted successfully")))
}

async fn find_tag<C: ConnectionTrait>(conn: &C, id: i32) -> Result<tag::Model, AppError> {
    tag::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".into()))
}

async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let existing = tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(conn)
        .await?;
    if existing.is_some_and(|t| Some(t.id) != exclude) {
        return Err(AppError::Conflict(
            "A tag with this name already exists".into(),
        ));
    }
    Ok(())
}
