use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{blog_post, blog_post_tag, comment, tag, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::blog_post::*;
use crate::models::comment::CommentResponse;
use crate::models::shared::{Message, escape_like};
use crate::models::tag::TagResponse;
use crate::policy::{self, Action};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Blog Posts",
    operation_id = "listBlogPosts",
    summary = "List blog posts",
    description = "Public listing, newest first, with optional case-insensitive title search.",
    params(BlogPostListQuery),
    responses(
        (status = 200, description = "List of blog posts", body = BlogPostListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_blog_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogPostListQuery>,
) -> Result<Json<BlogPostListResponse>, AppError> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 100);

    let mut select = blog_post::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(blog_post::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let count = select.clone().count(&state.db).await?;
    let posts = select
        .order_by_desc(blog_post::Column::PublicationDate)
        .offset(skip)
        .limit(limit)
        .all(&state.db)
        .await?;

    let tags = posts
        .load_many_to_many(tag::Entity, blog_post_tag::Entity, &state.db)
        .await?;

    let data = posts
        .into_iter()
        .zip(tags)
        .map(|(post, tags)| {
            BlogPostResponse::from_model(post, tags.into_iter().map(TagResponse::from).collect())
        })
        .collect();

    Ok(Json(BlogPostListResponse { data, count }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Blog Posts",
    operation_id = "getBlogPost",
    summary = "Get a blog post by URL slug",
    description = "Public article view: the post with its tags and full comment thread.",
    params(("id" = String, Path, description = "Blog post URL slug")),
    responses(
        (status = 200, description = "The blog post", body = BlogPostDetailResponse),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_blog_post(
    State(state): State<AppState>,
    Path(url): Path<String>,
) -> Result<Json<BlogPostDetailResponse>, AppError> {
    let post = blog_post::Entity::find()
        .filter(blog_post::Column::Url.eq(&url))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post not found".into()))?;

    let tags = post.find_related(tag::Entity).all(&state.db).await?;

    let comments = comment::Entity::find()
        .filter(comment::Column::BlogPostId.eq(post.id))
        .find_also_related(user::Entity)
        .order_by_asc(comment::Column::CommentDate)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(c, author)| CommentResponse::from_model(c, author.map(|u| u.name)))
        .collect();

    Ok(Json(BlogPostDetailResponse {
        post: BlogPostResponse::from_model(
            post,
            tags.into_iter().map(TagResponse::from).collect(),
        ),
        comments,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Blog Posts",
    operation_id = "createBlogPost",
    summary = "Create a blog post",
    request_body = CreateBlogPostRequest,
    responses(
        (status = 201, description = "Blog post created", body = BlogPostResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "A referenced tag does not exist (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title or URL already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload), fields(title = %payload.title))]
pub async fn create_blog_post(
    current: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBlogPostRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&current.principal(), &Action::ManageBlogPosts)?;
    validate_create_blog_post(&payload)?;

    let title = payload.title.trim().to_string();
    let url = payload.url.trim().to_string();

    let txn = state.db.begin().await?;

    ensure_title_free(&txn, &title, None).await?;
    ensure_url_free(&txn, &url, None).await?;
    let tags = resolve_tags(&txn, &payload.tags).await?;

    let new_post = blog_post::ActiveModel {
        title: Set(title),
        url: Set(url),
        content: Set(payload.content),
        image_path: Set(payload.image_path),
        featured: Set(payload.featured),
        publication_date: Set(payload.publication_date.unwrap_or_else(chrono::Utc::now)),
        ..Default::default()
    };

    let model = new_post.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A blog post with this title or url already exists".into())
        }
        _ => AppError::from(e),
    })?;

    link_tags(&txn, model.id, &tags).await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(BlogPostResponse::from_model(
            model,
            tags.into_iter().map(TagResponse::from).collect(),
        )),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Blog Posts",
    operation_id = "updateBlogPost",
    summary = "Update a blog post",
    description = "Partial update by numeric ID. Supplying `tags` replaces \
        the full tag set; supplying `image_path: null` clears the image.",
    params(("id" = i32, Path, description = "Blog post ID")),
    request_body = UpdateBlogPostRequest,
    responses(
        (status = 200, description = "Updated blog post", body = BlogPostResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Blog post or referenced tag not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title or URL already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload))]
pub async fn update_blog_post(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBlogPostRequest>,
) -> Result<Json<BlogPostResponse>, AppError> {
    policy::authorize(&current.principal(), &Action::ManageBlogPosts)?;
    validate_update_blog_post(&payload)?;

    let txn = state.db.begin().await?;

    let post = find_blog_post(&txn, id).await?;

    let mut active: blog_post::ActiveModel = post.clone().into();
    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        if title != post.title {
            ensure_title_free(&txn, &title, Some(id)).await?;
            active.title = Set(title);
        }
    }
    if let Some(url) = payload.url {
        let url = url.trim().to_string();
        if url != post.url {
            ensure_url_free(&txn, &url, Some(id)).await?;
            active.url = Set(url);
        }
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(image_path) = payload.image_path {
        active.image_path = Set(image_path);
    }
    if let Some(featured) = payload.featured {
        active.featured = Set(featured);
    }
    if let Some(publication_date) = payload.publication_date {
        active.publication_date = Set(publication_date);
    }

    let model = active.update(&txn).await?;

    let tags = match payload.tags {
        Some(ref tag_ids) => {
            let tags = resolve_tags(&txn, tag_ids).await?;
            blog_post_tag::Entity::delete_many()
                .filter(blog_post_tag::Column::BlogPostId.eq(id))
                .exec(&txn)
                .await?;
            link_tags(&txn, id, &tags).await?;
            tags
        }
        None => model.find_related(tag::Entity).all(&txn).await?,
    };

    txn.commit().await?;

    Ok(Json(BlogPostResponse::from_model(
        model,
        tags.into_iter().map(TagResponse::from).collect(),
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Blog Posts",
    operation_id = "deleteBlogPost",
    summary = "Delete a blog post",
    description = "Deletes the post together with its comments and tag \
        links. The tags themselves survive.",
    params(("id" = i32, Path, description = "Blog post ID")),
    responses(
        (status = 200, description = "Blog post deleted", body = Message),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Blog post not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn delete_blog_post(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Message>, AppError> {
    policy::authorize(&current.principal(), &Action::ManageBlogPosts)?;

    let txn = state.db.begin().await?;

    find_blog_post(&txn, id).await?;

    comment::Entity::delete_many()
        .filter(comment::Column::BlogPostId.eq(id))
        .exec(&txn)
        .await?;
    blog_post_tag::Entity::delete_many()
        .filter(blog_post_tag::Column::BlogPostId.eq(id))
        .exec(&txn)
        .await?;
    blog_post::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    Ok(Json(Message::new("Blog post deleted successfully")))
}

pub async fn find_blog_post<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<blog_post::Model, AppError> {
    blog_post::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post not found".into()))
}

/// Resolve every referenced tag ID, failing the whole operation when one
/// is missing.
async fn resolve_tags<C: ConnectionTrait>(
    conn: &C,
    tag_ids: &[i32],
) -> Result<Vec<tag::Model>, AppError> {
    let mut tags = Vec::with_capacity(tag_ids.len());
    for &tag_id in tag_ids {
        let tag = tag::Entity::find_by_id(tag_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag with ID {tag_id} not found")))?;
        tags.push(tag);
    }
    Ok(tags)
}

async fn link_tags<C: ConnectionTrait>(
    conn: &C,
    blog_post_id: i32,
    tags: &[tag::Model],
) -> Result<(), AppError> {
    if tags.is_empty() {
        return Ok(());
    }
    blog_post_tag::Entity::insert_many(tags.iter().map(|tag| blog_post_tag::ActiveModel {
        blog_post_id: Set(blog_post_id),
        tag_id: Set(tag.id),
    }))
    .exec(conn)
    .await?;
    Ok(())
}

async fn ensure_title_free<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let existing = blog_post::Entity::find()
        .filter(blog_post::Column::Title.eq(title))
        .one(conn)
        .await?;
    if existing.is_some_and(|p| Some(p.id) != exclude) {
        return Err(AppError::Conflict(
            "A blog post with this title already exists".into(),
        ));
    }
    Ok(())
}

async fn ensure_url_free<C: ConnectionTrait>(
    conn: &C,
    url: &str,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let existing = blog_post::Entity::find()
        .filter(blog_post::Column::Url.eq(url))
        .one(conn)
        .await?;
    if existing.is_some_and(|p| Some(p.id) != exclude) {
        return Err(AppError::Conflict(
            "A blog post with this url already exists".into(),
        ));
    }
    Ok(())
}
