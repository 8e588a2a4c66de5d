use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{comment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CurrentUser;
use crate::extractors::json::AppJson;
use crate::models::comment::{CommentListResponse, CommentResponse};
use crate::models::shared::{ListQuery, Message, page_window};
use crate::models::user::*;
use crate::policy::{self, Action};
use crate::state::AppState;

use super::auth::{ensure_email_free, ensure_name_free, send_activation_email};

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List user accounts",
    params(ListQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, query))]
pub async fn list_users(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    policy::authorize(&current.principal(), &Action::ListUsers)?;

    let (skip, limit) = page_window(&query);

    let count = user::Entity::find().count(&state.db).await?;
    let users = user::Entity::find()
        .order_by_asc(user::Column::CreationDate)
        .offset(skip)
        .limit(limit)
        .all(&state.db)
        .await?;

    Ok(Json(UserListResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
        count,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user account",
    description = "Admin creation. Unlike signup, accounts created here are \
        active immediately and no activation email is sent.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 409, description = "Name or email already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload), fields(email = %payload.email))]
pub async fn create_user(
    current: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    policy::authorize(&current.principal(), &Action::CreateUser)?;
    validate_create_user(&payload)?;

    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    ensure_email_free(&state.db, &email, None).await?;
    ensure_name_free(&state.db, &name, None).await?;

    let password_hash = crate::utils::hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password: Set(password_hash),
        is_active: Set(payload.is_active),
        is_superuser: Set(payload.is_superuser),
        creation_date: Set(chrono::Utc::now()),
    };

    let model = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A user with this name or email already exists".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Return the authenticated user's profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current))]
pub async fn get_me(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(current.0))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Users",
    operation_id = "updateMe",
    summary = "Update the authenticated user's profile",
    description = "Partial update of name and email. Changing the email \
        deactivates the account until the new address is verified through \
        the emailed activation link.",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Name or email already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload))]
pub async fn update_me(
    current: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    policy::authorize(&current.principal(), &Action::UpdateSelf)?;
    validate_update_me(&payload)?;

    let user = current.0;
    let mut email_changed = false;

    let mut active: user::ActiveModel = user.clone().into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name != user.name {
            ensure_name_free(&state.db, &name, Some(user.id)).await?;
            active.name = Set(name);
        }
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if email != user.email {
            ensure_email_free(&state.db, &email, Some(user.id)).await?;
            active.email = Set(email);
            // The new address must be verified before the account can be
            // used again.
            active.is_active = Set(false);
            email_changed = true;
        }
    }

    let model = active.update(&state.db).await?;

    if email_changed {
        send_activation_email(&state, &model);
    }

    Ok(Json(UserResponse::from(model)))
}

#[utoipa::path(
    patch,
    path = "/me/password",
    tag = "Users",
    operation_id = "updateMyPassword",
    summary = "Change the authenticated user's password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = Message),
        (status = 400, description = "Wrong current password (BAD_REQUEST)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload))]
pub async fn update_my_password(
    current: CurrentUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> Result<Json<Message>, AppError> {
    policy::authorize(&current.principal(), &Action::UpdateSelf)?;
    validate_update_password(&payload)?;

    let user = current.0;

    let matches = crate::utils::hash::verify_password(&payload.current_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !matches {
        return Err(AppError::BadRequest("Incorrect password".into()));
    }
    if payload.new_password == payload.current_password {
        return Err(AppError::BadRequest(
            "New password cannot be the same as the current one".into(),
        ));
    }

    let password_hash = crate::utils::hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(password_hash);
    active.update(&state.db).await?;

    Ok(Json(Message::new("Password updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/me",
    tag = "Users",
    operation_id = "deleteMe",
    summary = "Delete the authenticated user's account",
    description = "Superusers cannot delete their own account. The user's \
        comments are kept with the author cleared.",
    responses(
        (status = 200, description = "Account deleted", body = Message),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn delete_me(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Message>, AppError> {
    policy::authorize(&current.principal(), &Action::DeleteSelf)?;

    delete_user_row(&state.db, current.0.id).await?;

    Ok(Json(Message::new("User deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn get_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, id).await?;
    policy::authorize(&current.principal(), &Action::ReadUser { target_id: id })?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user by ID",
    description = "Admin partial update. A superuser cannot clear their own \
        superuser flag. This path never deactivates on email change.",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name or email already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, payload))]
pub async fn update_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, id).await?;
    policy::authorize(
        &current.principal(),
        &Action::UpdateUser {
            target_id: id,
            clears_superuser: payload.is_superuser == Some(false),
        },
    )?;
    validate_update_user(&payload)?;

    let mut active: user::ActiveModel = user.clone().into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name != user.name {
            ensure_name_free(&state.db, &name, Some(id)).await?;
            active.name = Set(name);
        }
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if email != user.email {
            ensure_email_free(&state.db, &email, Some(id)).await?;
            active.email = Set(email);
        }
    }
    if let Some(password) = payload.password {
        let password_hash = crate::utils::hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
        active.password = Set(password_hash);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_superuser) = payload.is_superuser {
        active.is_superuser = Set(is_superuser);
    }

    let model = active.update(&state.db).await?;

    Ok(Json(UserResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user by ID",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = Message),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state))]
pub async fn delete_user(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    find_user(&state.db, id).await?;
    policy::authorize(&current.principal(), &Action::DeleteUser { target_id: id })?;

    delete_user_row(&state.db, id).await?;

    Ok(Json(Message::new("User deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/me/comments",
    tag = "Users",
    operation_id = "listMyComments",
    summary = "List the authenticated user's comments",
    params(ListQuery),
    responses(
        (status = 200, description = "The user's comments", body = CommentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, query))]
pub async fn list_my_comments(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let owner_id = current.0.id;
    policy::authorize(&current.principal(), &Action::ListUserComments { owner_id })?;

    user_comments(&state.db, owner_id, &query).await.map(Json)
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Users",
    operation_id = "listUserComments",
    summary = "List a user's comments",
    params(("id" = Uuid, Path, description = "User ID"), ListQuery),
    responses(
        (status = 200, description = "The user's comments", body = CommentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(current, state, query))]
pub async fn list_user_comments(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    find_user(&state.db, id).await?;
    policy::authorize(
        &current.principal(),
        &Action::ListUserComments { owner_id: id },
    )?;

    user_comments(&state.db, id, &query).await.map(Json)
}

async fn user_comments<C: ConnectionTrait>(
    conn: &C,
    owner_id: Uuid,
    query: &ListQuery,
) -> Result<CommentListResponse, AppError> {
    let (skip, limit) = page_window(query);

    let select = comment::Entity::find().filter(comment::Column::UserId.eq(owner_id));
    let count = select.clone().count(conn).await?;
    let rows = select
        .find_also_related(user::Entity)
        .order_by_desc(comment::Column::CommentDate)
        .offset(skip)
        .limit(limit)
        .all(conn)
        .await?;

    Ok(CommentListResponse {
        data: rows
            .into_iter()
            .map(|(c, author)| CommentResponse::from_model(c, author.map(|u| u.name)))
            .collect(),
        count,
    })
}

pub async fn find_user<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Delete a user row, keeping their comments with the author cleared.
async fn delete_user_row(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let txn = db.begin().await?;

    comment::Entity::update_many()
        .col_expr(comment::Column::UserId, Expr::value(Value::Uuid(None)))
        .filter(comment::Column::UserId.eq(id))
        .exec(&txn)
        .await?;

    user::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}
