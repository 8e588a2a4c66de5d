use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::email::templates;
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    ActivateRequest, LoginRequest, PasswordRecoveryRequest, ResetPasswordRequest, SignupRequest,
    TokenResponse, validate_login_request, validate_signup_request,
};
use crate::models::shared::Message;
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 403, description = "Account inactive (FORBIDDEN)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_login_request(&payload)?;

    // Stored emails are lowercased, so lookups must be too.
    let email = payload.email.trim().to_lowercase();

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AppError::Forbidden("Inactive user".into()));
    }

    let token = jwt::sign(
        user.id,
        &state.config.auth.jwt_secret,
        state.config.auth.access_token_expire_minutes,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
    }))
}

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Register a new account",
    description = "Creates an inactive account and emails an activation link. \
        The account cannot log in until it is activated.",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 409, description = "Name or email already taken (CONFLICT)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup_request(&payload)?;

    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    ensure_email_free(&state.db, &email, None).await?;
    ensure_name_free(&state.db, &name, None).await?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password: Set(password_hash),
        is_active: Set(false),
        is_superuser: Set(false),
        creation_date: Set(chrono::Utc::now()),
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Signup race condition: unique constraint caught on insert");
            AppError::Conflict("A user with this name or email already exists".into())
        }
        _ => AppError::from(e),
    })?;

    send_activation_email(&state, &user);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/activate",
    tag = "Auth",
    operation_id = "activateAccount",
    summary = "Activate an account with an emailed token",
    request_body = ActivateRequest,
    responses(
        (status = 200, description = "Account activated", body = Message),
        (status = 400, description = "Invalid or expired token (BAD_REQUEST)", body = ErrorBody),
        (status = 404, description = "Account not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn activate(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ActivateRequest>,
) -> Result<Json<Message>, AppError> {
    let email = jwt::verify_email_token(
        &payload.token,
        jwt::PURPOSE_ACTIVATION,
        &state.config.auth.jwt_secret,
    )
    .map_err(|_| AppError::BadRequest("Invalid or expired activation token".into()))?;

    let user = find_by_email(&state.db, &email).await?;

    if user.is_active {
        return Ok(Json(Message::new("Account is already active")));
    }

    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(true);
    active.update(&state.db).await?;

    Ok(Json(Message::new("Account activated successfully")))
}

#[utoipa::path(
    post,
    path = "/password-recovery",
    tag = "Auth",
    operation_id = "requestPasswordRecovery",
    summary = "Email a password-reset link",
    request_body = PasswordRecoveryRequest,
    responses(
        (status = 200, description = "Recovery email sent", body = Message),
        (status = 404, description = "No account with this email (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn password_recovery(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PasswordRecoveryRequest>,
) -> Result<Json<Message>, AppError> {
    let user = find_by_email(&state.db, &payload.email.trim().to_lowercase()).await?;

    let token = jwt::sign_email_token(
        &user.email,
        jwt::PURPOSE_PASSWORD_RESET,
        &state.config.auth.jwt_secret,
        state.config.auth.email_token_expire_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let link = format!(
        "{}/reset-password?token={}",
        state.config.server.frontend_host, token
    );
    state.mailer.send_in_background(
        user.email.clone(),
        templates::PASSWORD_RESET_SUBJECT.to_string(),
        templates::password_reset_email(&user.name, &link),
    );

    Ok(Json(Message::new("Password recovery email sent")))
}

#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "Auth",
    operation_id = "resetPassword",
    summary = "Set a new password with an emailed token",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = Message),
        (status = 400, description = "Invalid or expired token (BAD_REQUEST)", body = ErrorBody),
        (status = 404, description = "Account not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<Message>, AppError> {
    crate::models::shared::validate_password(&payload.new_password)?;

    let email = jwt::verify_email_token(
        &payload.token,
        jwt::PURPOSE_PASSWORD_RESET,
        &state.config.auth.jwt_secret,
    )
    .map_err(|_| AppError::BadRequest("Invalid or expired reset token".into()))?;

    let user = find_by_email(&state.db, &email).await?;

    let password_hash = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(password_hash);
    active.update(&state.db).await?;

    Ok(Json(Message::new("Password updated successfully")))
}

/// Queue the activation email for a freshly registered (or re-verifying)
/// account. Failures are background-logged, never surfaced.
pub fn send_activation_email(state: &AppState, user: &user::Model) {
    let token = match jwt::sign_email_token(
        &user.email,
        jwt::PURPOSE_ACTIVATION,
        &state.config.auth.jwt_secret,
        state.config.auth.email_token_expire_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to sign activation token for {}: {}", user.email, e);
            return;
        }
    };

    let link = format!(
        "{}/activate?token={}",
        state.config.server.frontend_host, token
    );
    state.mailer.send_in_background(
        user.email.clone(),
        templates::ACTIVATION_SUBJECT.to_string(),
        templates::activation_email(&user.name, &link),
    );
}

async fn find_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> Result<user::Model, AppError> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Uniqueness pre-check for emails, optionally excluding one user (for
/// updates to the same account).
pub async fn ensure_email_free<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    exclude: Option<uuid::Uuid>,
) -> Result<(), AppError> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(conn)
        .await?;
    if existing.is_some_and(|u| Some(u.id) != exclude) {
        return Err(AppError::Conflict(
            "A user with this email already exists".into(),
        ));
    }
    Ok(())
}

/// Uniqueness pre-check for user names.
pub async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    exclude: Option<uuid::Uuid>,
) -> Result<(), AppError> {
    let existing = user::Entity::find()
        .filter(user::Column::Name.eq(name))
        .one(conn)
        .await?;
    if existing.is_some_and(|u| Some(u.id) != exclude) {
        return Err(AppError::Conflict(
            "A user with this name already exists".into(),
        ));
    }
    Ok(())
}
