use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;

use crate::entity::user;
use crate::error::AppError;
use crate::policy::Principal;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user resolved from the `Authorization: Bearer <token>`
/// header.
///
/// Add this as a handler parameter to require authentication. The token's
/// subject is looked up in the database on every request so deactivated
/// or deleted accounts lose access immediately. Ownership/role checks
/// happen via `policy::authorize()` in the handler body.
pub struct CurrentUser(pub user::Model);

impl CurrentUser {
    pub fn principal(&self) -> Principal {
        Principal::from(&self.0)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let user_id = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("Inactive user".into()));
        }

        Ok(CurrentUser(user))
    }
}
