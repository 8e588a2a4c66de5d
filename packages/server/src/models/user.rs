use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;

use super::shared::{validate_email, validate_length, validate_password};

/// Public view of a user account. Never carries the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub creation_date: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            creation_date: user.creation_date,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub count: u64,
}

/// Admin user creation. Accounts created this way are active immediately.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn default_true() -> bool {
    true
}

/// Admin partial update of any user.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// Partial update of the caller's own profile.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
    validate_length(&payload.name, "Name", 255)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)
}

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_length(name, "Name", 255)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password)?;
    }
    Ok(())
}

pub fn validate_update_me(payload: &UpdateMeRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_length(name, "Name", 255)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    Ok(())
}

pub fn validate_update_password(payload: &UpdatePasswordRequest) -> Result<(), AppError> {
    validate_password(&payload.new_password)
}
