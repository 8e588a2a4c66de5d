use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::shared::{validate_email, validate_length, validate_password};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: &'static str,
}

/// Self-service signup. The account starts inactive and must be
/// activated through the emailed link.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ActivateRequest {
    pub token: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PasswordRecoveryRequest {
    pub email: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

pub fn validate_signup_request(payload: &SignupRequest) -> Result<(), AppError> {
    validate_length(&payload.name, "Name", 255)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)
}
