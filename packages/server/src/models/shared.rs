use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Generic success message body.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Message {
    #[schema(example = "Blog post deleted successfully")]
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Offset/limit pagination accepted by every list endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// Number of items to skip.
    pub skip: Option<u64>,
    /// Page size, capped at 100.
    pub limit: Option<u64>,
}

/// Resolve a list query into a `(skip, limit)` window.
pub fn page_window(query: &ListQuery) -> (u64, u64) {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).clamp(1, 100);
    (skip, limit)
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed, bounded text field.
pub fn validate_length(value: &str, name: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{name} must be 1-{max} characters"
        )));
    }
    Ok(())
}

/// Validate an email address (bounded, single `@` with non-empty sides).
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let well_formed = matches!(
        email.split_once('@'),
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    );
    if email.is_empty() || email.chars().count() > 255 || !well_formed {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Validate a password (8-40 characters).
pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(8..=40).contains(&len) {
        return Err(AppError::Validation(
            "Password must be 8-40 characters".into(),
        ));
    }
    Ok(())
}

/// Validate a URL slug: bounded and free of whitespace and slashes so it
/// can be used as a single path segment.
pub fn validate_slug(url: &str) -> Result<(), AppError> {
    validate_length(url, "URL", 255)?;
    let url = url.trim();
    if url.contains(char::is_whitespace) || url.contains('/') {
        return Err(AppError::Validation(
            "URL must not contain whitespace or slashes".into(),
        ));
    }
    Ok(())
}
