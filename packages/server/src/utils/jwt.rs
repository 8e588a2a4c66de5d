use anyhow::{Result, bail};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access-token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Expiration timestamp.
    pub exp: usize,
}

/// Claims for single-purpose email tokens (activation, password reset).
///
/// The `purpose` claim prevents a reset token from being replayed as an
/// activation token and vice versa.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailClaims {
    /// Email address the token was issued for.
    pub sub: String,
    pub purpose: String,
    pub exp: usize,
    pub nbf: usize,
}

pub const PURPOSE_ACTIVATION: &str = "activate";
pub const PURPOSE_PASSWORD_RESET: &str = "reset-password";

/// Sign a new access token for a user.
pub fn sign(user_id: Uuid, secret: &str, expire_minutes: i64) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(expire_minutes))
        .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify an access token and return the user ID it was issued for.
pub fn verify(token: &str, secret: &str) -> Result<Uuid> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(Uuid::parse_str(&token_data.claims.sub)?)
}

/// Sign an email token for the given purpose.
pub fn sign_email_token(
    email: &str,
    purpose: &str,
    secret: &str,
    expire_hours: i64,
) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(expire_hours))
        .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?
        .timestamp();

    let claims = EmailClaims {
        sub: email.to_string(),
        purpose: purpose.to_string(),
        exp: expiration as usize,
        nbf: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify an email token and return the email address it was issued for.
///
/// Fails if the token is malformed, expired, or was issued for a
/// different purpose.
pub fn verify_email_token(token: &str, purpose: &str, secret: &str) -> Result<String> {
    let token_data = decode::<EmailClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.purpose != purpose {
        bail!("email token purpose mismatch");
    }
    Ok(token_data.claims.sub)
}
