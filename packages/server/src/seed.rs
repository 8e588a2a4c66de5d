use anyhow::Context;
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::entity::user;
use crate::utils::hash;

/// Seed the first superuser account on startup, if configured.
///
/// Idempotent: nothing happens when the account already exists or the
/// seed settings are absent.
pub async fn seed_first_superuser(
    db: &DatabaseConnection,
    seed: &SeedConfig,
) -> anyhow::Result<()> {
    let (Some(name), Some(email), Some(password)) = (
        seed.first_superuser_name.as_deref(),
        seed.first_superuser_email.as_deref(),
        seed.first_superuser_password.as_deref(),
    ) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash first superuser password: {}", e))?;

    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password: Set(password_hash),
        is_active: Set(true),
        is_superuser: Set(true),
        creation_date: Set(chrono::Utc::now()),
    };

    user::Entity::insert(model)
        .exec_without_returning(db)
        .await
        .context("Failed to seed first superuser")?;

    info!("Seeded first superuser {}", email);
    Ok(())
}
