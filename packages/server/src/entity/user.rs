use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 password hash, never exposed in responses.
    pub password: String,

    pub is_active: bool,
    pub is_superuser: bool,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub creation_date: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
