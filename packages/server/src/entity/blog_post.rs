use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub title: String,
    /// URL slug, used as the public lookup key.
    #[sea_orm(unique)]
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Path of an uploaded header image, if any.
    pub image_path: Option<String>,
    #[sea_orm(default_value = false)]
    pub featured: bool,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    #[sea_orm(has_many, via = "blog_post_tag")]
    pub tags: HasMany<super::tag::Entity>,

    pub publication_date: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
