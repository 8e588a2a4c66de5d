use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Set on creation and refreshed on every update.
    pub comment_date: DateTimeUtc,

    /// NULL once the author's account has been deleted.
    pub user_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    pub blog_post_id: i32,
    #[sea_orm(belongs_to, from = "blog_post_id", to = "id")]
    pub blog_post: HasOne<super::blog_post::Entity>,

    /// Parent comment for threaded replies. Must reference a comment
    /// on the same blog post.
    pub reply_to: Option<i32>,
    #[sea_orm(self_ref, relation_enum = "Parent", from = "reply_to", to = "id")]
    pub parent: HasOne<Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
