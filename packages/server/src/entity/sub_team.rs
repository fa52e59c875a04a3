use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sub_team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub title: String,
    pub description: Option<String>,

    pub head_id: Option<i32>,
    pub vice_id: Option<i32>,

    /// JSON array of asset reference pairs `{public_id, secure_url}`.
    #[sea_orm(column_type = "JsonBinary")]
    pub images: serde_json::Value,

    pub total_members: i32,

    pub team_id: i32,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: HasOne<super::team::Entity>,

    #[sea_orm(has_many)]
    pub videos: HasMany<super::video::Entity>,

    pub created_by: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
