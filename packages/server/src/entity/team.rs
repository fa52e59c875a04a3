use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
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

    /// Maintained by atomic increments on member assignment; may drift from a
    /// live count under concurrent assignments.
    pub total_members: i32,

    pub created_by: i32,

    #[sea_orm(has_many)]
    pub sub_teams: HasMany<super::sub_team::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
