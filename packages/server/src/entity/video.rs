use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Accepted video kinds.
pub const VID_TYPES: &[&str] = &["Educational", "Intro", "Competition"];

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,
    /// External video URL; videos carry no stored assets.
    pub url: String,

    pub sub_team_id: i32,
    #[sea_orm(belongs_to, from = "sub_team_id", to = "id")]
    pub sub_team: HasOne<super::sub_team::Entity>,

    pub vid_type: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
