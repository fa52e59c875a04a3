use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Categories a gallery item can be filed under. Doubles as the upload folder
/// suffix (`gallery/{category}`).
pub const CATEGORIES: &[&str] = &["cars", "competitions", "events", "teams", "subTeams"];

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gallery_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// Asset reference pair `{public_id, secure_url}`, stored as one value.
    #[sea_orm(column_type = "JsonBinary")]
    pub image: serde_json::Value,

    pub description: String,

    /// One of `CATEGORIES`.
    pub category: String,

    pub team: Option<String>,
    pub sub_team: Option<String>,

    /// Sort weight for sliders and featured galleries.
    pub priority: i32,
    pub is_highlighted: bool,
    pub landing_page_visibility: bool,
    pub gallery_section_visibility: bool,

    pub uploaded_by: Option<i32>,
    #[sea_orm(belongs_to, from = "uploaded_by", to = "id")]
    pub uploader: BelongsTo<Option<super::member::Entity>>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
