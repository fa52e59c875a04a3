use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One issued bearer session. Revocation flips `is_valid` instead of deleting
/// the row; the sweeper garbage-collects expired and revoked rows later.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session_token")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub token: String,

    pub member_id: i32,
    #[sea_orm(belongs_to, from = "member_id", to = "id")]
    pub member: HasOne<super::member::Entity>,

    pub user_agent: Option<String>,

    pub is_valid: bool,
    pub expires_at: DateTimeUtc,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
