use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role granted to sign-ups with no allow-list override.
pub const DEFAULT_ROLE: &str = "member";

/// Roles permitted to perform administrative mutations.
pub const ADMIN_ROLES: &[&str] = &["admin", "super"];

/// Every role the system knows about.
pub const ALL_ROLES: &[&str] = &["member", "user", "admin", "super"];

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    /// Argon2id hash, never the plaintext.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub phone: Option<String>,

    /// One of `member`, `user`, `admin`, `super`.
    pub role: String,

    /// Asset reference pair `{public_id, secure_url}`, stored as one value.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub profile_picture: Option<serde_json::Value>,

    /// Soft-delete flag; deleted members keep their row but cannot log in.
    pub is_deleted: bool,

    pub team_id: Option<i32>,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: BelongsTo<Option<super::team::Entity>>,

    pub sub_team_id: Option<i32>,
    #[sea_orm(belongs_to, from = "sub_team_id", to = "id")]
    pub sub_team: BelongsTo<Option<super::sub_team::Entity>>,

    #[sea_orm(has_many)]
    pub sessions: HasMany<super::session_token::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
