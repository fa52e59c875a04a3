use chrono::{DateTime, Utc};
use common::AssetRef;
use serde::Serialize;

use crate::entity::member;
use crate::models::shared::asset_from_json;

/// Public view of a member. Never carries the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MemberResponse {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub profile_picture: Option<AssetRef>,
    pub is_deleted: bool,
    pub team_id: Option<i32>,
    pub sub_team_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<member::Model> for MemberResponse {
    fn from(m: member::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            phone: m.phone,
            role: m.role,
            profile_picture: asset_from_json(m.profile_picture.as_ref()),
            is_deleted: m.is_deleted,
            team_id: m.team_id,
            sub_team_id: m.sub_team_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MemberListResponse {
    pub members: Vec<MemberResponse>,
    pub total: u64,
}
