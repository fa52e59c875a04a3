use chrono::{DateTime, Utc};
use common::AssetRef;
use serde::{Deserialize, Serialize};

use crate::entity::sub_team;
use crate::error::AppError;
use crate::models::shared::assets_from_json;
use crate::models::team::parse_optional_id;
use crate::utils::upload::MultipartForm;

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubTeamResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub head_id: Option<i32>,
    pub vice_id: Option<i32>,
    pub images: Vec<AssetRef>,
    pub total_members: i32,
    pub team_id: i32,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<sub_team::Model> for SubTeamResponse {
    fn from(s: sub_team::Model) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            head_id: s.head_id,
            vice_id: s.vice_id,
            images: assets_from_json(&s.images),
            total_members: s.total_members,
            team_id: s.team_id,
            created_by: s.created_by,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubTeamListResponse {
    pub sub_teams: Vec<SubTeamResponse>,
    pub total: u64,
}

/// Detail view adds a live member count computed from the member table
/// rather than the cached counter.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubTeamDetailResponse {
    #[serde(flatten)]
    pub sub_team: SubTeamResponse,
    pub active_members: u64,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(default)]
pub struct SubTeamListQuery {
    /// Restrict to sub-teams of one parent team.
    pub team_id: Option<i32>,
}

pub struct SubTeamForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub head_id: Option<i32>,
    pub vice_id: Option<i32>,
    pub team_id: Option<i32>,
}

impl SubTeamForm {
    pub fn from_multipart(form: &MultipartForm) -> Result<Self, AppError> {
        Ok(Self {
            title: form.field("title").map(|s| s.trim().to_string()),
            description: form.field("description").map(|s| s.to_string()),
            head_id: parse_optional_id(form.field("head_id"), "head_id")?,
            vice_id: parse_optional_id(form.field("vice_id"), "vice_id")?,
            team_id: parse_optional_id(form.field("team_id"), "team_id")?,
        })
    }
}
