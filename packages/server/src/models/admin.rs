use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::allowed_member;
use crate::entity::member::ALL_ROLES;
use crate::error::AppError;
use crate::models::auth::validate_email;

/// Allow-list entry an admin registers ahead of a member signing up.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddAllowedMemberRequest {
    pub email: String,
    pub role: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AllowedMemberResponse {
    pub id: i32,
    pub email: String,
    pub role: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl From<allowed_member::Model> for AllowedMemberResponse {
    fn from(a: allowed_member::Model) -> Self {
        Self {
            id: a.id,
            email: a.email,
            role: a.role,
            joined_at: a.joined_at,
        }
    }
}

/// Filters for the admin member listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(default)]
pub struct MemberListQuery {
    pub role: Option<String>,
    pub team_id: Option<i32>,
    pub sub_team_id: Option<i32>,
    /// Deleted members are hidden unless this is set.
    pub include_deleted: Option<bool>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AssignTeamRequest {
    pub team_id: Option<i32>,
    pub sub_team_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangeRoleRequest {
    pub role: String,
}

pub fn validate_add_allowed_member(req: &AddAllowedMemberRequest) -> Result<(), AppError> {
    validate_email(&req.email)?;
    if let Some(role) = &req.role {
        validate_role(role)?;
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<(), AppError> {
    if ALL_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'role' must be one of: {}",
            ALL_ROLES.join(", ")
        )))
    }
}
