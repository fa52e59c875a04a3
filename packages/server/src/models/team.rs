use chrono::{DateTime, Utc};
use common::AssetRef;
use serde::Serialize;

use crate::entity::team;
use crate::error::AppError;
use crate::models::shared::assets_from_json;
use crate::utils::upload::MultipartForm;

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub head_id: Option<i32>,
    pub vice_id: Option<i32>,
    pub images: Vec<AssetRef>,
    pub total_members: i32,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<team::Model> for TeamResponse {
    fn from(t: team::Model) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            head_id: t.head_id,
            vice_id: t.vice_id,
            images: assets_from_json(&t.images),
            total_members: t.total_members,
            created_by: t.created_by,
            created_at: t.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamListResponse {
    pub teams: Vec<TeamResponse>,
    pub total: u64,
}

/// Fields accepted by the create/update multipart forms.
///
/// Multipart carries everything as text, so numeric fields are parsed here
/// and bad values are validation errors rather than 500s.
pub struct TeamForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub head_id: Option<i32>,
    pub vice_id: Option<i32>,
}

impl TeamForm {
    pub fn from_multipart(form: &MultipartForm) -> Result<Self, AppError> {
        Ok(Self {
            title: form.field("title").map(|s| s.trim().to_string()),
            description: form.field("description").map(|s| s.to_string()),
            head_id: parse_optional_id(form.field("head_id"), "head_id")?,
            vice_id: parse_optional_id(form.field("vice_id"), "vice_id")?,
        })
    }
}

pub fn parse_optional_id(value: Option<&str>, field: &str) -> Result<Option<i32>, AppError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("'{field}' must be a numeric id"))),
    }
}

pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation("Title must be 1-256 characters".into()));
    }
    Ok(())
}
