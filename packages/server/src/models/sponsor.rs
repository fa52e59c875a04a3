use chrono::{DateTime, Utc};
use common::AssetRef;
use serde::Serialize;

use crate::entity::sponsor;
use crate::error::AppError;
use crate::models::shared::asset_from_json;
use crate::utils::upload::MultipartForm;

#[derive(Serialize, utoipa::ToSchema)]
pub struct SponsorResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image: Option<AssetRef>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<sponsor::Model> for SponsorResponse {
    fn from(s: sponsor::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            image: asset_from_json(Some(&s.image)),
            created_by: s.created_by,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SponsorListResponse {
    pub sponsors: Vec<SponsorResponse>,
    pub total: u64,
}

pub struct SponsorForm {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SponsorForm {
    pub fn from_multipart(form: &MultipartForm) -> Result<Self, AppError> {
        Ok(Self {
            name: form.field("name").map(|s| s.trim().to_string()),
            description: form.field("description").map(|s| s.to_string()),
        })
    }

    pub fn require_name(&self) -> Result<&str, AppError> {
        match self.name.as_deref() {
            Some(n) if !n.is_empty() => Ok(n),
            _ => Err(AppError::Validation("'name' is required".into())),
        }
    }
}
