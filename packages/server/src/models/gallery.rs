use chrono::{DateTime, Utc};
use common::AssetRef;
use serde::{Deserialize, Serialize};

use crate::entity::gallery_item::{self, CATEGORIES};
use crate::error::AppError;
use crate::models::shared::{PaginationInfo, asset_from_json};
use crate::utils::upload::MultipartForm;

#[derive(Serialize, utoipa::ToSchema)]
pub struct GalleryItemResponse {
    pub id: i32,
    pub title: String,
    pub image: Option<AssetRef>,
    pub description: String,
    pub category: String,
    pub team: Option<String>,
    pub sub_team: Option<String>,
    pub priority: i32,
    pub is_highlighted: bool,
    pub landing_page_visibility: bool,
    pub gallery_section_visibility: bool,
    pub uploaded_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<gallery_item::Model> for GalleryItemResponse {
    fn from(g: gallery_item::Model) -> Self {
        Self {
            id: g.id,
            title: g.title,
            image: asset_from_json(Some(&g.image)),
            description: g.description,
            category: g.category,
            team: g.team,
            sub_team: g.sub_team,
            priority: g.priority,
            is_highlighted: g.is_highlighted,
            landing_page_visibility: g.landing_page_visibility,
            gallery_section_visibility: g.gallery_section_visibility,
            uploaded_by: g.uploaded_by,
            created_at: g.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GalleryListResponse {
    pub items: Vec<GalleryItemResponse>,
    pub pagination: PaginationInfo,
}

/// Query filters for the gallery list endpoint.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(default)]
pub struct GalleryListQuery {
    pub category: Option<String>,
    pub team: Option<String>,
    pub sub_team: Option<String>,
    pub is_highlighted: Option<bool>,
    pub landing_page_visibility: Option<bool>,
    pub gallery_section_visibility: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl GalleryListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }
}

pub struct GalleryForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub team: Option<String>,
    pub sub_team: Option<String>,
    pub priority: Option<i32>,
    pub is_highlighted: Option<bool>,
    pub landing_page_visibility: Option<bool>,
    pub gallery_section_visibility: Option<bool>,
}

impl GalleryForm {
    pub fn from_multipart(form: &MultipartForm) -> Result<Self, AppError> {
        Ok(Self {
            title: form.field("title").map(|s| s.trim().to_string()),
            description: form.field("description").map(|s| s.to_string()),
            category: form.field("category").map(|s| s.trim().to_string()),
            team: form.field("team").map(|s| s.trim().to_string()),
            sub_team: form.field("sub_team").map(|s| s.trim().to_string()),
            priority: parse_optional_i32(form.field("priority"), "priority")?,
            is_highlighted: parse_optional_bool(form.field("is_highlighted"), "is_highlighted")?,
            landing_page_visibility: parse_optional_bool(
                form.field("landing_page_visibility"),
                "landing_page_visibility",
            )?,
            gallery_section_visibility: parse_optional_bool(
                form.field("gallery_section_visibility"),
                "gallery_section_visibility",
            )?,
        })
    }
}

pub fn validate_category(category: &str) -> Result<(), AppError> {
    if CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'category' must be one of: {}",
            CATEGORIES.join(", ")
        )))
    }
}

fn parse_optional_i32(value: Option<&str>, field: &str) -> Result<Option<i32>, AppError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("'{field}' must be an integer"))),
    }
}

fn parse_optional_bool(value: Option<&str>, field: &str) -> Result<Option<bool>, AppError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => match s.trim() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(AppError::Validation(format!(
                "'{field}' must be true or false"
            ))),
        },
    }
}
