use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::video::{self, VID_TYPES};
use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub url: String,
    pub sub_team_id: i32,
    pub vid_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<video::Model> for VideoResponse {
    fn from(v: video::Model) -> Self {
        Self {
            id: v.id,
            title: v.title,
            description: v.description,
            url: v.url,
            sub_team_id: v.sub_team_id,
            vid_type: v.vid_type,
            created_at: v.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoListResponse {
    pub videos: Vec<VideoResponse>,
    pub total: u64,
}

/// Videos are plain JSON; they carry no uploaded assets.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    pub description: String,
    pub url: String,
    pub sub_team_id: i32,
    pub vid_type: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub sub_team_id: Option<i32>,
    pub vid_type: Option<String>,
}

pub fn validate_vid_type(vid_type: &str) -> Result<(), AppError> {
    if VID_TYPES.contains(&vid_type) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "'vid_type' must be one of: {}",
            VID_TYPES.join(", ")
        )))
    }
}

pub fn validate_create_video(req: &CreateVideoRequest) -> Result<(), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("'title' is required".into()));
    }
    if req.url.trim().is_empty() {
        return Err(AppError::Validation("'url' is required".into()));
    }
    if let Some(vt) = &req.vid_type {
        validate_vid_type(vt)?;
    }
    Ok(())
}
