use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use serde::Deserialize;
use tracing::instrument;

use crate::entity::{sub_team, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::video::{
    CreateVideoRequest, UpdateVideoRequest, VideoListResponse, VideoResponse,
    validate_create_video, validate_vid_type,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(default)]
pub struct VideoListQuery {
    /// Restrict to videos of one sub-team.
    pub sub_team_id: Option<i32>,
    /// Restrict to one video kind.
    pub vid_type: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Videos",
    operation_id = "listVideos",
    summary = "List videos",
    params(VideoListQuery),
    responses(
        (status = 200, description = "Videos, newest first", body = VideoListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<VideoListResponse>, AppError> {
    let mut finder = video::Entity::find().order_by_desc(video::Column::CreatedAt);
    if let Some(sub_team_id) = query.sub_team_id {
        finder = finder.filter(video::Column::SubTeamId.eq(sub_team_id));
    }
    if let Some(vid_type) = &query.vid_type {
        finder = finder.filter(video::Column::VidType.eq(vid_type));
    }
    let videos = finder.all(&state.db).await?;

    let total = videos.len() as u64;
    Ok(Json(VideoListResponse {
        videos: videos.into_iter().map(VideoResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Videos",
    operation_id = "getVideo",
    summary = "Get one video",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "The video", body = VideoResponse),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = find_video(&state.db, id).await?;
    Ok(Json(VideoResponse::from(video)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Videos",
    operation_id = "createVideo",
    summary = "Create a video",
    description = "Videos hold an external URL, so this is plain JSON with no upload \
        workflow. The sub-team must exist.",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video created", body = VideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sub-team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member_id = auth_user.member_id))]
pub async fn create_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_video(&payload)?;

    find_parent_sub_team(&state.db, payload.sub_team_id).await?;

    let created = video::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        url: Set(payload.url.trim().to_string()),
        sub_team_id: Set(payload.sub_team_id),
        vid_type: Set(payload.vid_type),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from(created))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Videos",
    operation_id = "updateVideo",
    summary = "Update a video",
    params(("id" = i32, Path, description = "Video ID")),
    request_body = UpdateVideoRequest,
    responses(
        (status = 200, description = "Updated video", body = VideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video or sub-team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member_id = auth_user.member_id))]
pub async fn update_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateVideoRequest>,
) -> Result<Json<VideoResponse>, AppError> {
    auth_user.require_admin()?;

    let video = find_video(&state.db, id).await?;

    if let Some(vid_type) = payload.vid_type.as_deref() {
        validate_vid_type(vid_type)?;
    }
    if let Some(sub_team_id) = payload.sub_team_id {
        find_parent_sub_team(&state.db, sub_team_id).await?;
    }

    let mut active: video::ActiveModel = video.into();
    if let Some(title) = payload.title.filter(|t| !t.trim().is_empty()) {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(url) = payload.url.filter(|u| !u.trim().is_empty()) {
        active.url = Set(url.trim().to_string());
    }
    if let Some(sub_team_id) = payload.sub_team_id {
        active.sub_team_id = Set(sub_team_id);
    }
    if let Some(vid_type) = payload.vid_type {
        active.vid_type = Set(Some(vid_type));
    }
    let updated = active.update(&state.db).await?;

    Ok(Json(VideoResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Videos",
    operation_id = "deleteVideo",
    summary = "Delete a video",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn delete_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let video = find_video(&state.db, id).await?;
    video::Entity::delete_by_id(video.id).exec(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_video(db: &DatabaseConnection, id: i32) -> Result<video::Model, AppError> {
    video::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {id} not found")))
}

async fn find_parent_sub_team(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    sub_team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sub-team {id} not found")))?;
    Ok(())
}
