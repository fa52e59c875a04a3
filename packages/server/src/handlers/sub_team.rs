use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{member, sub_team, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::{assets_from_json, assets_to_json};
use crate::models::sub_team::{
    SubTeamDetailResponse, SubTeamForm, SubTeamListQuery, SubTeamListResponse, SubTeamResponse,
};
use crate::models::team::validate_title;
use crate::state::AppState;
use crate::utils::upload::{collect_multipart, discard};
use crate::workflow;

const SUB_TEAM_FOLDER: &str = "Apex/SubTeams";

pub fn sub_team_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

#[utoipa::path(
    get,
    path = "/",
    tag = "SubTeams",
    operation_id = "listSubTeams",
    summary = "List sub-teams",
    params(SubTeamListQuery),
    responses(
        (status = 200, description = "Sub-teams, optionally filtered by parent team", body = SubTeamListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_sub_teams(
    State(state): State<AppState>,
    Query(query): Query<SubTeamListQuery>,
) -> Result<Json<SubTeamListResponse>, AppError> {
    let mut finder = sub_team::Entity::find().order_by_asc(sub_team::Column::Title);
    if let Some(team_id) = query.team_id {
        finder = finder.filter(sub_team::Column::TeamId.eq(team_id));
    }
    let sub_teams = finder.all(&state.db).await?;

    let total = sub_teams.len() as u64;
    Ok(Json(SubTeamListResponse {
        sub_teams: sub_teams.into_iter().map(SubTeamResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "SubTeams",
    operation_id = "getSubTeam",
    summary = "Get one sub-team",
    description = "The detail view carries `active_members`, a live count of non-deleted \
        members assigned here, alongside the cached `total_members` counter.",
    params(("id" = i32, Path, description = "Sub-team ID")),
    responses(
        (status = 200, description = "The sub-team", body = SubTeamDetailResponse),
        (status = 404, description = "Sub-team not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_sub_team(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubTeamDetailResponse>, AppError> {
    let sub_team = find_sub_team(&state.db, id).await?;

    let active_members = member::Entity::find()
        .filter(member::Column::SubTeamId.eq(id))
        .filter(member::Column::IsDeleted.eq(false))
        .count(&state.db)
        .await?;

    Ok(Json(SubTeamDetailResponse {
        sub_team: SubTeamResponse::from(sub_team),
        active_members,
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "SubTeams",
    operation_id = "createSubTeam",
    summary = "Create a sub-team",
    description = "Multipart form: required `title` and `team_id` fields (the parent team \
        must exist), optional `description`, `head_id`, `vice_id`, and zero or more \
        `images` files.",
    request_body(content_type = "multipart/form-data", description = "Sub-team fields plus images"),
    responses(
        (status = 201, description = "Sub-team created", body = SubTeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Parent team not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title already exists (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn create_sub_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let form =
        collect_multipart(multipart, "images", state.config.storage.max_upload_size).await?;

    let checked = async {
        let parsed = SubTeamForm::from_multipart(&form)?;
        let title = parsed
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("'title' is required".into()))?;
        validate_title(&title)?;
        let team_id = parsed
            .team_id
            .ok_or_else(|| AppError::Validation("'team_id' is required".into()))?;

        team::Entity::find_by_id(team_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {team_id} not found")))?;

        Ok::<_, AppError>((parsed, title, team_id))
    }
    .await;

    let (parsed, title, team_id) = match checked {
        Ok(v) => v,
        Err(e) => {
            discard(&form.files).await;
            return Err(e);
        }
    };

    let db = state.db.clone();
    let created_by = auth_user.member_id;
    let result = workflow::create_with_assets(
        &*state.object_store,
        &form.file_paths(),
        SUB_TEAM_FOLDER,
        |assets| async move {
            sub_team::ActiveModel {
                title: Set(title),
                description: Set(parsed.description),
                head_id: Set(parsed.head_id),
                vice_id: Set(parsed.vice_id),
                images: Set(assets_to_json(&assets)),
                total_members: Set(0),
                team_id: Set(team_id),
                created_by: Set(created_by),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(&db)
            .await
        },
    )
    .await;

    discard(&form.files).await;

    Ok((StatusCode::CREATED, Json(SubTeamResponse::from(result?))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "SubTeams",
    operation_id = "updateSubTeam",
    summary = "Update a sub-team",
    description = "Multipart form with any subset of the create fields. Sending `images` \
        files replaces the whole image set. Moving the sub-team to another parent checks \
        that the new team exists.",
    params(("id" = i32, Path, description = "Sub-team ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to change"),
    responses(
        (status = 200, description = "Updated sub-team", body = SubTeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sub-team or new parent not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title already exists (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn update_sub_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<SubTeamResponse>, AppError> {
    auth_user.require_admin()?;

    let sub_team = find_sub_team(&state.db, id).await?;

    let form =
        collect_multipart(multipart, "images", state.config.storage.max_upload_size).await?;

    let checked = async {
        let parsed = SubTeamForm::from_multipart(&form)?;
        if let Some(title) = parsed.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(team_id) = parsed.team_id {
            team::Entity::find_by_id(team_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Team {team_id} not found")))?;
        }
        Ok::<_, AppError>(parsed)
    }
    .await;

    let parsed = match checked {
        Ok(v) => v,
        Err(e) => {
            discard(&form.files).await;
            return Err(e);
        }
    };

    let old_assets = assets_from_json(&sub_team.images);

    let db = state.db.clone();
    let result = workflow::update_with_assets(
        &*state.object_store,
        &form.file_paths(),
        SUB_TEAM_FOLDER,
        &old_assets,
        |replacement| async move {
            let mut active: sub_team::ActiveModel = sub_team.into();
            if let Some(title) = parsed.title {
                active.title = Set(title);
            }
            if let Some(description) = parsed.description {
                active.description = Set(Some(description));
            }
            if let Some(head_id) = parsed.head_id {
                active.head_id = Set(Some(head_id));
            }
            if let Some(vice_id) = parsed.vice_id {
                active.vice_id = Set(Some(vice_id));
            }
            if let Some(team_id) = parsed.team_id {
                active.team_id = Set(team_id);
            }
            if let Some(assets) = replacement {
                active.images = Set(assets_to_json(&assets));
            }
            active.update(&db).await
        },
    )
    .await;

    discard(&form.files).await;

    Ok(Json(SubTeamResponse::from(result?)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "SubTeams",
    operation_id = "deleteSubTeam",
    summary = "Delete a sub-team",
    description = "Deletes the record first, then destroys its images.",
    params(("id" = i32, Path, description = "Sub-team ID")),
    responses(
        (status = 204, description = "Sub-team deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sub-team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn delete_sub_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let sub_team = find_sub_team(&state.db, id).await?;
    let assets = assets_from_json(&sub_team.images);

    let db = state.db.clone();
    workflow::delete_with_assets(&*state.object_store, &assets, || async move {
        sub_team::Entity::delete_by_id(sub_team.id).exec(&db).await
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_sub_team(db: &DatabaseConnection, id: i32) -> Result<sub_team::Model, AppError> {
    sub_team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sub-team {id} not found")))
}
