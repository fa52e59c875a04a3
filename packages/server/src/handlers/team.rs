use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::team;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::{assets_from_json, assets_to_json};
use crate::models::team::{TeamForm, TeamListResponse, TeamResponse, validate_title};
use crate::state::AppState;
use crate::utils::upload::{collect_multipart, discard};
use crate::workflow;

const TEAM_FOLDER: &str = "Apex/Teams";

pub fn team_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Teams",
    operation_id = "listTeams",
    summary = "List teams",
    responses(
        (status = 200, description = "All teams", body = TeamListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_teams(State(state): State<AppState>) -> Result<Json<TeamListResponse>, AppError> {
    let teams = team::Entity::find()
        .order_by_asc(team::Column::Title)
        .all(&state.db)
        .await?;

    let total = teams.len() as u64;
    Ok(Json(TeamListResponse {
        teams: teams.into_iter().map(TeamResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teams",
    operation_id = "getTeam",
    summary = "Get one team",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "The team", body = TeamResponse),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TeamResponse>, AppError> {
    let team = find_team(&state.db, id).await?;
    Ok(Json(TeamResponse::from(team)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Teams",
    operation_id = "createTeam",
    summary = "Create a team",
    description = "Multipart form: a required `title` field, optional `description`, \
        `head_id` and `vice_id` fields, and zero or more `images` files. Images are \
        uploaded first; if the insert then fails every uploaded image is destroyed again.",
    request_body(content_type = "multipart/form-data", description = "Team fields plus images"),
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Title already exists (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn create_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let form =
        collect_multipart(multipart, "images", state.config.storage.max_upload_size).await?;

    let parsed = match TeamForm::from_multipart(&form) {
        Ok(parsed) => parsed,
        Err(e) => {
            discard(&form.files).await;
            return Err(e);
        }
    };
    let Some(title) = parsed.title.filter(|t| !t.is_empty()) else {
        discard(&form.files).await;
        return Err(AppError::Validation("'title' is required".into()));
    };
    if let Err(e) = validate_title(&title) {
        discard(&form.files).await;
        return Err(e);
    }

    let db = state.db.clone();
    let created_by = auth_user.member_id;
    let result = workflow::create_with_assets(
        &*state.object_store,
        &form.file_paths(),
        TEAM_FOLDER,
        |assets| async move {
            team::ActiveModel {
                title: Set(title),
                description: Set(parsed.description),
                head_id: Set(parsed.head_id),
                vice_id: Set(parsed.vice_id),
                images: Set(assets_to_json(&assets)),
                total_members: Set(0),
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

    Ok((StatusCode::CREATED, Json(TeamResponse::from(result?))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Teams",
    operation_id = "updateTeam",
    summary = "Update a team",
    description = "Multipart form with any subset of the create fields. Sending `images` \
        files replaces the whole image set: replacements upload first, the save commits, \
        then the superseded images are retired. Without `images` the stored set is kept.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to change"),
    responses(
        (status = 200, description = "Updated team", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Title already exists (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn update_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_admin()?;

    let team = find_team(&state.db, id).await?;

    let form =
        collect_multipart(multipart, "images", state.config.storage.max_upload_size).await?;

    let parsed = match TeamForm::from_multipart(&form) {
        Ok(parsed) => parsed,
        Err(e) => {
            discard(&form.files).await;
            return Err(e);
        }
    };
    if let Some(title) = parsed.title.as_deref() {
        if let Err(e) = validate_title(title) {
            discard(&form.files).await;
            return Err(e);
        }
    }

    let old_assets = assets_from_json(&team.images);

    let db = state.db.clone();
    let result = workflow::update_with_assets(
        &*state.object_store,
        &form.file_paths(),
        TEAM_FOLDER,
        &old_assets,
        |replacement| async move {
            let mut active: team::ActiveModel = team.into();
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
            if let Some(assets) = replacement {
                active.images = Set(assets_to_json(&assets));
            }
            active.update(&db).await
        },
    )
    .await;

    discard(&form.files).await;

    Ok(Json(TeamResponse::from(result?)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Teams",
    operation_id = "deleteTeam",
    summary = "Delete a team",
    description = "Deletes the record first, then destroys its images. Assets whose \
        destroy fails are logged as leak candidates; the delete still succeeds.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn delete_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let team = find_team(&state.db, id).await?;
    let assets = assets_from_json(&team.images);

    let db = state.db.clone();
    workflow::delete_with_assets(&*state.object_store, &assets, || async move {
        team::Entity::delete_by_id(team.id).exec(&db).await
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_team(db: &DatabaseConnection, id: i32) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team {id} not found")))
}
