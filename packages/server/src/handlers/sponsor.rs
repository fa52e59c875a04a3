use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::sponsor;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::shared::{asset_from_json, asset_to_json};
use crate::models::sponsor::{SponsorForm, SponsorListResponse, SponsorResponse};
use crate::state::AppState;
use crate::utils::upload::{collect_multipart, discard};
use crate::workflow;

const SPONSOR_FOLDER: &str = "Apex/Sponsors";

pub fn sponsor_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024) // 32 MB
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Sponsors",
    operation_id = "listSponsors",
    summary = "List sponsors",
    responses(
        (status = 200, description = "All sponsors", body = SponsorListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_sponsors(
    State(state): State<AppState>,
) -> Result<Json<SponsorListResponse>, AppError> {
    let sponsors = sponsor::Entity::find()
        .order_by_asc(sponsor::Column::Name)
        .all(&state.db)
        .await?;

    let total = sponsors.len() as u64;
    Ok(Json(SponsorListResponse {
        sponsors: sponsors.into_iter().map(SponsorResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Sponsors",
    operation_id = "getSponsor",
    summary = "Get a sponsor",
    responses(
        (status = 200, description = "The sponsor", body = SponsorResponse),
        (status = 404, description = "No such sponsor (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_sponsor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SponsorResponse>, AppError> {
    let sponsor = find_sponsor(&state.db, id).await?;
    Ok(Json(SponsorResponse::from(sponsor)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Sponsors",
    operation_id = "createSponsor",
    summary = "Create a sponsor",
    description = "Multipart form: required `name` field, optional `description`, and \
        exactly one `image` file. The logo uploads first; a failed insert destroys it again.",
    request_body(content_type = "multipart/form-data", description = "Sponsor fields plus logo"),
    responses(
        (status = 201, description = "Sponsor created", body = SponsorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Name already exists (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn create_sponsor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let form =
        collect_multipart(multipart, "image", state.config.storage.max_upload_size).await?;

    let checked = (|| {
        let parsed = SponsorForm::from_multipart(&form)?;
        let name = parsed.require_name()?.to_string();
        if form.files.len() != 1 {
            return Err(AppError::Validation(
                "Exactly one 'image' file is required".into(),
            ));
        }
        Ok((parsed, name))
    })();

    let (parsed, name) = match checked {
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
        SPONSOR_FOLDER,
        |mut assets| async move {
            sponsor::ActiveModel {
                name: Set(name),
                description: Set(parsed.description.unwrap_or_default()),
                image: Set(asset_to_json(&assets.remove(0))),
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

    Ok((StatusCode::CREATED, Json(SponsorResponse::from(result?))))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Sponsors",
    operation_id = "updateSponsor",
    summary = "Update a sponsor",
    description = "Multipart form with any subset of the create fields. Sending an `image` \
        file replaces the logo: the new one uploads, the save commits, then the old one is \
        retired.",
    params(("id" = i32, Path, description = "Sponsor ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to change"),
    responses(
        (status = 200, description = "Updated sponsor", body = SponsorResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sponsor not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already exists (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn update_sponsor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<SponsorResponse>, AppError> {
    auth_user.require_admin()?;

    let sponsor = find_sponsor(&state.db, id).await?;

    let form =
        collect_multipart(multipart, "image", state.config.storage.max_upload_size).await?;

    let checked = (|| {
        let parsed = SponsorForm::from_multipart(&form)?;
        if form.files.len() > 1 {
            return Err(AppError::Validation(
                "At most one 'image' file is accepted".into(),
            ));
        }
        Ok(parsed)
    })();

    let parsed = match checked {
        Ok(v) => v,
        Err(e) => {
            discard(&form.files).await;
            return Err(e);
        }
    };

    let old_assets: Vec<_> = asset_from_json(Some(&sponsor.image)).into_iter().collect();

    let db = state.db.clone();
    let result = workflow::update_with_assets(
        &*state.object_store,
        &form.file_paths(),
        SPONSOR_FOLDER,
        &old_assets,
        |replacement| async move {
            let mut active: sponsor::ActiveModel = sponsor.into();
            if let Some(name) = parsed.name.filter(|n| !n.is_empty()) {
                active.name = Set(name);
            }
            if let Some(description) = parsed.description {
                active.description = Set(description);
            }
            if let Some(mut assets) = replacement {
                active.image = Set(asset_to_json(&assets.remove(0)));
            }
            active.update(&db).await
        },
    )
    .await;

    discard(&form.files).await;

    Ok(Json(SponsorResponse::from(result?)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Sponsors",
    operation_id = "deleteSponsor",
    summary = "Delete a sponsor",
    description = "Deletes the record first, then destroys the logo.",
    params(("id" = i32, Path, description = "Sponsor ID")),
    responses(
        (status = 204, description = "Sponsor deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sponsor not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn delete_sponsor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let sponsor = find_sponsor(&state.db, id).await?;
    let assets: Vec<_> = asset_from_json(Some(&sponsor.image)).into_iter().collect();

    let db = state.db.clone();
    workflow::delete_with_assets(&*state.object_store, &assets, || async move {
        sponsor::Entity::delete_by_id(sponsor.id).exec(&db).await
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_sponsor(db: &DatabaseConnection, id: i32) -> Result<sponsor::Model, AppError> {
    sponsor::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sponsor {id} not found")))
}
