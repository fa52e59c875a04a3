use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::member;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::member::MemberResponse;
use crate::models::shared::{asset_from_json, asset_to_json};
use crate::state::AppState;
use crate::utils::upload::{collect_multipart, discard};
use crate::workflow;

/// Profile pictures land in a single shared folder, one per member.
const PROFILE_PICTURE_FOLDER: &str = "members/profile_pictures";

pub fn profile_picture_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024) // 32 MB
}

#[utoipa::path(
    put,
    path = "/me/profile-picture",
    tag = "Members",
    operation_id = "updateProfilePicture",
    summary = "Upload or replace the member's profile picture",
    description = "Uploads the `image` multipart field, persists the new reference, then \
        retires the previous picture. A failed save rolls the new upload back; a failed \
        retirement of the old picture is logged and the update still succeeds.",
    request_body(content_type = "multipart/form-data", description = "Single `image` file"),
    responses(
        (status = 200, description = "Updated member", body = MemberResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn update_profile_picture(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MemberResponse>, AppError> {
    let form =
        collect_multipart(multipart, "image", state.config.storage.max_upload_size).await?;

    if form.files.len() != 1 {
        discard(&form.files).await;
        return Err(AppError::Validation(
            "Exactly one 'image' file is required".into(),
        ));
    }

    let member = member::Entity::find_by_id(auth_user.member_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let old_assets: Vec<_> = asset_from_json(member.profile_picture.as_ref())
        .into_iter()
        .collect();

    let db = state.db.clone();
    let result = workflow::update_with_assets(
        &*state.object_store,
        &form.file_paths(),
        PROFILE_PICTURE_FOLDER,
        &old_assets,
        |replacement| async move {
            let new_picture = replacement
                .and_then(|mut assets| (!assets.is_empty()).then(|| assets.remove(0)));
            let mut active: member::ActiveModel = member.into();
            active.profile_picture = Set(new_picture.as_ref().map(asset_to_json));
            active.update(&db).await
        },
    )
    .await;

    discard(&form.files).await;

    Ok(Json(MemberResponse::from(result?)))
}

#[utoipa::path(
    delete,
    path = "/me/profile-picture",
    tag = "Members",
    operation_id = "deleteProfilePicture",
    summary = "Remove the member's profile picture",
    description = "Clears the stored reference first, then destroys the asset. A failed \
        destroy leaves an orphaned file that is logged for later cleanup.",
    responses(
        (status = 204, description = "Profile picture removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No profile picture set (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn delete_profile_picture(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let member = member::Entity::find_by_id(auth_user.member_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let Some(asset) = asset_from_json(member.profile_picture.as_ref()) else {
        return Err(AppError::NotFound("No profile picture is set".into()));
    };

    let db = state.db.clone();
    workflow::delete_with_assets(&*state.object_store, &[asset], || async move {
        let mut active: member::ActiveModel = member.into();
        active.profile_picture = Set(None);
        active.update(&db).await
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
