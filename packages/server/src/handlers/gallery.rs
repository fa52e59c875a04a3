use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::gallery_item;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::gallery::{
    GalleryForm, GalleryItemResponse, GalleryListQuery, GalleryListResponse, validate_category,
};
use crate::models::shared::{PaginationInfo, asset_from_json, asset_to_json};
use crate::state::AppState;
use crate::utils::upload::{collect_multipart, discard};
use crate::workflow;

pub fn gallery_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024) // 32 MB
}

/// Gallery uploads are foldered by category, e.g. `gallery/cars`.
fn gallery_folder(category: &str) -> String {
    format!("gallery/{category}")
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Gallery",
    operation_id = "listGalleryItems",
    summary = "List gallery items",
    description = "Paginated listing, newest first within descending priority. All filters \
        are optional and combine.",
    params(GalleryListQuery),
    responses(
        (status = 200, description = "One page of gallery items", body = GalleryListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_gallery_items(
    State(state): State<AppState>,
    Query(query): Query<GalleryListQuery>,
) -> Result<Json<GalleryListResponse>, AppError> {
    if let Some(category) = query.category.as_deref() {
        validate_category(category)?;
    }

    let mut finder = gallery_item::Entity::find()
        .order_by_desc(gallery_item::Column::Priority)
        .order_by_desc(gallery_item::Column::CreatedAt);

    if let Some(category) = &query.category {
        finder = finder.filter(gallery_item::Column::Category.eq(category));
    }
    if let Some(team) = &query.team {
        finder = finder.filter(gallery_item::Column::Team.eq(team));
    }
    if let Some(sub_team) = &query.sub_team {
        finder = finder.filter(gallery_item::Column::SubTeam.eq(sub_team));
    }
    if let Some(flag) = query.is_highlighted {
        finder = finder.filter(gallery_item::Column::IsHighlighted.eq(flag));
    }
    if let Some(flag) = query.landing_page_visibility {
        finder = finder.filter(gallery_item::Column::LandingPageVisibility.eq(flag));
    }
    if let Some(flag) = query.gallery_section_visibility {
        finder = finder.filter(gallery_item::Column::GallerySectionVisibility.eq(flag));
    }

    let page = query.page();
    let per_page = query.per_page();
    let paginator = finder.paginate(&state.db, per_page);
    let total_items = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Json(GalleryListResponse {
        items: items.into_iter().map(GalleryItemResponse::from).collect(),
        pagination: PaginationInfo::new(total_items, page, per_page),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Gallery",
    operation_id = "getGalleryItem",
    summary = "Get one gallery item",
    params(("id" = i32, Path, description = "Gallery item ID")),
    responses(
        (status = 200, description = "The gallery item", body = GalleryItemResponse),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_gallery_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GalleryItemResponse>, AppError> {
    let item = find_item(&state.db, id).await?;
    Ok(Json(GalleryItemResponse::from(item)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Gallery",
    operation_id = "createGalleryItem",
    summary = "Create a gallery item",
    description = "Multipart form: required `title` and `category` fields and exactly one \
        `image` file. The image uploads into `gallery/{category}`; a failed insert destroys \
        it again.",
    request_body(content_type = "multipart/form-data", description = "Item fields plus image"),
    responses(
        (status = 201, description = "Gallery item created", body = GalleryItemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn create_gallery_item(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let form =
        collect_multipart(multipart, "image", state.config.storage.max_upload_size).await?;

    let checked = (|| {
        let parsed = GalleryForm::from_multipart(&form)?;
        let title = parsed
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("'title' is required".into()))?;
        let category = parsed
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Validation("'category' is required".into()))?;
        validate_category(&category)?;
        if form.files.len() != 1 {
            return Err(AppError::Validation(
                "Exactly one 'image' file is required".into(),
            ));
        }
        Ok((parsed, title, category))
    })();

    let (parsed, title, category) = match checked {
        Ok(v) => v,
        Err(e) => {
            discard(&form.files).await;
            return Err(e);
        }
    };

    let folder = gallery_folder(&category);
    let db = state.db.clone();
    let uploaded_by = auth_user.member_id;
    let result = workflow::create_with_assets(
        &*state.object_store,
        &form.file_paths(),
        &folder,
        |mut assets| async move {
            gallery_item::ActiveModel {
                title: Set(title),
                image: Set(asset_to_json(&assets.remove(0))),
                description: Set(parsed.description.unwrap_or_default()),
                category: Set(category),
                team: Set(parsed.team),
                sub_team: Set(parsed.sub_team),
                priority: Set(parsed.priority.unwrap_or(0)),
                is_highlighted: Set(parsed.is_highlighted.unwrap_or(false)),
                landing_page_visibility: Set(parsed.landing_page_visibility.unwrap_or(false)),
                gallery_section_visibility: Set(parsed
                    .gallery_section_visibility
                    .unwrap_or(true)),
                uploaded_by: Set(Some(uploaded_by)),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(&db)
            .await
        },
    )
    .await;

    discard(&form.files).await;

    Ok((
        StatusCode::CREATED,
        Json(GalleryItemResponse::from(result?)),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Gallery",
    operation_id = "updateGalleryItem",
    summary = "Update a gallery item",
    description = "Multipart form with any subset of the create fields. Sending an `image` \
        file replaces the stored one; changing `category` re-folders future replacements \
        but does not move the existing asset.",
    params(("id" = i32, Path, description = "Gallery item ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to change"),
    responses(
        (status = 200, description = "Updated gallery item", body = GalleryItemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Object store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(member_id = auth_user.member_id))]
pub async fn update_gallery_item(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<GalleryItemResponse>, AppError> {
    auth_user.require_admin()?;

    let item = find_item(&state.db, id).await?;

    let form =
        collect_multipart(multipart, "image", state.config.storage.max_upload_size).await?;

    let checked = (|| {
        let parsed = GalleryForm::from_multipart(&form)?;
        if let Some(category) = parsed.category.as_deref() {
            validate_category(category)?;
        }
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

    let folder = gallery_folder(parsed.category.as_deref().unwrap_or(&item.category));
    let old_assets: Vec<_> = asset_from_json(Some(&item.image)).into_iter().collect();

    let db = state.db.clone();
    let result = workflow::update_with_assets(
        &*state.object_store,
        &form.file_paths(),
        &folder,
        &old_assets,
        |replacement| async move {
            let mut active: gallery_item::ActiveModel = item.into();
            if let Some(title) = parsed.title.filter(|t| !t.is_empty()) {
                active.title = Set(title);
            }
            if let Some(description) = parsed.description {
                active.description = Set(description);
            }
            if let Some(category) = parsed.category {
                active.category = Set(category);
            }
            if let Some(team) = parsed.team {
                active.team = Set(Some(team));
            }
            if let Some(sub_team) = parsed.sub_team {
                active.sub_team = Set(Some(sub_team));
            }
            if let Some(priority) = parsed.priority {
                active.priority = Set(priority);
            }
            if let Some(flag) = parsed.is_highlighted {
                active.is_highlighted = Set(flag);
            }
            if let Some(flag) = parsed.landing_page_visibility {
                active.landing_page_visibility = Set(flag);
            }
            if let Some(flag) = parsed.gallery_section_visibility {
                active.gallery_section_visibility = Set(flag);
            }
            if let Some(mut assets) = replacement {
                active.image = Set(asset_to_json(&assets.remove(0)));
            }
            active.update(&db).await
        },
    )
    .await;

    discard(&form.files).await;

    Ok(Json(GalleryItemResponse::from(result?)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Gallery",
    operation_id = "deleteGalleryItem",
    summary = "Delete a gallery item",
    description = "Deletes the record first, then destroys the image.",
    params(("id" = i32, Path, description = "Gallery item ID")),
    responses(
        (status = 204, description = "Gallery item deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn delete_gallery_item(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let item = find_item(&state.db, id).await?;
    let assets: Vec<_> = asset_from_json(Some(&item.image)).into_iter().collect();

    let db = state.db.clone();
    workflow::delete_with_assets(&*state.object_store, &assets, || async move {
        gallery_item::Entity::delete_by_id(item.id).exec(&db).await
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_item(db: &DatabaseConnection, id: i32) -> Result<gallery_item::Model, AppError> {
    gallery_item::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Gallery item {id} not found")))
}
