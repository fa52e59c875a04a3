use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{allowed_member, member, sub_team, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::auth::revoke_all_sessions;
use crate::models::admin::{
    AddAllowedMemberRequest, AllowedMemberResponse, AssignTeamRequest, ChangeRoleRequest,
    MemberListQuery, validate_add_allowed_member, validate_role,
};
use crate::models::member::{MemberListResponse, MemberResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/allowed-members",
    tag = "Admin",
    operation_id = "addAllowedMember",
    summary = "Add an email to the sign-up allow list",
    description = "Only emails on this list can register. The optional role override is \
        copied onto the member when they sign up.",
    request_body = AddAllowedMemberRequest,
    responses(
        (status = 201, description = "Allow-list entry created", body = AllowedMemberResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Email already on the list (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member_id = auth_user.member_id))]
pub async fn add_allowed_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AddAllowedMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_add_allowed_member(&payload)?;

    let created = allowed_member::ActiveModel {
        email: Set(payload.email.trim().to_lowercase()),
        role: Set(payload.role),
        joined_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("This email is already on the allow list".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(AllowedMemberResponse::from(created)),
    ))
}

#[utoipa::path(
    get,
    path = "/allowed-members",
    tag = "Admin",
    operation_id = "listAllowedMembers",
    summary = "List the sign-up allow list",
    responses(
        (status = 200, description = "Allow-list entries", body = [AllowedMemberResponse]),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn list_allowed_members(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AllowedMemberResponse>>, AppError> {
    auth_user.require_admin()?;

    let entries = allowed_member::Entity::find()
        .order_by_asc(allowed_member::Column::Email)
        .all(&state.db)
        .await?;

    Ok(Json(
        entries.into_iter().map(AllowedMemberResponse::from).collect(),
    ))
}

#[utoipa::path(
    delete,
    path = "/allowed-members/{id}",
    tag = "Admin",
    operation_id = "removeAllowedMember",
    summary = "Remove an allow-list entry",
    description = "Stops future registrations with this email. Members who already \
        registered are unaffected.",
    params(("id" = i32, Path, description = "Allow-list entry ID")),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn remove_allowed_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let result = allowed_member::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Allow-list entry {id} not found"
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/members",
    tag = "Admin",
    operation_id = "listMembers",
    summary = "List members",
    description = "Soft-deleted members are hidden unless `include_deleted` is set.",
    params(MemberListQuery),
    responses(
        (status = 200, description = "Members matching the filters", body = MemberListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn list_members(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<MemberListQuery>,
) -> Result<Json<MemberListResponse>, AppError> {
    auth_user.require_admin()?;

    let mut finder = member::Entity::find().order_by_asc(member::Column::Email);
    if !query.include_deleted.unwrap_or(false) {
        finder = finder.filter(member::Column::IsDeleted.eq(false));
    }
    if let Some(role) = &query.role {
        finder = finder.filter(member::Column::Role.eq(role));
    }
    if let Some(team_id) = query.team_id {
        finder = finder.filter(member::Column::TeamId.eq(team_id));
    }
    if let Some(sub_team_id) = query.sub_team_id {
        finder = finder.filter(member::Column::SubTeamId.eq(sub_team_id));
    }
    let members = finder.all(&state.db).await?;

    let total = members.len() as u64;
    Ok(Json(MemberListResponse {
        members: members.into_iter().map(MemberResponse::from).collect(),
        total,
    }))
}

#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "Admin",
    operation_id = "softDeleteMember",
    summary = "Soft-delete a member",
    description = "Marks the member deleted, revokes every session they hold, clears their \
        team assignment, and decrements the affected counters. The row is kept. Deleting an \
        already-deleted member answers 409.",
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 204, description = "Member soft-deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Member not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Member already deleted (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn soft_delete_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let target = find_member(&state.db, id).await?;
    if target.is_deleted {
        return Err(AppError::Conflict(format!(
            "Member {id} is already deleted"
        )));
    }

    let old_team = target.team_id;
    let old_sub_team = target.sub_team_id;

    let mut active: member::ActiveModel = target.into();
    active.is_deleted = Set(true);
    active.team_id = Set(None);
    active.sub_team_id = Set(None);
    active.update(&state.db).await?;

    adjust_counters(&state.db, old_team, old_sub_team, -1).await?;
    revoke_all_sessions(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/members/{id}/team",
    tag = "Admin",
    operation_id = "assignMemberTeam",
    summary = "Assign a member to a team and sub-team",
    description = "Both fields are optional; omitting both clears the assignment. A \
        sub-team must belong to the given team (or the team is derived from it). Counters \
        on the affected teams and sub-teams are adjusted with atomic in-database \
        increments; under concurrent assignments they may briefly drift from a live count.",
    params(("id" = i32, Path, description = "Member ID")),
    request_body = AssignTeamRequest,
    responses(
        (status = 200, description = "Updated member", body = MemberResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Member, team, or sub-team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member_id = auth_user.member_id))]
pub async fn assign_member_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AssignTeamRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    auth_user.require_admin()?;

    let target = find_member(&state.db, id).await?;
    if target.is_deleted {
        return Err(AppError::NotFound(format!("Member {id} not found")));
    }

    // Resolve the new assignment, deriving the team from the sub-team when
    // only the latter is given.
    let (new_team, new_sub_team) = match (payload.team_id, payload.sub_team_id) {
        (team_id, Some(sub_team_id)) => {
            let sub_team = sub_team::Entity::find_by_id(sub_team_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sub-team {sub_team_id} not found")))?;
            if let Some(team_id) = team_id {
                if sub_team.team_id != team_id {
                    return Err(AppError::Validation(format!(
                        "Sub-team {sub_team_id} does not belong to team {team_id}"
                    )));
                }
            }
            (Some(sub_team.team_id), Some(sub_team_id))
        }
        (Some(team_id), None) => {
            team::Entity::find_by_id(team_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Team {team_id} not found")))?;
            (Some(team_id), None)
        }
        (None, None) => (None, None),
    };

    let old_team = target.team_id;
    let old_sub_team = target.sub_team_id;

    let mut active: member::ActiveModel = target.into();
    active.team_id = Set(new_team);
    active.sub_team_id = Set(new_sub_team);
    let updated = active.update(&state.db).await?;

    if old_team != new_team || old_sub_team != new_sub_team {
        adjust_counters(
            &state.db,
            old_team.filter(|t| Some(*t) != new_team),
            old_sub_team.filter(|s| Some(*s) != new_sub_team),
            -1,
        )
        .await?;
        adjust_counters(
            &state.db,
            new_team.filter(|t| Some(*t) != old_team),
            new_sub_team.filter(|s| Some(*s) != old_sub_team),
            1,
        )
        .await?;
    }

    Ok(Json(MemberResponse::from(updated)))
}

#[utoipa::path(
    put,
    path = "/members/{id}/role",
    tag = "Admin",
    operation_id = "changeMemberRole",
    summary = "Change a member's role",
    description = "Granting or revoking an administrative role (`admin`, `super`) requires \
        the `super` role; plain admins manage only `member` and `user`.",
    params(("id" = i32, Path, description = "Member ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Updated member", body = MemberResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member_id = auth_user.member_id))]
pub async fn change_member_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ChangeRoleRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    auth_user.require_admin()?;
    validate_role(&payload.role)?;

    let target = find_member(&state.db, id).await?;
    if target.is_deleted {
        return Err(AppError::NotFound(format!("Member {id} not found")));
    }

    let touches_admin_role = member::ADMIN_ROLES.contains(&payload.role.as_str())
        || member::ADMIN_ROLES.contains(&target.role.as_str());
    if touches_admin_role && auth_user.role != "super" {
        return Err(AppError::PermissionDenied);
    }

    let mut active: member::ActiveModel = target.into();
    active.role = Set(payload.role);
    let updated = active.update(&state.db).await?;

    // A role change may shrink what outstanding tokens are allowed to do, so
    // force a fresh login.
    revoke_all_sessions(&state.db, id).await?;

    Ok(Json(MemberResponse::from(updated)))
}

/// Apply `delta` to the cached member counters of the given team and
/// sub-team. In-database arithmetic keeps concurrent adjustments from losing
/// updates, though two racing assignments can still observe each other
/// mid-flight.
async fn adjust_counters(
    db: &DatabaseConnection,
    team_id: Option<i32>,
    sub_team_id: Option<i32>,
    delta: i32,
) -> Result<(), DbErr> {
    if let Some(team_id) = team_id {
        team::Entity::update_many()
            .col_expr(
                team::Column::TotalMembers,
                Expr::col(team::Column::TotalMembers).add(delta),
            )
            .filter(team::Column::Id.eq(team_id))
            .exec(db)
            .await?;
    }
    if let Some(sub_team_id) = sub_team_id {
        sub_team::Entity::update_many()
            .col_expr(
                sub_team::Column::TotalMembers,
                Expr::col(sub_team::Column::TotalMembers).add(delta),
            )
            .filter(sub_team::Column::Id.eq(sub_team_id))
            .exec(db)
            .await?;
    }
    Ok(())
}

async fn find_member(db: &DatabaseConnection, id: i32) -> Result<member::Model, AppError> {
    member::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member {id} not found")))
}
