use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{allowed_member, member, session_token};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UpdateEmailRequest,
    UpdatePasswordRequest, validate_email, validate_login_request, validate_password,
    validate_register_request,
};
use crate::models::member::MemberResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new member",
    description = "Registers a member. The email must already be on the sign-up allow list; \
        the role recorded there (if any) is copied onto the new member.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Member created", body = RegisterResponse),
        (status = 400, description = "Validation error or email not allowed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email or phone already registered (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = payload.email.trim().to_lowercase();

    let allowed = allowed_member::Entity::find()
        .filter(allowed_member::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::Validation("This email is not on the sign-up allow list".into())
        })?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let new_member = member::ActiveModel {
        email: Set(email),
        password: Set(password_hash),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        phone: Set(payload.phone.map(|p| p.trim().to_string())),
        role: Set(allowed
            .role
            .unwrap_or_else(|| member::DEFAULT_ROLE.to_string())),
        profile_picture: Set(None),
        is_deleted: Set(false),
        team_id: Set(None),
        sub_team_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = new_member
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("A member with this email or phone already exists".into())
            }
            _ => AppError::from(e),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: created.id,
            email: created.email,
            role: created.role,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Verifies credentials, issues a bearer token, and records it as a revocable \
        server-side session.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = payload.email.trim().to_lowercase();

    let member = member::Entity::find()
        .filter(member::Column::Email.eq(&email))
        .filter(member::Column::IsDeleted.eq(false))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &member.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let ttl_hours = state.config.auth.token_ttl_hours;
    let token = jwt::sign(member.id, &member.email, &state.config.auth.jwt_secret, ttl_hours)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    session_token::ActiveModel {
        token: Set(token.clone()),
        member_id: Set(member.id),
        user_agent: Set(user_agent),
        is_valid: Set(true),
        expires_at: Set(Utc::now() + Duration::hours(ttl_hours)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok(Json(LoginResponse {
        token,
        email: member.email,
        role: member.role,
    }))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out",
    description = "Revokes the session behind the presented token. The token stops \
        authenticating immediately, before its JWT expiry.",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    session_token::Entity::update_many()
        .col_expr(session_token::Column::IsValid, Expr::value(false))
        .filter(session_token::Column::Token.eq(&auth_user.token))
        .exec(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current member",
    responses(
        (status = 200, description = "The authenticated member", body = MemberResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(member_id = auth_user.member_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MemberResponse>, AppError> {
    let member = member::Entity::find_by_id(auth_user.member_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(Json(MemberResponse::from(member)))
}

#[utoipa::path(
    put,
    path = "/password",
    tag = "Auth",
    operation_id = "updatePassword",
    summary = "Change password",
    description = "Changes the member's password after re-checking the current one. Every \
        session belonging to the member is revoked; all outstanding tokens stop working.",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password changed, all sessions revoked"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong current password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member_id = auth_user.member_id))]
pub async fn update_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_password(&payload.new_password)?;

    let member = member::Entity::find_by_id(auth_user.member_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let is_valid = hash::verify_password(&payload.old_password, &member.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let new_hash = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let mut active: member::ActiveModel = member.into();
    active.password = Set(new_hash);
    active.update(&state.db).await?;

    revoke_all_sessions(&state.db, auth_user.member_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/email",
    tag = "Auth",
    operation_id = "updateEmail",
    summary = "Change email",
    description = "Changes the member's email after re-checking the password. Every session \
        belonging to the member is revoked.",
    request_body = UpdateEmailRequest,
    responses(
        (status = 204, description = "Email changed, all sessions revoked"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 409, description = "Email already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(member_id = auth_user.member_id))]
pub async fn update_email(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_email(&payload.new_email)?;

    let member = member::Entity::find_by_id(auth_user.member_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let is_valid = hash::verify_password(&payload.password, &member.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let mut active: member::ActiveModel = member.into();
    active.email = Set(payload.new_email.trim().to_lowercase());
    active
        .update(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("A member with this email already exists".into())
            }
            _ => AppError::from(e),
        })?;

    revoke_all_sessions(&state.db, auth_user.member_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Flip `is_valid` on every session the member holds. Used after credential
/// changes and soft deletes.
pub async fn revoke_all_sessions(db: &DatabaseConnection, member_id: i32) -> Result<(), DbErr> {
    session_token::Entity::update_many()
        .col_expr(session_token::Column::IsValid, Expr::value(false))
        .filter(session_token::Column::MemberId.eq(member_id))
        .exec(db)
        .await?;
    Ok(())
}
