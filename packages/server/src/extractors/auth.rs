use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::{member, session_token};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated member extracted from the `Authorization: Bearer <token>`
/// header.
///
/// A token authenticates only if it decodes, matches a live session row
/// (valid, not expired), and resolves to an existing non-deleted member —
/// revoking the session kills the token even before its JWT expiry. Role
/// checks happen via `require_role()` in the handler body, always after
/// authentication.
pub struct AuthUser {
    pub member_id: i32,
    pub email: String,
    pub role: String,
    /// The raw bearer token, kept so logout can revoke exactly this session.
    pub token: String,
}

impl AuthUser {
    /// Returns `Ok(())` if the member's role is in the allow list,
    /// `Err(PermissionDenied)` otherwise.
    pub fn require_role(&self, allowed: &[&str]) -> Result<(), AppError> {
        if allowed.iter().any(|r| *r == self.role) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Admin operations require role ∈ {admin, super}.
    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(member::ADMIN_ROLES)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let session = session_token::Entity::find()
            .filter(session_token::Column::Token.eq(token))
            .filter(session_token::Column::IsValid.eq(true))
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        if session.expires_at < Utc::now() {
            return Err(AppError::TokenInvalid);
        }

        let member = member::Entity::find_by_id(claims.uid)
            .one(&state.db)
            .await?
            .filter(|m| !m.is_deleted)
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser {
            member_id: member.id,
            email: member.email,
            role: member.role,
            token: token.to_string(),
        })
    }
}
