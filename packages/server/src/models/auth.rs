use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for member registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Email address; must be on the sign-up allow list.
    #[schema(example = "driver@apexracing.org")]
    pub email: String,
    /// Password (8-128 characters, at least one letter and one digit).
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Optional phone number, at least 10 digits.
    pub phone: Option<String>,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "First and last name are required".into(),
        ));
    }
    if let Some(phone) = &payload.phone {
        if phone.chars().filter(|c| c.is_ascii_digit()).count() < 10 {
            return Err(AppError::Validation(
                "Phone number must contain at least 10 digits".into(),
            ));
        }
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() || email.chars().count() > 254 || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_alphabetic())
    {
        return Err(AppError::Validation(
            "Password must contain at least one letter and one digit".into(),
        ));
    }
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "driver@apexracing.org")]
    pub email: String,
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub id: i32,
    pub email: String,
    /// Role copied from the allow-list entry (defaults to `member`).
    pub role: String,
}

/// Successful login response.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token; also tracked server-side as a revocable session.
    pub token: String,
    pub email: String,
    pub role: String,
}

/// Request body for a password change. Committing it revokes every session
/// belonging to the member.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Request body for an email change. Committing it revokes every session
/// belonging to the member.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateEmailRequest {
    pub new_email: String,
    /// Current password, re-checked before the change.
    pub password: String,
}
