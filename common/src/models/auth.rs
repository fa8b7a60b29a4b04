//! Authentication request models.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::AppResult;

/// Credentials login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email, sent as `username`.
    #[validate(email(message = "Invalid email"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Account registration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    /// Client-side confirmation only, never sent.
    #[serde(skip_serializing, default)]
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
}

/// Identity provider for social login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
}

/// Login with a credential issued by an identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SocialLoginRequest {
    #[validate(length(min = 1, message = "Credential token is required"))]
    pub token: String,
    pub provider: AuthProvider,
}

/// One of the three ways to obtain an access token.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    Login(LoginRequest),
    Register(RegisterRequest),
    Social(SocialLoginRequest),
}

impl AuthRequest {
    /// Endpoint path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            AuthRequest::Login(_) => "auth/login",
            AuthRequest::Register(_) => "auth/register",
            AuthRequest::Social(_) => "auth/social-login",
        }
    }

    /// Short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthRequest::Login(_) => "login",
            AuthRequest::Register(_) => "register",
            AuthRequest::Social(_) => "social",
        }
    }

    /// Validates the payload.
    ///
    /// # Errors
    /// Returns `AppError::Validation` listing every failed rule.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            AuthRequest::Login(req) => req.validate()?,
            AuthRequest::Register(req) => req.validate()?,
            AuthRequest::Social(req) => req.validate()?,
        }
        Ok(())
    }

    /// JSON body sent to the endpoint.
    pub fn body(&self) -> AppResult<serde_json::Value> {
        let body = match self {
            AuthRequest::Login(req) => serde_json::to_value(req)?,
            AuthRequest::Register(req) => serde_json::to_value(req)?,
            AuthRequest::Social(req) => serde_json::to_value(req)?,
        };
        Ok(body)
    }
}

/// Token issued by the auth endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// At least 8 characters with upper, lower, digit and special character.
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::new("password_length")
            .with_message("Password must be at least 8 characters".into()));
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());
    if has_lower && has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(
            "Password must contain uppercase, lowercase, number, and special character".into(),
        ))
    }
}
