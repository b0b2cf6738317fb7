//! Request DTOs for the blog generator API
//!
//! Each body knows how to validate itself; failures carry the offending field.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::validation;

/// Request body for `POST /generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    /// Optional writing-style hint appended to the prompt
    #[serde(default)]
    pub style: Option<String>,
}

impl GenerateRequest {
    /// Returns the trimmed topic and the sanitized style.
    pub fn validate(&self) -> Result<(String, Option<String>), ApiError> {
        let topic =
            validation::validate_topic(&self.topic).map_err(|e| ApiError::validation("topic", e))?;
        let style = validation::validate_style(self.style.as_deref())
            .map_err(|e| ApiError::validation("style", e))?
            .map(|style| validation::sanitize_text(&style))
            .filter(|style| !style.is_empty());
        Ok((topic, style))
    }
}

/// Request body for `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/register`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validation::validate_username(&self.username)
            .map_err(|e| ApiError::validation("username", e))?;
        validation::validate_email(&self.email).map_err(|e| ApiError::validation("email", e))?;
        validation::validate_password(&self.password)
            .map_err(|e| ApiError::validation("password", e))?;
        Ok(())
    }
}

/// Request body for `POST /auth/change-password`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validation::validate_password(&self.new_password)
            .map_err(|e| ApiError::validation("new_password", e))
    }
}

/// Request body for `POST /api/webhook`
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validation::validate_webhook(&self.event, &self.data)
            .map_err(|e| ApiError::validation("event", e))
    }
}

/// Query string for `POST /test-telegram`
#[derive(Debug, Clone, Deserialize)]
pub struct TestNotificationQuery {
    #[serde(default = "default_test_message")]
    pub message: String,
}

fn default_test_message() -> String {
    "Тестовое уведомление от API".to_string()
}
