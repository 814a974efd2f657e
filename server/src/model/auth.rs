use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{RestError, RestResult};

fn required(value: Option<String>, field: &str) -> RestResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(RestError::Validation(format!("{field} is required"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegisterRequest {
    /// Returns (first_name, last_name, email, password) or a 400 when any
    /// field is missing or blank.
    pub fn validate(self) -> RestResult<(String, String, String, String)> {
        Ok((
            required(self.first_name, "first_name")?,
            required(self.last_name, "last_name")?,
            required(self.email, "email")?,
            required(self.password, "password")?,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(self) -> RestResult<(String, String)> {
        Ok((
            required(self.email, "email")?,
            required(self.password, "password")?,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Display name of the logged-in user
    pub user: String,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body for password-reset and re-send-verification requests
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EmailRequest {
    pub email: Option<String>,
}

impl EmailRequest {
    pub fn validate(self) -> RestResult<String> {
        required(self.email, "email")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PasswordUpdateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl PasswordUpdateRequest {
    pub fn validate(self) -> RestResult<(String, String)> {
        Ok((
            required(self.email, "email")?,
            required(self.password, "password")?,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_blank_fields_are_rejected() {
        let request = RegisterRequest {
            first_name: Some("Kerry".to_string()),
            last_name: Some("  ".to_string()),
            email: Some("kerry@example.com".to_string()),
            password: Some("secret".to_string()),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_complete_register_request_passes() {
        let request = RegisterRequest {
            first_name: Some("Kerry".to_string()),
            last_name: Some("Hilson".to_string()),
            email: Some("kerry@example.com".to_string()),
            password: Some("secret".to_string()),
        };

        let (first, last, email, password) = request.validate().unwrap();
        assert_eq!(first, "Kerry");
        assert_eq!(last, "Hilson");
        assert_eq!(email, "kerry@example.com");
        assert_eq!(password, "secret");
    }
}
