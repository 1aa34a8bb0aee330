//! API request and response types
//!
//! Request fields are optional at the serde level so that missing input is
//! reported by the service validators with a field-specific message instead
//! of a generic deserialization failure.

use crate::models::{EmployeeView, Role};
use serde::{Deserialize, Serialize};

/// Generic `{message}` response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
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

// ============================================================================
// Authentication
// ============================================================================

/// Registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub admin_code: Option<String>,
    pub role: Option<Role>,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login response; the token is also set as the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub role: Role,
    pub token: String,
}

/// Forgot-password request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

/// Reset-password request; the secret travels in the path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

// ============================================================================
// Employees
// ============================================================================

/// Manager request to add an employee account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateEmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub password: Option<String>,
}

/// Partial update of an employee record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
}

/// Query string for the employee listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeQuery {
    pub search: Option<String>,
}

/// Response for add/update operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub message: String,
    pub employee: EmployeeView,
}
