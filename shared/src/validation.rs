//! Input validation functions
//!
//! This module provides validation utilities for user input.
//! Email syntax is delegated to the `validator` crate.

use validator::ValidateEmail;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 6;
/// bcrypt only reads the first 72 bytes of its input
pub const PASSWORD_MAX_BYTES: usize = 72;
pub const DEPARTMENT_MAX_CHARS: usize = 100;

/// Require a field to be present, returning its value
pub fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("\"{}\" is required", field)),
    }
}

/// Validate display name length
pub fn validate_name(name: &str) -> Result<(), String> {
    let len = name.trim().chars().count();
    if len < NAME_MIN_CHARS {
        return Err(format!(
            "Name must be at least {} characters",
            NAME_MIN_CHARS
        ));
    }
    if len > NAME_MAX_CHARS {
        return Err(format!("Name must be at most {} characters", NAME_MAX_CHARS));
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or("");
    if !domain.contains('.') || !email.validate_email() {
        return Err("Please enter a valid email address.".to_string());
    }
    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(format!(
            "Password must be at least {} characters.",
            PASSWORD_MIN_CHARS
        ));
    }
    if password.len() > PASSWORD_MAX_BYTES {
        return Err(format!(
            "Password must be at most {} bytes.",
            PASSWORD_MAX_BYTES
        ));
    }
    Ok(())
}

/// Validate department name
pub fn validate_department(department: &str) -> Result<(), String> {
    if department.trim().is_empty() {
        return Err("Department cannot be empty".to_string());
    }
    if department.chars().count() > DEPARTMENT_MAX_CHARS {
        return Err("Department name too long".to_string());
    }
    Ok(())
}

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
