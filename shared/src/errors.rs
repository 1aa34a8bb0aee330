//! Error types shared between the backend and its clients

use thiserror::Error;

/// Authentication error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("No token provided")]
    MissingToken,
}

/// Password reset error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResetError {
    #[error("Invalid or expired reset token.")]
    InvalidOrExpired,
}
