//! Business logic services
//!
//! Services hold the account and roster rules and coordinate the credential
//! store, the hashers and the mailer. Handlers stay thin.

pub mod auth;
pub mod employee;

pub use auth::{AuthService, LoginOutcome};
pub use employee::EmployeeService;
