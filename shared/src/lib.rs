//! Employee Portal Shared Library
//!
//! This crate contains the wire types, role model, and input validation
//! shared by the backend and any Rust client of the API.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{EmployeeView, Role};
pub use types::*;
