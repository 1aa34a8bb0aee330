//! Employee roster service
//!
//! Listing is open to any session; adding, updating and deleting employees is
//! for managers only, which the route layer enforces with `ManagerUser`.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::repositories::{NewUser, UpdateUser};
use crate::state::AppState;
use employee_portal_shared::types::{CreateEmployeeRequest, UpdateEmployeeRequest};
use employee_portal_shared::validation::{
    normalize_email, require, validate_department, validate_email, validate_name,
    validate_password,
};
use employee_portal_shared::{EmployeeView, Role};
use tracing::info;
use uuid::Uuid;

pub const EMPLOYEE_ADDED: &str = "Employee added";
pub const EMPLOYEE_UPDATED: &str = "Employee updated";
pub const EMPLOYEE_DELETED: &str = "Employee deleted";

fn not_found() -> ApiError {
    ApiError::NotFound("Employee not found".to_string())
}

/// Path identifiers that are not UUIDs cannot name a record
fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| not_found())
}

/// Employee roster service
pub struct EmployeeService;

impl EmployeeService {
    /// Managers see everyone; anyone else sees only their own record
    pub async fn list(
        state: &AppState,
        caller: &AuthUser,
        search: Option<&str>,
    ) -> Result<Vec<EmployeeView>, ApiError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        if caller.role.is_manager() {
            let users = state
                .store()
                .list(search)
                .await
                .map_err(ApiError::from_store)?;
            return Ok(users.iter().map(|u| u.to_view()).collect());
        }

        let own = state
            .store()
            .find_by_id(caller.user_id)
            .await
            .map_err(ApiError::from_store)?;
        Ok(own
            .filter(|u| search.map_or(true, |needle| crate::repositories::matches_search(u, needle)))
            .map(|u| vec![u.to_view()])
            .unwrap_or_default())
    }

    /// Create an employee account on a manager's behalf
    pub async fn add(
        state: &AppState,
        manager: &AuthUser,
        req: CreateEmployeeRequest,
    ) -> Result<EmployeeView, ApiError> {
        let name = require("name", req.name.as_deref()).map_err(ApiError::Validation)?;
        let email = require("email", req.email.as_deref()).map_err(ApiError::Validation)?;
        let department =
            require("department", req.department.as_deref()).map_err(ApiError::Validation)?;
        let password =
            require("password", req.password.as_deref()).map_err(ApiError::Validation)?;

        validate_name(name).map_err(ApiError::Validation)?;
        validate_email(email.trim()).map_err(ApiError::Validation)?;
        validate_department(department).map_err(ApiError::Validation)?;
        validate_password(password).map_err(ApiError::Validation)?;

        let email = normalize_email(email);
        if state
            .store()
            .email_exists(&email)
            .await
            .map_err(ApiError::from_store)?
        {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }

        let password_hash = state
            .passwords()
            .hash_async(password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        let user = state
            .store()
            .create(NewUser {
                name: name.trim().to_string(),
                email,
                password_hash,
                role: Role::Employee,
                department: department.trim().to_string(),
            })
            .await
            .map_err(ApiError::from_store)?;

        info!(user_id = %user.id, by = %manager.user_id, "Employee added");
        Ok(user.to_view())
    }

    /// Apply a partial update to an employee record
    pub async fn update(
        state: &AppState,
        manager: &AuthUser,
        id: &str,
        req: UpdateEmployeeRequest,
    ) -> Result<EmployeeView, ApiError> {
        let id = parse_id(id)?;

        if let Some(name) = &req.name {
            validate_name(name).map_err(ApiError::Validation)?;
        }
        if let Some(email) = &req.email {
            validate_email(email.trim()).map_err(ApiError::Validation)?;
        }
        if let Some(department) = &req.department {
            validate_department(department).map_err(ApiError::Validation)?;
        }

        let changes = UpdateUser {
            name: req.name.map(|n| n.trim().to_string()),
            email: req.email.as_deref().map(normalize_email),
            department: req.department.map(|d| d.trim().to_string()),
        };

        let user = state
            .store()
            .update(id, changes)
            .await
            .map_err(ApiError::from_store)?
            .ok_or_else(not_found)?;

        info!(user_id = %user.id, by = %manager.user_id, "Employee updated");
        Ok(user.to_view())
    }

    /// Remove an employee record
    pub async fn delete(state: &AppState, manager: &AuthUser, id: &str) -> Result<(), ApiError> {
        let id = parse_id(id)?;

        let deleted = state
            .store()
            .delete(id)
            .await
            .map_err(ApiError::from_store)?;
        if !deleted {
            return Err(not_found());
        }

        info!(user_id = %id, by = %manager.user_id, "Employee deleted");
        Ok(())
    }
}
