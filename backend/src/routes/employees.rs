//! Employee roster routes
//!
//! All of these sit behind the session middleware. Mutations take
//! `ManagerUser`, which refuses non-managers before the body is parsed.

use crate::auth::{AuthUser, ManagerUser};
use crate::error::ApiResult;
use crate::services::employee::{
    EmployeeService, EMPLOYEE_ADDED, EMPLOYEE_DELETED, EMPLOYEE_UPDATED,
};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use employee_portal_shared::types::{
    CreateEmployeeRequest, EmployeeQuery, EmployeeResponse, MessageResponse,
    UpdateEmployeeRequest,
};
use employee_portal_shared::EmployeeView;

/// GET /employees
pub async fn list_employees(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<EmployeeQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<EmployeeView>>> {
    let Query(query) = query?;
    let employees = EmployeeService::list(&state, &user, query.search.as_deref()).await?;
    Ok(Json(employees))
}

/// POST /employees
pub async fn add_employee(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EmployeeResponse>)> {
    let Json(req) = payload?;
    let employee = EmployeeService::add(&state, &manager, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(EmployeeResponse {
            message: EMPLOYEE_ADDED.to_string(),
            employee,
        }),
    ))
}

/// PUT /employees/:id
pub async fn update_employee(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEmployeeRequest>, JsonRejection>,
) -> ApiResult<Json<EmployeeResponse>> {
    let Json(req) = payload?;
    let employee = EmployeeService::update(&state, &manager, &id, req).await?;
    Ok(Json(EmployeeResponse {
        message: EMPLOYEE_UPDATED.to_string(),
        employee,
    }))
}

/// DELETE /employees/:id
pub async fn delete_employee(
    State(state): State<AppState>,
    ManagerUser(manager): ManagerUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    EmployeeService::delete(&state, &manager, &id).await?;
    Ok(Json(MessageResponse::new(EMPLOYEE_DELETED)))
}
