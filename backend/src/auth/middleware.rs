//! Authentication middleware
//!
//! `require_auth` is the request authorizer: it pulls the session token from
//! the cookie (preferred) or an `Authorization: Bearer` header, verifies it,
//! and stores the decoded identity in the request extensions. The `AuthUser`
//! and `ManagerUser` extractors read that identity back out.

use crate::auth::jwt::JwtService;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use employee_portal_shared::{AuthError, Role};
use uuid::Uuid;

/// Authenticated user decoded from the session token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Authenticated user holding the manager role
#[derive(Debug, Clone)]
pub struct ManagerUser(pub AuthUser);

/// Find the session token: cookie first, then bearer header
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Verify a session token into an `AuthUser`
pub fn authenticate(jwt: &JwtService, token: Option<String>) -> Result<AuthUser, AuthError> {
    let token = token.ok_or(AuthError::MissingToken)?;
    let claims = jwt.verify(&token)?;

    Ok(AuthUser {
        user_id: claims.user_id()?,
        email: claims.email,
        role: claims.role,
    })
}

/// Middleware guarding the session-protected routes
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &state.config().session.cookie_name);

    let user = authenticate(state.jwt(), token).map_err(|e| {
        tracing::debug!(error = %e, path = %request.uri().path(), "Rejected session");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::from(AuthError::MissingToken))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ManagerUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_manager() {
            tracing::warn!(user_id = %user.user_id, role = %user.role, "Manager-only action refused");
            return Err(ApiError::Forbidden("Forbidden".to_string()));
        }
        Ok(ManagerUser(user))
    }
}
