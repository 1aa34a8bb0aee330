//! Account routes
//!
//! Registration, login/logout, the password-reset pair and the current user.
//! Login hands the session token back both in the body and as an http-only
//! cookie; the cookie attributes come from `SessionConfig`.

use crate::auth::AuthUser;
use crate::config::SessionConfig;
use crate::error::ApiResult;
use crate::services::auth::{
    AuthService, LOGGED_IN, PASSWORD_RESET, REGISTERED, RESET_LINK_SENT,
};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use employee_portal_shared::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    ResetPasswordRequest,
};
use employee_portal_shared::EmployeeView;

pub const LOGGED_OUT: &str = "Logged out";

/// Build the session cookie carrying `token`
pub fn session_cookie(session: &SessionConfig, token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((session.cookie_name.clone(), token))
        .http_only(true)
        .secure(session.secure)
        .same_site(session.same_site.into())
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// A cookie that makes the browser drop the session
pub fn cleared_session_cookie(session: &SessionConfig) -> Cookie<'static> {
    let mut cookie = session_cookie(session, String::new(), 0);
    cookie.make_removal();
    cookie
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(req) = payload?;
    AuthService::register(&state, req).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new(REGISTERED))))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let Json(req) = payload?;
    let outcome = AuthService::login(&state, req).await?;

    let cookie = session_cookie(
        &state.config().session,
        outcome.token.clone(),
        state.jwt().expiry_secs(),
    );

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: LOGGED_IN.to_string(),
            role: outcome.role,
            token: outcome.token,
        }),
    ))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(cleared_session_cookie(&state.config().session)),
        Json(MessageResponse::new(LOGGED_OUT)),
    )
}

/// POST /forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    AuthService::forgot_password(&state, req).await?;
    Ok(Json(MessageResponse::new(RESET_LINK_SENT)))
}

/// POST /reset-password/:token
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = payload?;
    AuthService::reset_password(&state, &token, req).await?;
    Ok(Json(MessageResponse::new(PASSWORD_RESET)))
}

/// GET /me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<EmployeeView>> {
    let view = AuthService::current_user(&state, &user).await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::SameSite;

    #[test]
    fn test_development_cookie_attributes() {
        let cookie = session_cookie(
            &SessionConfig::for_environment(false),
            "abc".to_string(),
            86400,
        );
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86400)));
    }

    #[test]
    fn test_production_cookie_is_cross_site() {
        let cookie = session_cookie(
            &SessionConfig::for_environment(true),
            "abc".to_string(),
            60,
        );
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = cleared_session_cookie(&SessionConfig::for_environment(false));
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }
}
