//! Account service: registration, login, password reset and the current user
//!
//! Password hashing and verification run on the blocking thread pool; the
//! JWT service is shared from state with pre-computed keys.

use crate::auth::{hash_secret, AuthUser, PasswordService, TokenIdentity};
use crate::email::password_reset_email;
use crate::error::ApiError;
use crate::repositories::NewUser;
use crate::state::AppState;
use chrono::Utc;
use employee_portal_shared::types::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
use employee_portal_shared::validation::{
    normalize_email, require, validate_department, validate_email, validate_name,
    validate_password,
};
use employee_portal_shared::{AuthError, EmployeeView, ResetError, Role};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

pub const REGISTERED: &str = "User registered successfully.";
pub const LOGGED_IN: &str = "Login successful";
pub const RESET_LINK_SENT: &str = "A reset link has been sent.";
pub const PASSWORD_RESET: &str = "Password reset successful.";

/// A successful login: the session token and the role it carries
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub role: Role,
}

/// Compare a presented admin code with the configured one.
///
/// Both sides are digested first so the comparison runs over equal-length
/// inputs and does not short-circuit on the first differing byte.
fn admin_code_matches(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Account service
pub struct AuthService;

impl AuthService {
    /// Register a new user; no session is issued.
    ///
    /// A manager registration must carry the configured admin code; a missing
    /// or wrong code fails with `Forbidden` before any other field is checked.
    pub async fn register(state: &AppState, req: RegisterRequest) -> Result<(), ApiError> {
        let role = req
            .role
            .ok_or_else(|| ApiError::Validation("\"role\" is required".to_string()))?;

        if role == Role::Manager {
            let presented = req.admin_code.as_deref().unwrap_or_default();
            if presented.trim().is_empty()
                || !admin_code_matches(presented, state.config().auth.admin_code.expose_secret())
            {
                warn!(email = ?req.email, "Manager registration with missing or wrong admin code");
                return Err(ApiError::Forbidden("Invalid admin code.".to_string()));
            }
        }

        let name = require("name", req.name.as_deref()).map_err(ApiError::Validation)?;
        let email = require("email", req.email.as_deref()).map_err(ApiError::Validation)?;
        let password =
            require("password", req.password.as_deref()).map_err(ApiError::Validation)?;

        validate_name(name).map_err(ApiError::Validation)?;
        validate_email(email.trim()).map_err(ApiError::Validation)?;
        validate_password(password).map_err(ApiError::Validation)?;

        let department = match role {
            Role::Employee => {
                let department = require("department", req.department.as_deref())
                    .map_err(ApiError::Validation)?;
                validate_department(department).map_err(ApiError::Validation)?;
                department.trim().to_string()
            }
            Role::Manager => String::new(),
        };

        let email = normalize_email(email);
        if state
            .store()
            .email_exists(&email)
            .await
            .map_err(ApiError::from_store)?
        {
            return Err(ApiError::Conflict("User already exists".to_string()));
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
                role,
                department,
            })
            .await
            .map_err(ApiError::from_store)?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(())
    }

    /// Check credentials and mint a session token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(state: &AppState, req: LoginRequest) -> Result<LoginOutcome, ApiError> {
        let email = require("email", req.email.as_deref()).map_err(ApiError::Validation)?;
        let password =
            require("password", req.password.as_deref()).map_err(ApiError::Validation)?;
        validate_email(email.trim()).map_err(ApiError::Validation)?;

        let email = normalize_email(email);
        let Some(user) = state
            .store()
            .find_by_email(&email)
            .await
            .map_err(ApiError::from_store)?
        else {
            info!(email = %email, "Login failed: unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        let valid = PasswordService::verify_async(password.to_string(), user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = state
            .jwt()
            .issue(&TokenIdentity {
                user_id: user.id,
                email: &user.email,
                role: user.role,
            })
            .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginOutcome {
            token,
            role: user.role,
        })
    }

    /// Start a password reset.
    ///
    /// Succeeds the same way whether or not the address has an account.
    pub async fn forgot_password(
        state: &AppState,
        req: ForgotPasswordRequest,
    ) -> Result<(), ApiError> {
        let email = req
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| validate_email(e).is_ok())
            .ok_or_else(|| {
                ApiError::Validation("Please enter a valid email address.".to_string())
            })?;

        let email = normalize_email(email);
        let Some(user) = state
            .store()
            .find_by_email(&email)
            .await
            .map_err(ApiError::from_store)?
        else {
            return Ok(());
        };

        let issued = state.resets().issue(Utc::now());
        state
            .store()
            .set_reset_token(user.id, &issued.token_hash, issued.expires_at)
            .await
            .map_err(ApiError::from_store)?;

        let reset_url = format!(
            "{}/reset-password/{}",
            state.config().client.base_url.trim_end_matches('/'),
            issued.secret
        );
        state
            .mailer()
            .send(&password_reset_email(&user.email, &reset_url))
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, expires_at = %issued.expires_at, "Password reset requested");
        Ok(())
    }

    /// Redeem a reset secret and set a new password.
    ///
    /// An unknown or expired secret is rejected before the new password is
    /// hashed; the final redemption is still the store's atomic consume.
    pub async fn reset_password(
        state: &AppState,
        secret: &str,
        req: ResetPasswordRequest,
    ) -> Result<(), ApiError> {
        let password = req.password.as_deref().unwrap_or_default();
        validate_password(password).map_err(ApiError::Validation)?;

        let token_hash = hash_secret(secret);
        state
            .store()
            .find_by_reset_token(&token_hash, Utc::now())
            .await
            .map_err(ApiError::from_store)?
            .ok_or(ResetError::InvalidOrExpired)?;

        let password_hash = state
            .passwords()
            .hash_async(password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        let user = state
            .store()
            .consume_reset_token(&token_hash, Utc::now(), &password_hash)
            .await
            .map_err(ApiError::from_store)?
            .ok_or(ResetError::InvalidOrExpired)?;

        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// The caller's own record
    pub async fn current_user(state: &AppState, user: &AuthUser) -> Result<EmployeeView, ApiError> {
        state
            .store()
            .find_by_id(user.user_id)
            .await
            .map_err(ApiError::from_store)?
            .map(|record| record.to_view())
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::email::{EmailMessage, Mailer};
    use crate::repositories::{InMemoryUserStore, UserStore};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Mailer that remembers what it was asked to send
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: &EmailMessage) -> anyhow::Result<()> {
            anyhow::bail!("smtp relay down")
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.bcrypt_cost = 4;
        config
    }

    fn state_with(mailer: Arc<dyn Mailer>) -> (AppState, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        (AppState::new(store.clone(), mailer, config()), store)
    }

    fn employee(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Jane".to_string()),
            email: Some(email.to_string()),
            password: Some("pw123456".to_string()),
            department: Some("Eng".to_string()),
            role: Some(Role::Employee),
            ..Default::default()
        }
    }

    fn manager(code: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Boss".to_string()),
            email: Some("boss@x.com".to_string()),
            password: Some("pw123456".to_string()),
            admin_code: Some(code.to_string()),
            role: Some(Role::Manager),
            ..Default::default()
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn test_admin_code_comparison() {
        assert!(admin_code_matches("ADMIN123", "ADMIN123"));
        assert!(!admin_code_matches("ADMIN124", "ADMIN123"));
        assert!(!admin_code_matches("", "ADMIN123"));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let (state, store) = state_with(Arc::new(RecordingMailer::default()));
        AuthService::register(&state, employee("jane@x.com")).await.unwrap();

        let user = store.find_by_email("jane@x.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "pw123456");
        assert!(PasswordService::verify("pw123456", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_normalizes_email() {
        let (state, store) = state_with(Arc::new(RecordingMailer::default()));
        AuthService::register(&state, employee("  Jane@X.com ")).await.unwrap();
        assert!(store.email_exists("jane@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_employee_without_department_is_rejected() {
        let (state, _) = state_with(Arc::new(RecordingMailer::default()));
        let mut req = employee("jane@x.com");
        req.department = None;

        let err = AuthService::register(&state, req).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("department")));
    }

    #[tokio::test]
    async fn test_manager_admin_code_gate() {
        let (state, store) = state_with(Arc::new(RecordingMailer::default()));

        let err = AuthService::register(&state, manager("WRONG")).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(store.is_empty().await);

        let mut missing = manager("");
        missing.admin_code = None;
        let err = AuthService::register(&state, missing).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = AuthService::register(&state, manager("   ")).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(store.is_empty().await);

        AuthService::register(&state, manager("ADMIN123")).await.unwrap();
        let boss = store.find_by_email("boss@x.com").await.unwrap().unwrap();
        assert_eq!(boss.role, Role::Manager);
        assert_eq!(boss.department, "");
    }

    #[tokio::test]
    async fn test_admin_code_is_checked_before_field_rules() {
        let (state, _) = state_with(Arc::new(RecordingMailer::default()));

        let mut short_name = manager("WRONG");
        short_name.name = Some("Bo".to_string());
        let err = AuthService::register(&state, short_name).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(msg) if msg == "Invalid admin code."));

        let bare = RegisterRequest {
            role: Some(Role::Manager),
            ..Default::default()
        };
        let err = AuthService::register(&state, bare).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let mut short_name = manager("ADMIN123");
        short_name.name = Some("Bo".to_string());
        let err = AuthService::register(&state, short_name).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let (state, _) = state_with(Arc::new(RecordingMailer::default()));
        AuthService::register(&state, employee("jane@x.com")).await.unwrap();

        let err = AuthService::register(&state, employee("jane@x.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_returns_role_and_valid_token() {
        let (state, _) = state_with(Arc::new(RecordingMailer::default()));
        AuthService::register(&state, manager("ADMIN123")).await.unwrap();

        let outcome = AuthService::login(&state, login("boss@x.com", "pw123456"))
            .await
            .unwrap();
        assert_eq!(outcome.role, Role::Manager);

        let claims = state.jwt().verify(&outcome.token).unwrap();
        assert_eq!(claims.email, "boss@x.com");
        assert_eq!(claims.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (state, _) = state_with(Arc::new(RecordingMailer::default()));
        AuthService::register(&state, employee("jane@x.com")).await.unwrap();

        let wrong_password = AuthService::login(&state, login("jane@x.com", "nope-nope"))
            .await
            .unwrap_err();
        let unknown_email = AuthService::login(&state, login("ghost@x.com", "pw123456"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_mutates_nothing() {
        let mailer = Arc::new(RecordingMailer::default());
        let (state, store) = state_with(mailer.clone());
        AuthService::register(&state, employee("jane@x.com")).await.unwrap();

        AuthService::forgot_password(
            &state,
            ForgotPasswordRequest {
                email: Some("nobody@x.com".to_string()),
            },
        )
        .await
        .unwrap();

        assert!(mailer.sent.lock().unwrap().is_empty());
        let jane = store.find_by_email("jane@x.com").await.unwrap().unwrap();
        assert!(jane.reset_password_token.is_none());
    }

    #[tokio::test]
    async fn test_forgot_password_rejects_bad_email_shape() {
        let (state, _) = state_with(Arc::new(RecordingMailer::default()));
        let err = AuthService::forgot_password(
            &state,
            ForgotPasswordRequest {
                email: Some("not-an-email".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reset_flow_is_single_use() {
        let mailer = Arc::new(RecordingMailer::default());
        let (state, store) = state_with(mailer.clone());
        AuthService::register(&state, employee("jane@x.com")).await.unwrap();

        AuthService::forgot_password(
            &state,
            ForgotPasswordRequest {
                email: Some("jane@x.com".to_string()),
            },
        )
        .await
        .unwrap();

        let link = {
            let sent = mailer.sent.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].to, "jane@x.com");
            sent[0].html_body.clone()
        };
        let stored = store.find_by_email("jane@x.com").await.unwrap().unwrap();
        let stored_hash = stored.reset_password_token.clone().unwrap();
        assert!(!link.contains(&stored_hash));

        let secret = link
            .split("/reset-password/")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap()
            .to_string();
        assert_eq!(hash_secret(&secret), stored_hash);

        let new_password = ResetPasswordRequest {
            password: Some("brand-new".to_string()),
        };
        AuthService::reset_password(&state, &secret, new_password.clone())
            .await
            .unwrap();
        AuthService::login(&state, login("jane@x.com", "brand-new"))
            .await
            .unwrap();

        let err = AuthService::reset_password(&state, &secret, new_password)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_reset_rejects_short_password() {
        let (state, _) = state_with(Arc::new(RecordingMailer::default()));
        let err = AuthService::reset_password(
            &state,
            "whatever",
            ResetPasswordRequest {
                password: Some("123".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, ApiError::Validation(msg) if msg == "Password must be at least 6 characters.")
        );
    }

    #[tokio::test]
    async fn test_unknown_reset_secret_is_rejected_before_hashing() {
        // A cost bcrypt refuses: any attempt to hash would surface as Internal
        let mut config = config();
        config.auth.bcrypt_cost = 3;
        let state = AppState::in_memory(config);

        let err = AuthService::reset_password(
            &state,
            "not-a-real-secret",
            ResetPasswordRequest {
                password: Some("brand-new".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResetToken));
    }

    #[tokio::test]
    async fn test_mail_failure_is_internal() {
        let (state, _) = state_with(Arc::new(FailingMailer));
        AuthService::register(&state, employee("jane@x.com")).await.unwrap();

        let err = AuthService::forgot_password(
            &state,
            ForgotPasswordRequest {
                email: Some("jane@x.com".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
