//! Authentication module
//!
//! Provides JWT session tokens, bcrypt password hashing, password-reset
//! secrets, and the request authorizer.

mod jwt;
mod middleware;
mod password;
mod reset;

pub use jwt::{Claims, JwtService, TokenIdentity};
pub use middleware::{authenticate, extract_token, require_auth, AuthUser, ManagerUser};
pub use password::PasswordService;
pub use reset::{hash_secret, is_active, IssuedReset, ResetTokenManager};
