use crate::application_port::{AccessToken, RefreshToken};
use crate::domain_model::{PublicUser, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Umbrella for every token failure: bad signature, expiry, revocation,
    /// unknown record, vanished user.
    #[error("unauthorized")]
    Unauthorized,
    #[error("token invalid")]
    TokenInvalid,
    #[error("user already exists")]
    UserExists,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

/// Freshly minted credentials. Never persisted as-is.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub message: String,
}

impl Default for LogoutOutcome {
    fn default() -> Self {
        LogoutOutcome {
            message: "Successfully logged out".to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<PublicUser, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<TokenPair, AuthError>;
    /// Exchanges a refresh token for a new pair; the presented token is
    /// revoked in the same atomic step that stores its successor.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    /// Idempotent: unknown, already revoked or absent tokens all succeed.
    async fn logout(&self, refresh_token: Option<&str>) -> Result<LogoutOutcome, AuthError>;
    async fn revoke_all(&self, user_id: UserId) -> Result<u64, AuthError>;
    async fn authenticate_access(&self, access_token: &str) -> Result<PublicUser, AuthError>;
    /// Revokes every refresh token of the user, then removes the account.
    async fn delete_account(&self, user_id: UserId) -> Result<(), AuthError>;
}
