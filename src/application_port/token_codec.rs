use crate::application_port::AuthError;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone)]
pub struct TokenVerifyResult {
    pub user_id: UserId,
}

/// Signs and verifies self-contained bearer tokens. Signing is pure; any
/// verification failure is reported as [`AuthError::TokenInvalid`].
pub trait TokenCodec: Send + Sync {
    fn issue_access_token(&self, user: UserId) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    fn issue_refresh_token(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;
    fn verify_access_token(&self, token: &str) -> Result<TokenVerifyResult, AuthError>;
    fn verify_refresh_token(&self, token: &str) -> Result<TokenVerifyResult, AuthError>;
    fn lifetime(&self, kind: TokenKind) -> Duration;
}
