use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenStoreError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error("refresh token has expired")]
    Expired,
    #[error("refresh token hash already stored")]
    Conflict,
    #[error("infra error: {0}")]
    Store(String),
}

impl RefreshTokenStoreError {
    /// Explains why a conditional revoke of `record` on behalf of `user_id`
    /// did not apply.
    pub fn rejection(
        record: Option<&RefreshTokenRecord>,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        match record {
            None => RefreshTokenStoreError::NotFound,
            Some(r) if r.user_id != user_id => RefreshTokenStoreError::NotFound,
            Some(r) => match r.status_at(now) {
                TokenStatus::Revoked => RefreshTokenStoreError::Revoked,
                TokenStatus::Expired => RefreshTokenStoreError::Expired,
                // Lost a race and the record has since been read back active:
                // treat as revoked, the winner owns the chain now.
                TokenStatus::Active => RefreshTokenStoreError::Revoked,
            },
        }
    }
}

#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Inserts a record keyed by the digest of `token`.
    async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshTokenStoreError>;

    async fn find_by_hash(
        &self,
        hash: &TokenHash,
    ) -> Result<Option<RefreshTokenRecord>, RefreshTokenStoreError>;

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, RefreshTokenStoreError> {
        self.find_by_hash(&TokenHash::digest(token)).await
    }

    /// Fails with `NotFound`, `Revoked` or `Expired`; returns the live record otherwise.
    async fn validate(
        &self,
        hash: &TokenHash,
    ) -> Result<RefreshTokenRecord, RefreshTokenStoreError> {
        let record = self
            .find_by_hash(hash)
            .await?
            .ok_or(RefreshTokenStoreError::NotFound)?;
        match record.status_at(Utc::now()) {
            TokenStatus::Active => Ok(record),
            TokenStatus::Revoked => Err(RefreshTokenStoreError::Revoked),
            TokenStatus::Expired => Err(RefreshTokenStoreError::Expired),
        }
    }

    /// Revokes the record of `old_token` and inserts one for `new_token` as a
    /// single all-or-nothing step. Only an active record owned by `user_id`
    /// can be rotated, so of several concurrent rotations of the same token at
    /// most one succeeds.
    async fn rotate(
        &self,
        old_token: &str,
        user_id: UserId,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshTokenStoreError>;

    /// Idempotent; unknown hashes are ignored.
    async fn revoke(&self, hash: &TokenHash) -> Result<(), RefreshTokenStoreError>;

    async fn revoke_by_token(&self, token: &str) -> Result<(), RefreshTokenStoreError> {
        self.revoke(&TokenHash::digest(token)).await
    }

    /// Returns how many active records were flipped.
    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError>;
}
