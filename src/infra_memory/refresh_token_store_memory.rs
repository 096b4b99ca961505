use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Every operation runs inside one critical section, which is what makes
/// `rotate` atomic here.
#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    records: Mutex<HashMap<TokenHash, RefreshTokenRecord>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<TokenHash, RefreshTokenRecord>>, RefreshTokenStoreError> {
        self.records
            .lock()
            .map_err(|_| RefreshTokenStoreError::Store("refresh token map poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshTokenStoreError> {
        let hash = TokenHash::digest(token);
        let mut records = self.lock()?;
        if records.contains_key(&hash) {
            return Err(RefreshTokenStoreError::Conflict);
        }
        records.insert(hash.clone(), RefreshTokenRecord::new(hash, user_id, expires_at));
        Ok(())
    }

    async fn find_by_hash(
        &self,
        hash: &TokenHash,
    ) -> Result<Option<RefreshTokenRecord>, RefreshTokenStoreError> {
        Ok(self.lock()?.get(hash).cloned())
    }

    async fn rotate(
        &self,
        old_token: &str,
        user_id: UserId,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshTokenStoreError> {
        let old_hash = TokenHash::digest(old_token);
        let new_hash = TokenHash::digest(new_token);
        let now = Utc::now();
        let mut records = self.lock()?;

        if records.contains_key(&new_hash) {
            return Err(RefreshTokenStoreError::Conflict);
        }
        match records.get_mut(&old_hash) {
            Some(old) if old.user_id == user_id && old.status_at(now) == TokenStatus::Active => {
                old.revoked = true;
            }
            other => {
                return Err(RefreshTokenStoreError::rejection(
                    other.map(|r| &*r),
                    user_id,
                    now,
                ));
            }
        }
        records.insert(
            new_hash.clone(),
            RefreshTokenRecord::new(new_hash, user_id, expires_at),
        );
        Ok(())
    }

    async fn revoke(&self, hash: &TokenHash) -> Result<(), RefreshTokenStoreError> {
        if let Some(record) = self.lock()?.get_mut(hash) {
            record.revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError> {
        let mut revoked = 0;
        for record in self.lock()?.values_mut() {
            if record.user_id == user_id && !record.revoked {
                record.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}
