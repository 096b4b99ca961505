use super::repo_tx_mysql::MySqlTxManager;
use super::util::{downcast, is_dup_key};
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::warn;

pub struct MySqlRefreshTokenStore {
    pool: MySqlPool,
    tx_manager: MySqlTxManager,
}

fn store_err(context: &str) -> impl FnOnce(sqlx::Error) -> RefreshTokenStoreError + '_ {
    move |e| RefreshTokenStoreError::Store(format!("{context}: {e}"))
}

impl MySqlRefreshTokenStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlRefreshTokenStore {
            tx_manager: MySqlTxManager::new(pool.clone()),
            pool,
        }
    }

    fn row_to_record(row: &MySqlRow) -> Result<RefreshTokenRecord, RefreshTokenStoreError> {
        Ok(RefreshTokenRecord {
            token_hash: TokenHash(row.try_get("token_hash").map_err(store_err("token_hash"))?),
            user_id: row.try_get("user_id").map_err(store_err("uuid decode"))?,
            expires_at: row.try_get("expires_at").map_err(store_err("expires_at"))?,
            revoked: row.try_get("revoked").map_err(store_err("revoked"))?,
            created_at: row.try_get("created_at").map_err(store_err("created_at"))?,
        })
    }

    /// Revokes `old` and inserts `new` inside one transaction. `Ok(false)`
    /// means the conditional revoke matched nothing and nothing was written.
    async fn rotate_in_tx(
        &self,
        old: &TokenHash,
        user_id: UserId,
        new: &TokenHash,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, RefreshTokenStoreError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RefreshTokenStoreError::Store(format!("begin: {e}")))?;
        let conn = downcast(tx.as_mut())
            .map_err(|e| RefreshTokenStoreError::Store(e.to_string()))?
            .conn();

        let revoked = sqlx::query(
            r#"
UPDATE refresh_token
SET revoked = 1
WHERE token_hash = ? AND user_id = ? AND revoked = 0 AND expires_at >= ?
"#,
        )
        .bind(old.as_str())
        .bind(user_id)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(store_err("revoke old refresh token"))?;

        if revoked.rows_affected() != 1 {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "rollback after lost rotation failed");
            }
            return Ok(false);
        }

        let inserted = sqlx::query(
            r#"
INSERT INTO refresh_token (token_hash, user_id, expires_at, revoked, created_at)
VALUES (?, ?, ?, 0, ?)
"#,
        )
        .bind(new.as_str())
        .bind(user_id)
        .bind(expires_at)
        .bind(now)
        .execute(&mut *conn)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_dup_key(&e) => {
                if let Err(e) = tx.rollback().await {
                    warn!(error = %e, "rollback after duplicate successor failed");
                }
                return Err(RefreshTokenStoreError::Conflict);
            }
            // Dropping `tx` rolls back the revoke above.
            Err(e) => return Err(store_err("insert rotated refresh token")(e)),
        }

        tx.commit()
            .await
            .map_err(|e| RefreshTokenStoreError::Store(format!("commit: {e}")))?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshTokenStoreError> {
        let res = sqlx::query(
            r#"
INSERT INTO refresh_token (token_hash, user_id, expires_at, revoked, created_at)
VALUES (?, ?, ?, 0, ?)
"#,
        )
        .bind(TokenHash::digest(token).as_str())
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_dup_key(&e) => Err(RefreshTokenStoreError::Conflict),
            Err(e) => Err(store_err("insert refresh token")(e)),
        }
    }

    async fn find_by_hash(
        &self,
        hash: &TokenHash,
    ) -> Result<Option<RefreshTokenRecord>, RefreshTokenStoreError> {
        sqlx::query(
            r#"
SELECT token_hash, user_id, expires_at, revoked, created_at
FROM refresh_token
WHERE token_hash = ?
"#,
        )
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("query refresh token"))?
        .map(|row| Self::row_to_record(&row))
        .transpose()
    }

    async fn rotate(
        &self,
        old_token: &str,
        user_id: UserId,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshTokenStoreError> {
        let old = TokenHash::digest(old_token);
        let new = TokenHash::digest(new_token);
        let now = Utc::now();

        if self.rotate_in_tx(&old, user_id, &new, expires_at, now).await? {
            return Ok(());
        }
        let current = self.find_by_hash(&old).await?;
        Err(RefreshTokenStoreError::rejection(
            current.as_ref(),
            user_id,
            now,
        ))
    }

    async fn revoke(&self, hash: &TokenHash) -> Result<(), RefreshTokenStoreError> {
        sqlx::query("UPDATE refresh_token SET revoked = 1 WHERE token_hash = ?")
            .bind(hash.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_err("revoke refresh token"))?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError> {
        let res = sqlx::query("UPDATE refresh_token SET revoked = 1 WHERE user_id = ? AND revoked = 0")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(store_err("revoke refresh tokens for user"))?;
        Ok(res.rows_affected())
    }
}
