use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisWrite, Script, ToRedisArgs};
use std::collections::HashMap;

const CREATE: &str = include_str!("create.lua");
const ROTATE: &str = include_str!("rotate.lua");
const REVOKE: &str = include_str!("revoke.lua");
const REVOKE_ALL: &str = include_str!("revoke_all.lua");

/// How long a record outlives its expiry so late presentations still read
/// back as expired or revoked rather than unknown.
const RETENTION_DAYS: i64 = 7;

/// Records live at `{prefix}:rt:{hash}` as hashes; `{prefix}:user:{id}` is a
/// sorted set of the hashes issued to a user, scored by each record's
/// retention deadline. Writes prune lapsed members and push the index expiry
/// out to its latest deadline. Each mutation is one Lua script, so Redis runs
/// it atomically.
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
    prefix: String,
    create: Script,
    rotate: Script,
    revoke: Script,
    revoke_all: Script,
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

fn store_err(e: redis::RedisError) -> RefreshTokenStoreError {
    RefreshTokenStoreError::Store(e.to_string())
}

impl RedisRefreshTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRefreshTokenStore {
            conn,
            prefix: prefix.into(),
            create: Script::new(CREATE),
            rotate: Script::new(ROTATE),
            revoke: Script::new(REVOKE),
            revoke_all: Script::new(REVOKE_ALL),
        }
    }

    fn record_prefix(&self) -> String {
        format!("{}:rt:", self.prefix)
    }

    fn record_key(&self, hash: &TokenHash) -> String {
        format!("{}{}", self.record_prefix(), hash)
    }

    fn user_key(&self, user_id: UserId) -> String {
        format!("{}:user:{}", self.prefix, user_id)
    }

    fn retain_until(expires_at: DateTime<Utc>) -> i64 {
        (expires_at + Duration::days(RETENTION_DAYS)).timestamp_millis()
    }

    fn parse_record(
        hash: &TokenHash,
        fields: &HashMap<String, String>,
    ) -> Result<RefreshTokenRecord, RefreshTokenStoreError> {
        let field = |name: &str| {
            fields
                .get(name)
                .ok_or_else(|| RefreshTokenStoreError::Store(format!("record missing {name}")))
        };
        let millis = |name: &str| -> Result<DateTime<Utc>, RefreshTokenStoreError> {
            field(name)?
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .ok_or_else(|| RefreshTokenStoreError::Store(format!("bad {name} timestamp")))
        };

        Ok(RefreshTokenRecord {
            token_hash: hash.clone(),
            user_id: field("user_id")?
                .parse()
                .map_err(|e| RefreshTokenStoreError::Store(format!("uuid decode: {e}")))?,
            expires_at: millis("expires_at")?,
            revoked: field("revoked")? == "1",
            created_at: millis("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshTokenStoreError> {
        let hash = TokenHash::digest(token);
        let mut conn = self.conn.clone();
        let created: i64 = self
            .create
            .key(self.record_key(&hash))
            .key(self.user_key(user_id))
            .arg(hash.as_str())
            .arg(user_id)
            .arg(expires_at.timestamp_millis())
            .arg(Utc::now().timestamp_millis())
            .arg(Self::retain_until(expires_at))
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;

        match created {
            1 => Ok(()),
            _ => Err(RefreshTokenStoreError::Conflict),
        }
    }

    async fn find_by_hash(
        &self,
        hash: &TokenHash,
    ) -> Result<Option<RefreshTokenRecord>, RefreshTokenStoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(self.record_key(hash))
            .await
            .map_err(store_err)?;
        if fields.is_empty() {
            return Ok(None);
        }
        Self::parse_record(hash, &fields).map(Some)
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
        let mut conn = self.conn.clone();
        let status: i64 = self
            .rotate
            .key(self.record_key(&old))
            .key(self.record_key(&new))
            .key(self.user_key(user_id))
            .arg(user_id)
            .arg(Utc::now().timestamp_millis())
            .arg(new.as_str())
            .arg(expires_at.timestamp_millis())
            .arg(Self::retain_until(expires_at))
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;

        match status {
            1 => Ok(()),
            -1 => Err(RefreshTokenStoreError::NotFound),
            -2 => Err(RefreshTokenStoreError::Revoked),
            -3 => Err(RefreshTokenStoreError::Expired),
            -4 => Err(RefreshTokenStoreError::Conflict),
            other => Err(RefreshTokenStoreError::Store(format!(
                "unknown rotate script status {other}"
            ))),
        }
    }

    async fn revoke(&self, hash: &TokenHash) -> Result<(), RefreshTokenStoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .revoke
            .key(self.record_key(hash))
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, RefreshTokenStoreError> {
        let mut conn = self.conn.clone();
        let revoked: u64 = self
            .revoke_all
            .key(self.user_key(user_id))
            .arg(self.record_prefix())
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_stored_hash() {
        let user = UserId::new();
        let hash = TokenHash::digest("t0");
        let user_str = user.to_string();
        let record = RedisRefreshTokenStore::parse_record(
            &hash,
            &fields(&[
                ("user_id", user_str.as_str()),
                ("expires_at", "1700000000000"),
                ("revoked", "1"),
                ("created_at", "1690000000000"),
            ]),
        )
        .unwrap();

        assert_eq!(record.user_id, user);
        assert_eq!(record.token_hash, hash);
        assert!(record.revoked);
        assert_eq!(record.expires_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn rejects_incomplete_hash() {
        let hash = TokenHash::digest("t0");
        assert_matches!(
            RedisRefreshTokenStore::parse_record(&hash, &fields(&[("revoked", "0")])),
            Err(RefreshTokenStoreError::Store(_))
        );
    }
}
