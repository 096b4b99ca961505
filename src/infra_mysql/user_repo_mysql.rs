use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_user(row: &MySqlRow) -> Result<PublicUser, AuthError> {
        let id: UserId = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(format!("uuid decode: {e}")))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let name: Option<String> = row
            .try_get("name")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(PublicUser {
            id,
            email,
            name,
            created_at,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialsRecord>, AuthError> {
        let row = sqlx::query(
            r#"
SELECT user_id, email, name, password_hash, created_at, updated_at
FROM user
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(format!("query user by email: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(Some(UserCredentialsRecord {
            user: Self::row_to_user(&row)?,
            password_hash,
        }))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<PublicUser>, AuthError> {
        sqlx::query(
            r#"
SELECT user_id, email, name, created_at, updated_at
FROM user
WHERE user_id = ?
"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(format!("query user by id: {e}")))?
        .map(|row| Self::row_to_user(&row))
        .transpose()
    }

    async fn create(&self, user: NewUser) -> Result<PublicUser, AuthError> {
        let now = Utc::now();
        let created = PublicUser {
            id: UserId::new(),
            email: user.email,
            name: user.name,
            created_at: now,
            updated_at: now,
        };

        let res = sqlx::query(
            r#"
INSERT INTO user (user_id, email, name, password_hash, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(created.id)
        .bind(&created.email)
        .bind(&created.name)
        .bind(&user.password_hash)
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(created),
            Err(e) if is_dup_key(&e) => Err(AuthError::UserExists),
            Err(e) => Err(AuthError::Store(format!("insert user: {e}"))),
        }
    }

    async fn delete(&self, user_id: UserId) -> Result<bool, AuthError> {
        let res = sqlx::query("DELETE FROM user WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("delete user: {e}")))?;
        Ok(res.rows_affected() == 1)
    }
}
