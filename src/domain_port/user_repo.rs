use crate::application_port::*;
use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct UserCredentialsRecord {
    pub user: PublicUser,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fetch credentials by normalized email (for login).
    async fn find_by_email(&self, email: &str)
    -> Result<Option<UserCredentialsRecord>, AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<PublicUser>, AuthError>;

    /// Fails with [`AuthError::UserExists`] when the email is taken.
    async fn create(&self, user: NewUser) -> Result<PublicUser, AuthError>;

    /// `Ok(false)` when no such user exists.
    async fn delete(&self, user_id: UserId) -> Result<bool, AuthError>;
}
