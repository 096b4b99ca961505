use crate::application_port::AuthError;
use crate::domain_model::PublicUser;

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialValidator: Send + Sync {
    /// `Ok(None)` for an unknown email and for a wrong password alike.
    async fn validate(&self, email: &str, password: &str)
    -> Result<Option<PublicUser>, AuthError>;
}
