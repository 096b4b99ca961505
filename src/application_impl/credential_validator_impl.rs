use crate::application_port::*;
use crate::domain_model::{PublicUser, normalize_email};
use crate::domain_port::UserRepo;
use std::sync::Arc;
use tracing::debug;

const DUMMY_PASSWORD: &str = "countersign-unknown-user";

pub struct RealCredentialValidator {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    // Verified against on the unknown-email path so both paths pay for one hash check.
    dummy_hash: String,
}

impl RealCredentialValidator {
    pub async fn try_new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = credential_hasher.hash_password(DUMMY_PASSWORD).await?;
        Ok(Self {
            user_repo,
            credential_hasher,
            dummy_hash,
        })
    }
}

#[async_trait::async_trait]
impl CredentialValidator for RealCredentialValidator {
    async fn validate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<PublicUser>, AuthError> {
        let email = normalize_email(email);

        let Some(rec) = self.user_repo.find_by_email(&email).await? else {
            let _ = self
                .credential_hasher
                .verify_password(password, &self.dummy_hash)
                .await;
            debug!("credential check for unknown email");
            return Ok(None);
        };

        let ok = self
            .credential_hasher
            .verify_password(password, &rec.password_hash)
            .await?;
        if !ok {
            debug!(user_id = %rec.user.id, "password mismatch");
            return Ok(None);
        }

        Ok(Some(rec.user))
    }
}
