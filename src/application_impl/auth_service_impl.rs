use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MIN_PASSWORD_LEN: usize = 8;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_validator: Arc<dyn CredentialValidator>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    refresh_store: Arc<dyn RefreshTokenStore>,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_validator: Arc<dyn CredentialValidator>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        refresh_store: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            user_repo,
            credential_validator,
            credential_hasher,
            token_codec,
            refresh_store,
            min_password_len: MIN_PASSWORD_LEN,
        }
    }

    fn validate_registration(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::Validation("email is not valid".to_string()));
        }
        if password.chars().count() < self.min_password_len {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters long",
                self.min_password_len
            )));
        }
        let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_lower && has_upper && has_digit) {
            return Err(AuthError::Validation(
                "password must contain an uppercase letter, a lowercase letter and a number"
                    .to_string(),
            ));
        }
        Ok(())
    }

    fn issue_pair(&self, user: PublicUser) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.token_codec.issue_access_token(user.id)?;
        let (refresh_token, refresh_exp) = self.token_codec.issue_refresh_token(user.id)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_token_expires_at: refresh_exp,
            user,
        })
    }

    /// Every token failure leaves here as the same `Unauthorized`; only the log
    /// keeps the reason.
    fn unauthorized(cause: impl fmt::Display) -> AuthError {
        debug!(%cause, "refresh token rejected");
        AuthError::Unauthorized
    }

    fn from_store(err: RefreshTokenStoreError) -> AuthError {
        match err {
            RefreshTokenStoreError::NotFound
            | RefreshTokenStoreError::Revoked
            | RefreshTokenStoreError::Expired => Self::unauthorized(err),
            RefreshTokenStoreError::Conflict => {
                warn!("refresh token hash collision");
                AuthError::InternalError(err.to_string())
            }
            RefreshTokenStoreError::Store(e) => AuthError::Store(e),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(&self, request: RegisterInput) -> Result<PublicUser, AuthError> {
        let RegisterInput {
            email,
            name,
            password,
        } = request;
        let email = normalize_email(&email);

        self.validate_registration(&email, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let user = self
            .user_repo
            .create(NewUser {
                email,
                name,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    async fn login(&self, request: LoginInput) -> Result<TokenPair, AuthError> {
        let LoginInput { email, password } = request;

        let user = self
            .credential_validator
            .validate(&email, &password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let pair = self.issue_pair(user)?;
        self.refresh_store
            .create(
                pair.user.id,
                &pair.refresh_token.0,
                pair.refresh_token_expires_at,
            )
            .await
            .map_err(Self::from_store)?;

        info!(user_id = %pair.user.id, "login succeeded");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        if refresh_token.is_empty() {
            return Err(Self::unauthorized("no refresh token presented"));
        }

        let claims = self
            .token_codec
            .verify_refresh_token(refresh_token)
            .map_err(Self::unauthorized)?;

        let record = self
            .refresh_store
            .validate(&TokenHash::digest(refresh_token))
            .await
            .map_err(Self::from_store)?;
        if record.user_id != claims.user_id {
            return Err(Self::unauthorized("token subject does not own the record"));
        }

        let user = self
            .user_repo
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| Self::unauthorized("user not found for refresh token"))?;

        let pair = self.issue_pair(user)?;

        // Loses cleanly against a concurrent rotation of the same token.
        self.refresh_store
            .rotate(
                refresh_token,
                pair.user.id,
                &pair.refresh_token.0,
                pair.refresh_token_expires_at,
            )
            .await
            .map_err(Self::from_store)?;

        info!(user_id = %pair.user.id, "refresh token rotated");
        Ok(pair)
    }

    async fn logout(&self, refresh_token: Option<&str>) -> Result<LogoutOutcome, AuthError> {
        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            self.refresh_store
                .revoke_by_token(token)
                .await
                .map_err(Self::from_store)?;
            debug!("refresh token revoked on logout");
        }
        Ok(LogoutOutcome::default())
    }

    async fn revoke_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        let revoked = self
            .refresh_store
            .revoke_all_for_user(user_id)
            .await
            .map_err(Self::from_store)?;
        info!(%user_id, revoked, "revoked all refresh tokens");
        Ok(revoked)
    }

    async fn authenticate_access(&self, access_token: &str) -> Result<PublicUser, AuthError> {
        let claims = self
            .token_codec
            .verify_access_token(access_token)
            .map_err(|e| {
                debug!(cause = %e, "access token rejected");
                AuthError::Unauthorized
            })?;

        self.user_repo
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %claims.user_id, "access token for unknown user");
                AuthError::Unauthorized
            })
    }

    async fn delete_account(&self, user_id: UserId) -> Result<(), AuthError> {
        let revoked = self.revoke_all(user_id).await?;
        if !self.user_repo.delete(user_id).await? {
            debug!(%user_id, "account already gone");
        }
        info!(%user_id, revoked, "account deleted");
        Ok(())
    }
}
