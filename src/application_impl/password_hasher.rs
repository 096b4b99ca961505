use crate::application_port::{AuthError, CredentialHasher};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tokio::task;

pub const DEFAULT_BCRYPT_COST: u32 = 10;

fn join_error(e: task::JoinError) -> AuthError {
    AuthError::InternalError(format!("hashing task failed: {e}"))
}

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::InternalError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        verify_stored(password, password_hash).await
    }
}

pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        BcryptPasswordHasher { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        BcryptPasswordHasher::new(DEFAULT_BCRYPT_COST)
    }
}

#[async_trait::async_trait]
impl CredentialHasher for BcryptPasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.cost;
        task::spawn_blocking(move || {
            bcrypt::hash(password, cost).map_err(|e| AuthError::InternalError(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        verify_stored(password, password_hash).await
    }
}

/// Scheme of a stored hash, read from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoredScheme {
    Argon2,
    Bcrypt,
}

impl StoredScheme {
    fn detect(password_hash: &str) -> Option<Self> {
        if password_hash.starts_with("$argon2") {
            Some(StoredScheme::Argon2)
        } else if ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|p| password_hash.starts_with(p))
        {
            Some(StoredScheme::Bcrypt)
        } else {
            None
        }
    }
}

// Hashes written under either scheme keep verifying after `password.scheme` changes.
async fn verify_stored(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let scheme = StoredScheme::detect(password_hash)
        .ok_or_else(|| AuthError::InternalError("unrecognised password hash".to_string()))?;
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    task::spawn_blocking(move || match scheme {
        StoredScheme::Argon2 => {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;
            match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                Ok(_) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
            }
        }
        StoredScheme::Bcrypt => bcrypt::verify(password, &password_hash)
            .map_err(|e| AuthError::InternalError(format!("verify error: {e}"))),
    })
    .await
    .map_err(join_error)?
}
