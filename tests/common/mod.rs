#![allow(dead_code)]

use countersign::api::v1::{AuthHandler, CookieTransport};
use countersign::application_impl::*;
use countersign::application_port::*;
use countersign::domain_model::*;
use countersign::domain_port::*;
use countersign::infra_memory::*;
use std::sync::Arc;
use std::time::Duration;

pub mod store_cases;

pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "Password123";

// Lowest cost bcrypt accepts.
const TEST_BCRYPT_COST: u32 = 4;

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        issuer: "countersign".to_string(),
        audience: "countersign-api".to_string(),
        access: SigningKey::new(b"test-access-secret".to_vec(), Duration::from_secs(15 * 60)),
        refresh: SigningKey::new(
            b"test-refresh-secret".to_vec(),
            Duration::from_secs(30 * 24 * 3600),
        ),
    }
}

/// The coordinator over in-memory adapters, with handles on each adapter so
/// tests can inspect or tamper with state directly.
pub struct Harness {
    pub service: Arc<dyn AuthService>,
    pub users: Arc<MemoryUserRepo>,
    pub store: Arc<MemoryRefreshTokenStore>,
    pub codec: Arc<JwtHs256Codec>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_hasher(Arc::new(BcryptPasswordHasher::new(TEST_BCRYPT_COST))).await
    }

    pub async fn with_hasher(hasher: Arc<dyn CredentialHasher>) -> Self {
        let users = Arc::new(MemoryUserRepo::new());
        let store = Arc::new(MemoryRefreshTokenStore::new());
        let codec = Arc::new(JwtHs256Codec::new(jwt_config()));
        let validator: Arc<dyn CredentialValidator> = Arc::new(
            RealCredentialValidator::try_new(users.clone(), hasher.clone())
                .await
                .unwrap(),
        );

        let service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            users.clone(),
            validator,
            hasher,
            codec.clone(),
            store.clone(),
        ));

        Harness {
            service,
            users,
            store,
            codec,
        }
    }

    /// Stores a user whose password hash was produced outside the service.
    pub async fn seed_user(&self, email: &str, password: &str) -> PublicUser {
        let password_hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
        self.users
            .create(NewUser {
                email: email.to_string(),
                name: Some("A".to_string()),
                password_hash,
            })
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        self.service
            .login(LoginInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
    }

    pub fn handler(&self, production: bool) -> Arc<AuthHandler> {
        let cookies = CookieTransport::new(production, self.codec.as_ref());
        Arc::new(AuthHandler::new(self.service.clone(), cookies))
    }
}
