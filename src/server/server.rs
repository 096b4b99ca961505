use crate::api::v1::{AuthHandler, CookieTransport};
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::*;
use anyhow::anyhow;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;

/// Every port wired to the adapter chosen in settings.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub auth_handler: Arc<AuthHandler>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let pool = match (settings.needs_mysql(), settings.database.url.as_deref()) {
            (false, _) => None,
            (true, Some(url)) => Some(
                MySqlPoolOptions::new()
                    .max_connections(settings.database.max_connections)
                    .connect(url)
                    .await?,
            ),
            (true, None) => return Err(anyhow!("database.url is required for mysql backends")),
        };
        let mysql_pool = || {
            pool.clone()
                .ok_or_else(|| anyhow!("mysql pool was not initialised"))
        };

        let user_repo: Arc<dyn UserRepo> = match settings.user.backend {
            UserBackend::Memory => Arc::new(MemoryUserRepo::new()),
            UserBackend::Mysql => Arc::new(MySqlUserRepo::new(mysql_pool()?)),
        };

        let refresh_store: Arc<dyn RefreshTokenStore> = match settings.store.backend {
            StoreBackend::Memory => Arc::new(MemoryRefreshTokenStore::new()),
            StoreBackend::Mysql => Arc::new(MySqlRefreshTokenStore::new(mysql_pool()?)),
            StoreBackend::Redis => {
                let url = settings
                    .redis
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow!("redis.url is required for the redis store"))?;
                let redis_manager = redis::Client::open(url)?
                    .get_connection_manager()
                    .await?;
                Arc::new(RedisRefreshTokenStore::new(
                    redis_manager,
                    settings.store.redis_prefix.clone(),
                ))
            }
        };

        let credential_hasher: Arc<dyn CredentialHasher> = match settings.password.scheme {
            PasswordScheme::Bcrypt => {
                Arc::new(BcryptPasswordHasher::new(settings.password.bcrypt_cost))
            }
            PasswordScheme::Argon2 => Arc::new(Argon2PasswordHasher),
        };
        let credential_validator: Arc<dyn CredentialValidator> = Arc::new(
            RealCredentialValidator::try_new(user_repo.clone(), credential_hasher.clone()).await?,
        );

        let token_codec: Arc<dyn TokenCodec> =
            Arc::new(JwtHs256Codec::new(settings.jwt.to_config()?));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo,
            credential_validator,
            credential_hasher,
            token_codec.clone(),
            refresh_store,
        ));

        let cookies = CookieTransport::new(settings.app.is_production(), token_codec.as_ref());
        let auth_handler = Arc::new(AuthHandler::new(auth_service.clone(), cookies));

        info!(
            store = ?settings.store.backend,
            user = ?settings.user.backend,
            production = settings.app.is_production(),
            "server started"
        );

        Ok(Self {
            auth_service,
            auth_handler,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
