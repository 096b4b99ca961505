use super::duration::parse_duration;
use crate::application_impl::{DEFAULT_BCRYPT_COST, JwtConfig, SigningKey};
use anyhow::{Result, anyhow, bail};
use config::{Config, File};
use serde::Deserialize;
use std::env;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub http: Http,
    pub jwt: Jwt,
    pub log: Log,
    #[serde(default)]
    pub password: Password,
    pub store: Store,
    pub user: User,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub redis: Redis,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub env: String, // "production" tightens cookies
}

impl App {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    /// TLS is enabled only when both paths are set.
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Deserialize)]
pub struct Jwt {
    pub secret: String,
    pub refresh_secret: String,
    pub access_expires_in: String,
    pub refresh_expires_in: String,
    pub issuer: String,
    pub audience: String,
}

impl fmt::Debug for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwt")
            .field("secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_expires_in", &self.access_expires_in)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl Jwt {
    pub fn to_config(&self) -> Result<JwtConfig> {
        if self.secret.is_empty() || self.refresh_secret.is_empty() {
            bail!("jwt secrets must not be empty");
        }
        if self.secret == self.refresh_secret {
            bail!("jwt.secret and jwt.refresh_secret must differ");
        }
        let access_ttl = parse_duration(&self.access_expires_in)
            .map_err(|e| anyhow!("jwt.access_expires_in: {e}"))?;
        let refresh_ttl = parse_duration(&self.refresh_expires_in)
            .map_err(|e| anyhow!("jwt.refresh_expires_in: {e}"))?;

        Ok(JwtConfig {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            access: SigningKey::new(self.secret.as_bytes(), access_ttl),
            refresh: SigningKey::new(self.refresh_secret.as_bytes(), refresh_ttl),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    Bcrypt,
    Argon2,
}

#[derive(Debug, Deserialize)]
pub struct Password {
    pub scheme: PasswordScheme,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    DEFAULT_BCRYPT_COST
}

impl Default for Password {
    fn default() -> Self {
        Password {
            scheme: PasswordScheme::Bcrypt,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mysql,
    Redis,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: StoreBackend,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
}

fn default_redis_prefix() -> String {
    "countersign".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserBackend {
    Memory,
    Mysql,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub backend: UserBackend,
}

#[derive(Deserialize)]
pub struct Database {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for Database {
    fn default() -> Self {
        Database {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Redis {
    pub url: Option<String>,
}

impl Settings {
    pub fn needs_mysql(&self) -> bool {
        self.store.backend == StoreBackend::Mysql || self.user.backend == UserBackend::Mysql
    }

    pub fn needs_redis(&self) -> bool {
        self.store.backend == StoreBackend::Redis
    }

    /// Rejects combinations that would only fail later at first use.
    pub fn validate(&self) -> Result<()> {
        self.jwt.to_config()?;
        if self.needs_mysql() && self.database.url.is_none() {
            bail!("a mysql backend is selected but database.url / DATABASE_URL is unset");
        }
        if self.needs_redis() && self.redis.url.is_none() {
            bail!("store.backend = redis but redis.url / REDIS_URL is unset");
        }
        if !(4..=31).contains(&self.password.bcrypt_cost) {
            bail!("password.bcrypt_cost must be within 4..=31");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment variables that take precedence over the file.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("JWT_SECRET", "jwt.secret"),
    ("JWT_REFRESH_SECRET", "jwt.refresh_secret"),
    ("JWT_ACCESS_EXPIRES_IN", "jwt.access_expires_in"),
    ("JWT_REFRESH_EXPIRES_IN", "jwt.refresh_expires_in"),
    ("JWT_ISSUER", "jwt.issuer"),
    ("JWT_AUDIENCE", "jwt.audience"),
    ("APP_ENV", "app.env"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "redis.url"),
];

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let mut builder = Config::builder().add_source(File::with_name(path));
    for (var, key) in ENV_OVERRIDES {
        builder = builder
            .set_override_option(*key, env::var(var).ok())
            .map_err(|e| anyhow!(e))?;
    }

    let settings: Settings = builder
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}
