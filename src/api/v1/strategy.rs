use super::context::RequestContext;
use super::cookie::CookieTransport;
use super::error::ApiErrorCode;
use crate::application_port::*;
use crate::domain_model::PublicUser;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// One way of proving who the caller is. Each route names the strategy it
/// trusts; nothing falls through from one to another.
#[async_trait::async_trait]
pub trait AuthenticationStrategy: Send + Sync {
    type Input: Sync + ?Sized;
    type Output;

    async fn authenticate(&self, input: &Self::Input) -> Result<Self::Output, ApiErrorCode>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Email and password from a JSON body. Succeeds with a freshly issued pair.
pub struct LocalStrategy {
    auth_service: Arc<dyn AuthService>,
}

impl LocalStrategy {
    pub fn new(auth_service: Arc<dyn AuthService>) -> Self {
        LocalStrategy { auth_service }
    }
}

#[async_trait::async_trait]
impl AuthenticationStrategy for LocalStrategy {
    type Input = LoginRequest;
    type Output = TokenPair;

    async fn authenticate(&self, input: &LoginRequest) -> Result<TokenPair, ApiErrorCode> {
        let pair = self
            .auth_service
            .login(LoginInput {
                email: input.email.clone(),
                password: input.password.clone(),
            })
            .await?;
        Ok(pair)
    }
}

/// Access token from the `accessToken` cookie or an `Authorization: Bearer` header.
pub struct BearerStrategy {
    auth_service: Arc<dyn AuthService>,
    cookies: CookieTransport,
}

impl BearerStrategy {
    pub fn new(auth_service: Arc<dyn AuthService>, cookies: CookieTransport) -> Self {
        BearerStrategy {
            auth_service,
            cookies,
        }
    }
}

#[async_trait::async_trait]
impl AuthenticationStrategy for BearerStrategy {
    type Input = RequestContext;
    type Output = PublicUser;

    async fn authenticate(&self, ctx: &RequestContext) -> Result<PublicUser, ApiErrorCode> {
        let Some(token) = self.cookies.extract(ctx, TokenKind::Access) else {
            debug!("no access token presented");
            return Err(ApiErrorCode::Unauthorized);
        };
        let user = self.auth_service.authenticate_access(token).await?;
        Ok(user)
    }
}

/// Refresh token from the `refreshToken` cookie only. Yields the raw token;
/// validating it is the coordinator's job during rotation.
pub struct RefreshCookieStrategy {
    cookies: CookieTransport,
}

impl RefreshCookieStrategy {
    pub fn new(cookies: CookieTransport) -> Self {
        RefreshCookieStrategy { cookies }
    }
}

#[async_trait::async_trait]
impl AuthenticationStrategy for RefreshCookieStrategy {
    type Input = RequestContext;
    type Output = String;

    async fn authenticate(&self, ctx: &RequestContext) -> Result<String, ApiErrorCode> {
        self.cookies
            .extract(ctx, TokenKind::Refresh)
            .map(str::to_string)
            .ok_or_else(|| {
                debug!("no refresh cookie presented");
                ApiErrorCode::Unauthorized
            })
    }
}
