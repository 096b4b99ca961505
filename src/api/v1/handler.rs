use super::context::*;
use super::cookie::CookieTransport;
use super::error::ApiErrorCode;
use super::strategy::*;
use crate::application_port::*;
use crate::domain_model::PublicUser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use warp::http::StatusCode;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: AccessToken,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub message: String,
    pub revoked: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub password: String,
}

/// Request-level auth flows. Every method takes plain values and returns an
/// [`ApiReply`]; the router is the only place that knows about warp filters.
pub struct AuthHandler {
    auth_service: Arc<dyn AuthService>,
    cookies: CookieTransport,
    local: LocalStrategy,
    bearer: BearerStrategy,
    refresh_cookie: RefreshCookieStrategy,
}

impl AuthHandler {
    pub fn new(auth_service: Arc<dyn AuthService>, cookies: CookieTransport) -> Self {
        AuthHandler {
            local: LocalStrategy::new(auth_service.clone()),
            bearer: BearerStrategy::new(auth_service.clone(), cookies.clone()),
            refresh_cookie: RefreshCookieStrategy::new(cookies.clone()),
            auth_service,
            cookies,
        }
    }

    fn session_reply(&self, pair: TokenPair) -> Result<ApiReply, ApiErrorCode> {
        let set_access = self.cookies.emit(TokenKind::Access, &pair.access_token.0);
        let set_refresh = self.cookies.emit(TokenKind::Refresh, &pair.refresh_token.0);
        let body = SessionResponse {
            access_token: pair.access_token,
            user: pair.user,
        };
        Ok(ApiReply::json(StatusCode::OK, &body)?
            .with_cookie(set_access)
            .with_cookie(set_refresh))
    }

    pub async fn login(&self, body: LoginRequest) -> Result<ApiReply, ApiErrorCode> {
        let pair = self.local.authenticate(&body).await?;
        self.session_reply(pair)
    }

    pub async fn refresh(&self, ctx: RequestContext) -> Result<ApiReply, ApiErrorCode> {
        let token = self.refresh_cookie.authenticate(&ctx).await?;
        let pair = self.auth_service.refresh(&token).await?;
        self.session_reply(pair)
    }

    pub async fn logout(&self, ctx: RequestContext) -> Result<ApiReply, ApiErrorCode> {
        let user = self.bearer.authenticate(&ctx).await?;
        let outcome = self
            .auth_service
            .logout(self.cookies.extract(&ctx, TokenKind::Refresh))
            .await?;

        info!(user_id = %user.id, "logged out");
        Ok(ApiReply::json(
            StatusCode::OK,
            &MessageResponse {
                message: outcome.message,
            },
        )?
        .with_cookies(self.cookies.clear_all()))
    }

    pub async fn logout_all(&self, ctx: RequestContext) -> Result<ApiReply, ApiErrorCode> {
        let user = self.bearer.authenticate(&ctx).await?;
        let revoked = self.auth_service.revoke_all(user.id).await?;

        Ok(ApiReply::json(
            StatusCode::OK,
            &LogoutAllResponse {
                message: "Successfully logged out from all sessions".to_string(),
                revoked,
            },
        )?
        .with_cookies(self.cookies.clear_all()))
    }

    pub async fn register(&self, body: RegisterRequest) -> Result<ApiReply, ApiErrorCode> {
        let user = self
            .auth_service
            .register(RegisterInput {
                email: body.email,
                name: body.name,
                password: body.password,
            })
            .await?;
        ApiReply::json(StatusCode::CREATED, &user)
    }

    pub async fn me(&self, ctx: RequestContext) -> Result<ApiReply, ApiErrorCode> {
        let user = self.bearer.authenticate(&ctx).await?;
        ApiReply::json(StatusCode::OK, &user)
    }

    pub async fn delete_me(&self, ctx: RequestContext) -> Result<ApiReply, ApiErrorCode> {
        let user = self.bearer.authenticate(&ctx).await?;
        self.auth_service.delete_account(user.id).await?;
        Ok(ApiReply::no_content().with_cookies(self.cookies.clear_all()))
    }
}
