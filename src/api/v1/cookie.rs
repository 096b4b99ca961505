use super::context::RequestContext;
use crate::application_port::{TokenCodec, TokenKind};
use std::time::Duration;

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Moves tokens between responses and requests as cookies.
///
/// Both cookies are `HttpOnly` with `Path=/`. In production they are also
/// `Secure` with `SameSite=Strict`; elsewhere `SameSite=Lax`. `Max-Age`
/// follows the codec lifetime of the token kind.
#[derive(Debug, Clone)]
pub struct CookieTransport {
    production: bool,
    access_max_age: Duration,
    refresh_max_age: Duration,
}

impl CookieTransport {
    pub fn new(production: bool, codec: &dyn TokenCodec) -> Self {
        CookieTransport {
            production,
            access_max_age: codec.lifetime(TokenKind::Access),
            refresh_max_age: codec.lifetime(TokenKind::Refresh),
        }
    }

    pub fn name(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::Access => ACCESS_COOKIE_NAME,
            TokenKind::Refresh => REFRESH_COOKIE_NAME,
        }
    }

    fn max_age(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_max_age,
            TokenKind::Refresh => self.refresh_max_age,
        }
    }

    fn build(&self, kind: TokenKind, value: &str, max_age_secs: u64) -> String {
        let name = Self::name(kind);
        let same_site = if self.production { "Strict" } else { "Lax" };
        let mut cookie = format!(
            "{name}={value}; Path=/; HttpOnly; SameSite={same_site}; Max-Age={max_age_secs}"
        );
        if self.production {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn emit(&self, kind: TokenKind, token: &str) -> String {
        self.build(kind, token, self.max_age(kind).as_secs())
    }

    pub fn clear(&self, kind: TokenKind) -> String {
        self.build(kind, "", 0)
    }

    pub fn clear_all(&self) -> Vec<String> {
        vec![self.clear(TokenKind::Access), self.clear(TokenKind::Refresh)]
    }

    /// Access tokens fall back to `Authorization: Bearer`; refresh tokens are
    /// only ever read from their cookie.
    pub fn extract<'a>(&self, ctx: &'a RequestContext, kind: TokenKind) -> Option<&'a str> {
        let cookie = ctx.cookie(Self::name(kind));
        match kind {
            TokenKind::Access => cookie.or_else(|| ctx.bearer()),
            TokenKind::Refresh => cookie,
        }
    }
}
