use super::error::ApiErrorCode;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;
use warp::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use warp::http::{HeaderMap, HeaderValue, StatusCode};

/// The parts of an inbound request the auth handlers look at. Built once by
/// the router so handlers never touch warp types.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub cookies: HashMap<String, String>,
    pub authorization: Option<String>,
}

impl RequestContext {
    pub fn from_headers(cookie: Option<&str>, authorization: Option<&str>) -> Self {
        let cookies = cookie
            .into_iter()
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect();

        RequestContext {
            cookies,
            authorization: authorization.map(str::to_string),
        }
    }

    /// Repeated `Cookie` headers are joined. Bytes outside visible ASCII
    /// never fail the request: cookie text is decoded lossily so a foreign
    /// cookie cannot hide ours, and an unreadable `Authorization` is absent.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let cookie = headers
            .get_all(COOKIE)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join("; ");
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        RequestContext::from_headers(
            (!cookie.is_empty()).then_some(cookie.as_str()),
            authorization,
        )
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {token}"));
        self
    }

    /// Empty values count as absent.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn bearer(&self) -> Option<&str> {
        let trimmed = self.authorization.as_deref()?.trim();
        let token = trimmed
            .strip_prefix("Bearer ")
            .or_else(|| trimmed.strip_prefix("bearer "))?
            .trim();
        (!token.is_empty()).then_some(token)
    }
}

/// A JSON response plus the `Set-Cookie` lines to send with it.
#[derive(Debug, Clone)]
pub struct ApiReply {
    status: StatusCode,
    body: Option<serde_json::Value>,
    set_cookies: Vec<String>,
}

impl ApiReply {
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, ApiErrorCode> {
        Ok(ApiReply {
            status,
            body: Some(serde_json::to_value(body).map_err(ApiErrorCode::internal)?),
            set_cookies: Vec::new(),
        })
    }

    pub fn no_content() -> Self {
        ApiReply {
            status: StatusCode::NO_CONTENT,
            body: None,
            set_cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.set_cookies.push(cookie);
        self
    }

    pub fn with_cookies(mut self, cookies: impl IntoIterator<Item = String>) -> Self {
        self.set_cookies.extend(cookies);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn set_cookies(&self) -> &[String] {
        &self.set_cookies
    }
}

impl warp::Reply for ApiReply {
    fn into_response(self) -> warp::reply::Response {
        let mut response = match &self.body {
            Some(body) => {
                warp::reply::with_status(warp::reply::json(body), self.status).into_response()
            }
            None => warp::reply::with_status(warp::reply(), self.status).into_response(),
        };
        for cookie in self.set_cookies {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => warn!(error = %e, "dropping unencodable cookie"),
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookie_header() {
        let ctx = RequestContext::from_headers(
            Some("accessToken=a.b.c; refreshToken=d.e.f;theme=dark; junk; empty="),
            None,
        );
        assert_eq!(ctx.cookie("accessToken"), Some("a.b.c"));
        assert_eq!(ctx.cookie("refreshToken"), Some("d.e.f"));
        assert_eq!(ctx.cookie("theme"), Some("dark"));
        assert_eq!(ctx.cookie("junk"), None);
        assert_eq!(ctx.cookie("empty"), None);
    }

    #[test]
    fn reads_bearer_scheme_only() {
        let bearer = RequestContext::from_headers(None, Some("Bearer tok"));
        assert_eq!(bearer.bearer(), Some("tok"));

        let basic = RequestContext::from_headers(None, Some("Basic dXNlcjpwYXNz"));
        assert_eq!(basic.bearer(), None);

        let blank = RequestContext::from_headers(None, Some("Bearer   "));
        assert_eq!(blank.bearer(), None);
    }

    #[test]
    fn header_map_tolerates_foreign_bytes_and_split_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(
            COOKIE,
            HeaderValue::from_bytes("pref=café; accessToken=a.b.c".as_bytes()).unwrap(),
        );
        headers.append(COOKIE, HeaderValue::from_static("refreshToken=d.e.f"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff").unwrap(),
        );

        let ctx = RequestContext::from_header_map(&headers);
        assert_eq!(ctx.cookie("accessToken"), Some("a.b.c"));
        assert_eq!(ctx.cookie("refreshToken"), Some("d.e.f"));
        assert_eq!(ctx.bearer(), None);

        let empty = RequestContext::from_header_map(&HeaderMap::new());
        assert!(empty.cookies.is_empty());
        assert_eq!(empty.authorization, None);
    }

    #[test]
    fn reply_carries_every_cookie() {
        use warp::Reply;

        let reply = ApiReply::json(StatusCode::OK, &serde_json::json!({"ok": true}))
            .unwrap()
            .with_cookie("a=1; Path=/".to_string())
            .with_cookie("b=2; Path=/".to_string());
        let response = reply.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }
}
