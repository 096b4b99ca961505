use crate::application_port::*;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Secret and lifetime for one token class.
#[derive(Clone)]
pub struct SigningKey {
    pub secret: Vec<u8>,
    pub ttl: Duration,
}

impl SigningKey {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        SigningKey {
            secret: secret.into(),
            ttl,
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access: SigningKey,
    pub refresh: SigningKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    iss: String,
    aud: String,
    exp: i64,
    iat: i64,
    jti: String, // keeps tokens minted within the same second distinct
}

fn encode_claims(
    uid: UserId,
    key: &SigningKey,
    cfg: &JwtConfig,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let ttl = chrono::Duration::from_std(key.ttl)
        .map_err(|e| AuthError::InternalError(format!("token ttl out of range: {e}")))?;
    let exp_dt = iat_dt
        .checked_add_signed(ttl)
        .ok_or_else(|| AuthError::InternalError("token expiry overflow".to_string()))?;
    let claims = Claims {
        sub: uid.to_string(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&key.secret),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn decode_claims(
    token: &str,
    key: &SigningKey,
    cfg: &JwtConfig,
    kind: TokenKind,
) -> Result<Claims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.leeway = 0;
    v.validate_exp = true;
    v.set_audience(&[cfg.audience.as_str()]);
    v.set_issuer(&[cfg.issuer.as_str()]);
    v.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(&key.secret), &v).map_err(
        |e| {
            debug!(?kind, reason = ?e.kind(), "token rejected");
            AuthError::TokenInvalid
        },
    )?;
    Ok(data.claims)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.cfg.access,
            TokenKind::Refresh => &self.cfg.refresh,
        }
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<TokenVerifyResult, AuthError> {
        let claims = decode_claims(token, self.key(kind), &self.cfg, kind)?;
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenInvalid)?;
        Ok(TokenVerifyResult { user_id })
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue_access_token(&self, user: UserId) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_claims(user, &self.cfg.access, &self.cfg)?;
        Ok((AccessToken(token), exp_dt))
    }

    fn issue_refresh_token(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_claims(user, &self.cfg.refresh, &self.cfg)?;
        Ok((RefreshToken(token), exp_dt))
    }

    fn verify_access_token(&self, token: &str) -> Result<TokenVerifyResult, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    fn verify_refresh_token(&self, token: &str) -> Result<TokenVerifyResult, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        self.key(kind).ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test_config() -> JwtConfig {
        JwtConfig {
            issuer: "countersign".to_string(),
            audience: "countersign-api".to_string(),
            access: SigningKey {
                secret: b"access-secret-for-tests".to_vec(),
                ttl: Duration::from_secs(15 * 60),
            },
            refresh: SigningKey {
                secret: b"refresh-secret-for-tests".to_vec(),
                ttl: Duration::from_secs(30 * 24 * 60 * 60),
            },
        }
    }

    #[test]
    fn issued_tokens_verify_with_matching_subject() {
        let codec = JwtHs256Codec::new(test_config());
        let user = UserId::new();

        let (access, access_exp) = codec.issue_access_token(user).unwrap();
        let (refresh, refresh_exp) = codec.issue_refresh_token(user).unwrap();

        assert_eq!(codec.verify_access_token(&access.0).unwrap().user_id, user);
        assert_eq!(codec.verify_refresh_token(&refresh.0).unwrap().user_id, user);
        assert!(refresh_exp > access_exp);
    }

    #[test]
    fn token_classes_are_not_interchangeable() {
        let codec = JwtHs256Codec::new(test_config());
        let user = UserId::new();
        let (access, _) = codec.issue_access_token(user).unwrap();
        let (refresh, _) = codec.issue_refresh_token(user).unwrap();

        assert_matches!(codec.verify_refresh_token(&access.0), Err(AuthError::TokenInvalid));
        assert_matches!(codec.verify_access_token(&refresh.0), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn issuer_and_audience_are_enforced() {
        let user = UserId::new();
        let (token, _) = JwtHs256Codec::new(test_config())
            .issue_refresh_token(user)
            .unwrap();

        let mut other_issuer = test_config();
        other_issuer.issuer = "someone-else".to_string();
        assert_matches!(
            JwtHs256Codec::new(other_issuer).verify_refresh_token(&token.0),
            Err(AuthError::TokenInvalid)
        );

        let mut other_audience = test_config();
        other_audience.audience = "another-api".to_string();
        assert_matches!(
            JwtHs256Codec::new(other_audience).verify_refresh_token(&token.0),
            Err(AuthError::TokenInvalid)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = test_config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new().to_string(),
            iss: cfg.issuer.clone(),
            aud: cfg.audience.clone(),
            exp: now - 1,
            iat: now - 60,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&cfg.refresh.secret),
        )
        .unwrap();

        let codec = JwtHs256Codec::new(cfg);
        assert_matches!(codec.verify_refresh_token(&token), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn tampered_and_malformed_tokens_are_rejected() {
        let codec = JwtHs256Codec::new(test_config());
        let (token, _) = codec.issue_refresh_token(UserId::new()).unwrap();

        let sig_start = token.0.rfind('.').unwrap() + 1;
        let first = token.0[sig_start..].chars().next().unwrap();
        let mut tampered = token.0.clone();
        tampered.replace_range(
            sig_start..sig_start + 1,
            if first == 'A' { "B" } else { "A" },
        );

        assert_matches!(codec.verify_refresh_token(&tampered), Err(AuthError::TokenInvalid));
        assert_matches!(codec.verify_refresh_token("not-a-jwt"), Err(AuthError::TokenInvalid));
        assert_matches!(codec.verify_refresh_token(""), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn back_to_back_tokens_differ() {
        let codec = JwtHs256Codec::new(test_config());
        let user = UserId::new();
        let (a, _) = codec.issue_refresh_token(user).unwrap();
        let (b, _) = codec.issue_refresh_token(user).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn lifetimes_come_from_config() {
        let codec = JwtHs256Codec::new(test_config());
        assert_eq!(codec.lifetime(TokenKind::Access), Duration::from_secs(900));
        assert_eq!(
            codec.lifetime(TokenKind::Refresh),
            Duration::from_secs(30 * 24 * 3600)
        );
    }
}
