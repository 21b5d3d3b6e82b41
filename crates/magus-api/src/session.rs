use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use magus_types::api::SessionClaims;

pub const SESSION_COOKIE: &str = "auth-token";

/// 24 hours, for both the token's `exp` and the cookie's `Max-Age`.
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24;

/// Signs and verifies session tokens (HS256) and builds the cookie that
/// carries them.
#[derive(Clone)]
pub struct Sessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
    secure_cookie: bool,
}

impl std::fmt::Debug for Sessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sessions")
            .field("ttl", &self.ttl)
            .field("secure_cookie", &self.secure_cookie)
            .finish_non_exhaustive()
    }
}

impl Sessions {
    pub fn new(secret: &str, secure_cookie: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::seconds(SESSION_TTL_SECS),
            secure_cookie,
        }
    }

    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue(&self, email: &str) -> anyhow::Result<String> {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Signature and expiry check. Any failure means "no session".
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .ok()
            .map(|data| data.claims)
    }

    /// Session from the cookie, falling back to an `Authorization: Bearer`
    /// header for non-browser clients.
    pub fn from_request(&self, jar: &CookieJar, headers: &HeaderMap) -> Option<SessionClaims> {
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            return self.verify(cookie.value());
        }

        let bearer = headers.typed_get::<Authorization<Bearer>>()?;
        self.verify(bearer.token())
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.ttl.num_seconds()))
            .path("/")
            .build()
    }

    /// Overwrites the session cookie with an empty, already-expired one.
    pub fn expired_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::ZERO)
            .path("/")
            .build()
    }
}
