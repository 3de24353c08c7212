use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::SessionUser;

pub const SESSION_COOKIE: &str = "session";

/// Accepted range for `JWT_EXP_HOURS`: one hour up to a year.
pub const MAX_EXP_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_hours = parse_exp_hours(std::env::var("JWT_EXP_HOURS").ok().as_deref())?;

        Ok(Self::new(secret, exp_hours))
    }

    pub fn new(secret: impl Into<String>, exp_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into().into_bytes()),
            exp_hours,
        }
    }

    /// Issue a session token. Claims identify the user only; the role is
    /// always read from the profile store.
    pub fn encode(&self, user: &SessionUser) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn max_age_secs(&self) -> i64 {
        self.exp_hours * 3600
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

/// Credentials presented with a request, unverified.
///
/// Extraction never rejects: a request without a token is an anonymous
/// session, and the gate decides what that means.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn from_parts(parts: &Parts) -> Self {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        let token = match bearer {
            Some(token) => Some(token.to_string()),
            None => parse_cookies(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value_trimmed().to_string())
                .filter(|token| !token.is_empty()),
        };

        Self { token }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Session::from_parts(parts))
    }
}

fn parse_exp_hours(raw: Option<&str>) -> Result<i64, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(24);
    };
    match raw.parse::<i64>() {
        Ok(hours) if (1..=MAX_EXP_HOURS).contains(&hours) => Ok(hours),
        Ok(_) => Err(AppError::configuration(format!(
            "JWT_EXP_HOURS must be between 1 and {MAX_EXP_HOURS}"
        ))),
        Err(_) => Err(AppError::configuration("JWT_EXP_HOURS must be a valid integer")),
    }
}

/// Every well-formed cookie across all `Cookie` headers. Malformed pairs are
/// skipped.
fn parse_cookies(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for chunk in raw.split(';').map(str::trim) {
            if let Ok(cookie) = Cookie::parse(chunk) {
                jar.add_original(cookie.into_owned());
            }
        }
    }
    jar
}

fn build_session_cookie(value: String, max_age: CookieDuration) -> String {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
        .to_string()
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    build_session_cookie(token.to_string(), CookieDuration::seconds(max_age_secs))
}

pub fn clear_session_cookie() -> String {
    build_session_cookie(String::new(), CookieDuration::ZERO)
}
