use axum::response::Redirect;

use crate::authz::Denial;
use crate::errors::AppError;

/// Where page navigation lands after a denial.
///
/// Kept apart so the browser can tell "log in" from "not allowed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectConfig {
    pub login_path: String,
    pub unauthorized_path: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            unauthorized_path: "/".to_string(),
        }
    }
}

impl RedirectConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        let login_path = path_from_env("LOGIN_PATH")?.unwrap_or(defaults.login_path);
        let unauthorized_path = path_from_env("UNAUTHORIZED_REDIRECT")?.unwrap_or(defaults.unauthorized_path);

        Ok(Self {
            login_path,
            unauthorized_path,
        })
    }

    pub fn target(&self, denial: Denial) -> &str {
        match denial {
            Denial::NotAuthenticated => &self.login_path,
            Denial::Unauthorized => &self.unauthorized_path,
        }
    }

    pub fn redirect(&self, denial: Denial) -> Redirect {
        Redirect::to(self.target(denial))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub redirects: RedirectConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let port = match std::env::var("APP_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?,
            Err(_) => 8000,
        };

        Ok(Self {
            port,
            redirects: RedirectConfig::from_env()?,
        })
    }
}

fn path_from_env(key: &str) -> Result<Option<String>, AppError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) if value.starts_with('/') => Ok(Some(value)),
        Ok(_) => Err(AppError::configuration(format!("{key} must be an absolute path"))),
        Err(_) => Ok(None),
    }
}
