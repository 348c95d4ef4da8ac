use std::{env, path::PathBuf, time::Duration};

use crate::error::ConfigError;

/// Public CMS endpoint used when nothing else is configured in local mode.
pub const DEFAULT_API_URL: &str = "https://test-fe.mysellerpintar.com/api";

/// AppConfig
///
/// Holds the client's entire configuration state. Immutable once loaded and
/// cloned into every component that needs it (API client, controllers, screens).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Base URL of the remote CMS REST service, without a trailing slash.
    pub api_base_url: String,
    // Fixed page size sent as `limit` on every list request.
    pub page_size: u32,
    // Quiet period before a search keystroke becomes the active filter.
    pub search_debounce: Duration,
    // Where the session (token, role, username) is persisted.
    pub session_file: PathBuf,
    // When true, changing a filter moves the controller back to page 1.
    pub reset_page_on_filter: bool,
    // Optional transport timeout; None keeps reqwest's default.
    pub http_timeout: Option<Duration>,
    // Runtime environment marker. Controls log format and fail-fast rules.
    pub env: Env,
}

/// Env
///
/// Runtime context. `Production` demands an explicit API URL and switches
/// logging to JSON.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Test-friendly configuration that never touches the environment.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            page_size: 10,
            search_debounce: Duration::from_millis(300),
            session_file: env::temp_dir().join("article-portal-test-session.json"),
            reset_page_on_filter: false,
            http_timeout: None,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Fail-fast entry point used by the binary. Reads `.env` first, then the
    /// process environment.
    ///
    /// # Panics
    /// Panics when a value required for the current environment is missing or
    /// malformed, so the client never starts half-configured.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => panic!("FATAL: {e}"),
        }
    }

    /// try_load
    ///
    /// Reads every `PORTAL_*` variable and resolves defaults per environment.
    pub fn try_load() -> Result<Self, ConfigError> {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // The production API URL is mandatory and must be explicitly set.
        let api_base_url = match env {
            Env::Production => {
                env::var("PORTAL_API_URL").map_err(|_| ConfigError::Missing("PORTAL_API_URL"))?
            }
            Env::Local => env::var("PORTAL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let api_base_url = api_base_url.trim_end_matches('/').to_string();
        if api_base_url.is_empty() {
            return Err(ConfigError::Invalid {
                key: "PORTAL_API_URL",
                value: String::new(),
            });
        }

        let page_size = parse_var("PORTAL_PAGE_SIZE", 10u32)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "PORTAL_PAGE_SIZE",
                value: "0".to_string(),
            });
        }

        let debounce_ms = parse_var("PORTAL_SEARCH_DEBOUNCE_MS", 300u64)?;
        let reset_page_on_filter = parse_var("PORTAL_RESET_PAGE_ON_FILTER", false)?;

        let http_timeout = match env::var("PORTAL_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                ConfigError::Invalid {
                    key: "PORTAL_HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                }
            })?)),
            Err(_) => None,
        };

        let session_file = match env::var("PORTAL_SESSION_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_file()?,
        };

        Ok(Self {
            api_base_url,
            page_size,
            search_debounce: Duration::from_millis(debounce_ms),
            session_file,
            reset_page_on_filter,
            http_timeout,
            env,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("article-portal").join("session.json"))
}
