use std::fmt;

use thiserror::Error;

use crate::validation::ValidationErrors;

pub const MSG_UNAUTHORIZED: &str = "Unauthorized. Please login again.";
pub const MSG_MISSING_TOKEN: &str = "Access token not found. Please login again.";
pub const MSG_NETWORK: &str = "Network error. Please check your connection and try again.";

/// ApiError
///
/// Every failure a remote call (or the validation step in front of it) can
/// produce. Callers never see a raw transport error: it is classified here
/// and turned into a user-facing message with [`ApiError::user_message`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// No bearer token is held for an operation that needs one.
    #[error("no access token in the current session")]
    MissingToken,

    /// The remote answered 401.
    #[error("unauthorized (HTTP 401)")]
    Unauthorized,

    /// No response was received.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-2xx answer other than 401. `message` is the server's `message` or
    /// `error` field when the body carried one.
    #[error("server error (HTTP {status}){}", message_suffix(.message))]
    Server { status: u16, message: Option<String> },

    /// The response body did not match the expected shape.
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Rejected client-side, never sent.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
}

/// Coarse classification used to pick the notification and the follow-up
/// navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Network,
    Server,
    Decode,
    Validation,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::MissingToken | ApiError::Unauthorized => ErrorKind::Unauthorized,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Decode { .. } => ErrorKind::Decode,
            ApiError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// True when the viewer should be sent back to the login screen.
    pub fn requires_login(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// user_message
    ///
    /// Message shown to the user. `fallback` is the operation-specific text
    /// used when the server gave no message of its own.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::MissingToken => MSG_MISSING_TOKEN.to_string(),
            ApiError::Unauthorized => MSG_UNAUTHORIZED.to_string(),
            ApiError::Network(_) => MSG_NETWORK.to_string(),
            ApiError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Server { .. } | ApiError::Decode { .. } => fallback.to_string(),
            ApiError::Validation(errors) => errors.to_string(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// Errors raised while reading the environment at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("could not resolve a configuration directory for the session file")]
    NoConfigDir,
}

/// Errors raised by durable session storage.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Decode => "decode",
            ErrorKind::Validation => "validation",
        };
        f.write_str(label)
    }
}
