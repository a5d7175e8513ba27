//! Studio configuration parsed from environment variables.
//!
//! Every knob has a typed default so a bare environment yields a working
//! local setup; only an explicitly named but missing token is an error.

use crate::error::ErrorCode;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CHAT_SAVE_DEBOUNCE_MS: u64 = 2000;
pub const DEFAULT_CONTEXT_TURNS: usize = 6;
pub const DEFAULT_DESCRIPTION: &str = "A professional web application";

/// Errors produced while reading configuration.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// `STUDIO_API_TOKEN_ENV` names a variable that is not set.
    #[error("missing API token: env var {var} not set")]
    MissingToken { var: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
            Self::MissingToken { .. } => "E_MISSING_TOKEN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    /// Collaborator base URL without a trailing slash.
    pub api_url: String,
    /// Bearer token sent to the collaborator, if any.
    pub api_token: Option<String>,
    pub timeouts: Timeouts,
    /// Quiet period before a chat snapshot is written.
    pub chat_save_debounce_ms: u64,
    /// Recent messages flattened into each prompt.
    pub context_turns: usize,
    /// Project description used when the project has none.
    pub default_description: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            api_token: None,
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            chat_save_debounce_ms: DEFAULT_CHAT_SAVE_DEBOUNCE_MS,
            context_turns: DEFAULT_CONTEXT_TURNS,
            default_description: DEFAULT_DESCRIPTION.to_owned(),
        }
    }
}

impl StudioConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `STUDIO_API_URL`: collaborator base URL (http or https)
    /// - `STUDIO_API_TOKEN_ENV`: names the env var holding the bearer token
    /// - `STUDIO_REQUEST_TIMEOUT_SECS`: default 120
    /// - `STUDIO_CONNECT_TIMEOUT_SECS`: default 10
    /// - `STUDIO_CHAT_SAVE_DEBOUNCE_MS`: default 2000
    /// - `STUDIO_CONTEXT_TURNS`: default 6
    /// - `STUDIO_DEFAULT_DESCRIPTION`
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for a non-http URL, [`ConfigError::MissingToken`]
    /// when the named token variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_api_url(std::env::var("STUDIO_API_URL").ok().as_deref())?;

        let api_token = match std::env::var("STUDIO_API_TOKEN_ENV") {
            Ok(var) => Some(std::env::var(&var).map_err(|_| ConfigError::MissingToken { var: var.clone() })?),
            Err(_) => None,
        };

        let timeouts = Timeouts {
            request_secs: env_parse("STUDIO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("STUDIO_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let default_description = std::env::var("STUDIO_DEFAULT_DESCRIPTION")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned());

        Ok(Self {
            api_url,
            api_token,
            timeouts,
            chat_save_debounce_ms: env_parse("STUDIO_CHAT_SAVE_DEBOUNCE_MS", DEFAULT_CHAT_SAVE_DEBOUNCE_MS),
            context_turns: env_parse("STUDIO_CONTEXT_TURNS", DEFAULT_CONTEXT_TURNS),
            default_description,
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_api_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_API_URL).trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_owned())
    } else {
        Err(ConfigError::Parse(format!("STUDIO_API_URL must be http(s): '{url}'")))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
