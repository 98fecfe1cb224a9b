//! Session configuration from environment variables.

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";

/// What happens to a message that mentions nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UntargetedMode {
    /// Transmit `{text, username, persona, store: true}` so the relay can persist it.
    #[default]
    Store,
    /// Only echo locally.
    LocalOnly,
}

impl UntargetedMode {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "store" => Ok(UntargetedMode::Store),
            "local" | "local-only" => Ok(UntargetedMode::LocalOnly),
            other => Err(ConfigError::UnknownUntargetedMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Relay WebSocket endpoint, always `ws://` or `wss://`.
    pub endpoint: String,
    pub untargeted: UntargetedMode,
}

impl SessionConfig {
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            untargeted: UntargetedMode::default(),
        })
    }

    pub fn with_untargeted(mut self, mode: UntargetedMode) -> Self {
        self.untargeted = mode;
        self
    }

    /// Read configuration from the process environment.
    ///
    /// Environment variables:
    /// - `RELAYCHAT_WS_URL`: relay endpoint (default: "ws://localhost:8000/ws").
    ///   `http(s)://` is accepted and rewritten to `ws(s)://`.
    /// - `RELAYCHAT_UNTARGETED`: "store" | "local" (default: "store")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = var("RELAYCHAT_WS_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let untargeted = match var("RELAYCHAT_UNTARGETED") {
            Some(mode) if !mode.trim().is_empty() => UntargetedMode::parse(&mode)?,
            _ => UntargetedMode::default(),
        };
        Ok(Self::new(&endpoint)?.with_untargeted(untargeted))
    }
}

/// Coerce an endpoint to a WebSocket URL, accepting `http`/`https` spellings.
pub fn normalize_endpoint(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(invalid(format!("unsupported scheme {:?}", other))),
    };
    if url.scheme() != scheme {
        // http -> ws and https -> wss are both "special" schemes, so this cannot fail.
        url.set_scheme(scheme)
            .map_err(|_| invalid("cannot rewrite scheme".to_string()))?;
    }
    Ok(url.to_string())
}
