//! Configuration types.
//!
//! Everything is read once at startup from the environment (after `.env` is
//! loaded) and passed down explicitly; nothing reads the environment at
//! request time.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{DEFAULT_API_URL, DEFAULT_MODEL, LlmConfig};

/// Expected `x-api-key` when `API_KEY` is unset.
pub const DEFAULT_API_KEY: &str = "my-secret-key-123";

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Caller authentication. A plain equality check, not a security boundary.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub api_key: SecretString,
    /// When off, a wrong key is logged and the request is served anyway.
    pub enforce: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(DEFAULT_API_KEY),
            enforce: false,
        }
    }
}

/// Conversation retention.
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Idle time after which a conversation is dropped. `None` keeps
    /// conversations for the life of the process.
    pub idle_ttl: Option<Duration>,
    pub sweep_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            idle_ttl: None,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Top-level honeypot configuration.
#[derive(Debug, Clone, Default)]
pub struct HoneypotConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub retention: RetentionConfig,
}

impl HoneypotConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Unset and blank values fall back to defaults; malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 8080)?,
        };

        let auth = AuthConfig {
            api_key: SecretString::from(
                get("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            ),
            enforce: parse_bool_or(
                "HONEYPOT_ENFORCE_API_KEY",
                get("HONEYPOT_ENFORCE_API_KEY"),
                false,
            )?,
        };

        let llm = LlmConfig {
            enabled: parse_bool_or("USE_LLM", get("USE_LLM"), true)?,
            api_key: get("LLM_API_KEY").map(SecretString::from),
            api_url: get("LLM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), 0.7)?,
            max_tokens: parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), 150)?,
            timeout: Duration::from_secs(parse_or(
                "LLM_TIMEOUT_SECS",
                get("LLM_TIMEOUT_SECS"),
                10,
            )?),
        };

        let ttl_secs: u64 = parse_or(
            "HONEYPOT_CONVERSATION_TTL_SECS",
            get("HONEYPOT_CONVERSATION_TTL_SECS"),
            0,
        )?;
        let sweep_secs: u64 = parse_or(
            "HONEYPOT_SWEEP_INTERVAL_SECS",
            get("HONEYPOT_SWEEP_INTERVAL_SECS"),
            60,
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HONEYPOT_SWEEP_INTERVAL_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        let retention = RetentionConfig {
            idle_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            sweep_interval: Duration::from_secs(sweep_secs),
        };

        Ok(Self {
            server,
            auth,
            llm,
            retention,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{:?}: {}", value, e),
        }),
    }
}

fn parse_bool_or(key: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{:?} is not a boolean", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    fn config_from(pairs: &[(&str, &str)]) -> Result<HoneypotConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HoneypotConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.auth.api_key.expose_secret(), DEFAULT_API_KEY);
        assert!(!config.auth.enforce);
        assert!(config.llm.enabled);
        assert!(config.llm.api_key.is_none());
        assert!(!config.llm.is_active());
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout, Duration::from_secs(10));
        assert!(config.retention.idle_ttl.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("API_KEY", "k"),
            ("HONEYPOT_ENFORCE_API_KEY", "yes"),
            ("USE_LLM", "off"),
            ("LLM_API_KEY", "sk-test"),
            ("LLM_MODEL", "gpt-4o"),
            ("LLM_TIMEOUT_SECS", "3"),
            ("HONEYPOT_CONVERSATION_TTL_SECS", "600"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.api_key.expose_secret(), "k");
        assert!(config.auth.enforce);
        assert!(!config.llm.enabled);
        assert!(!config.llm.is_active());
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.timeout, Duration::from_secs(3));
        assert_eq!(config.retention.idle_ttl, Some(Duration::from_secs(600)));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("LLM_API_KEY", "  "), ("PORT", "")]).unwrap();
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn rejects_bad_boolean() {
        let err = config_from(&[("USE_LLM", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "USE_LLM"));
    }

    #[test]
    fn rejects_zero_sweep_interval() {
        assert!(config_from(&[("HONEYPOT_SWEEP_INTERVAL_SECS", "0")]).is_err());
    }
}
