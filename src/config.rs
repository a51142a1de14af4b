//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Name affixes used when a clone setting is created without its own
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloneDefaults {
    pub prefix: String,
    pub suffix: String,
}

/// Complete application settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub defaults: CloneDefaults,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: parse_or(&lookup, "HOST", ServerConfig::default().host)?,
            port: parse_or(&lookup, "PORT", ServerConfig::default().port)?,
        };

        let cors = CorsConfig {
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        // Affixes are used verbatim so a leading or trailing space survives
        let defaults = CloneDefaults {
            prefix: lookup("CLONE_DEFAULT_PREFIX").unwrap_or_default(),
            suffix: lookup("CLONE_DEFAULT_SUFFIX").unwrap_or_default(),
        };

        Ok(Self {
            server,
            cors,
            defaults,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{} has an invalid value '{}'", key, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_settings_from_environment() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("CLONE_DEFAULT_PREFIX", "Copy of "),
        ]))
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["http://a.test", "http://b.test"]
        );
        assert_eq!(settings.defaults.prefix, "Copy of ");
        assert_eq!(settings.defaults.suffix, "");
    }

    #[test]
    fn test_malformed_port_is_rejected() {
        let result = Settings::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }
}
