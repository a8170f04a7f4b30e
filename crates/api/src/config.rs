// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the committee
//! proxy, supporting different environments and validation of configuration
//! parameters. The upstream URL is only ever supplied at runtime.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use axum::http::HeaderValue;
use config::{
    Config, ConfigBuilder, ConfigError, Environment as ConfigEnv, File, builder::DefaultState,
};
use external_apis::{AppsScriptClient, AppsScriptConfig};
use serde::{Deserialize, Deserializer, Serialize, de};
use url::Url;

use crate::error::{ServerError, ServerResult};

/// Origin of the local frontend dev server
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Create a safe testing port (port 0)
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // Re-validated once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

/// Where committee data is fetched from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Deployed Apps Script web app URL
    pub base_url: Url,
    /// Optional bound on each upstream exchange; unset means the transport default
    #[serde(default)]
    pub timeout_seconds: Option<TimeoutSeconds>,
}

impl UpstreamConfig {
    /// Create an upstream configuration without a timeout
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_seconds: None,
        }
    }

    /// Convert into the client configuration
    pub fn client_config(&self) -> AppsScriptConfig {
        let config = AppsScriptConfig {
            base_url: self.base_url.clone(),
            timeout_seconds: None,
        };
        match self.timeout_seconds {
            Some(timeout) => config.with_timeout_seconds(timeout.value().as_secs()),
            None => config,
        }
    }
}

/// Cross-origin policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
        }
    }
}

impl CorsConfig {
    /// Parse the configured origins into header values
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` for a wildcard or an origin that is not a
    /// valid header value
    pub fn origin_header_values(&self) -> ServerResult<Vec<HeaderValue>> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                let origin = origin.trim();
                if origin == "*" {
                    return Err(ServerError::Config {
                        message: "wildcard origin cannot be combined with credentials".to_string(),
                    });
                }
                HeaderValue::from_str(origin).map_err(|e| ServerError::Config {
                    message: format!("invalid allowed origin '{origin}': {e}"),
                })
            })
            .collect()
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Environment type
    pub environment: Environment,
    /// Upstream committee backend
    pub upstream: UpstreamConfig,
    /// Cross-origin policy
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `SERVER_` prefix, nested keys split on `__`
    ///    (`SERVER_UPSTREAM__BASE_URL`, `SERVER_CORS__ALLOWED_ORIGINS=a,b`)
    /// 5. `PORT` and `ENVIRONMENT`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Self::defaults()?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            );

        if let Ok(port) = std::env::var("PORT") {
            config_builder = config_builder.set_override("port", port)?;
        }

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        Self::from_builder(config_builder)
    }

    /// Builder pre-populated with default values
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("environment", "development")?
            .set_default(
                "cors.allowed_origins",
                vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            )
    }

    /// Build, deserialize and validate a configuration
    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let mut server_config: Self = builder.build()?.try_deserialize()?;

        // Fix the ServerPort to have the correct environment context
        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        AppsScriptClient::new(server_config.upstream.client_config())
            .map_err(|e| ConfigError::Message(format!("invalid upstream configuration: {e}")))?;

        server_config
            .cors
            .origin_header_values()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(server_config)
    }

    /// Create configuration optimized for testing
    pub fn for_testing(upstream_base_url: Url) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(), // let OS choose available port
            environment: Environment::Testing,
            upstream: UpstreamConfig::new(upstream_base_url),
            cors: CorsConfig::default(),
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn load_json(json: &str) -> Result<ServerConfig, ConfigError> {
        let builder = ServerConfig::defaults()?.add_source(File::from_str(json, FileFormat::Json));
        ServerConfig::from_builder(builder)
    }

    #[test]
    fn timeout_validation() {
        // Invalid timeout values should fail to construct
        assert!(TimeoutSeconds::new(0).is_err());
        assert!(TimeoutSeconds::new(400).is_err());

        // Valid timeout values should construct successfully
        assert!(TimeoutSeconds::new(30).is_ok());
        assert!(TimeoutSeconds::new(1).is_ok());
        assert!(TimeoutSeconds::new(300).is_ok());
    }

    #[test]
    fn server_port_validation() {
        // Port 0 should only be valid in testing environment
        assert!(ServerPort::new(0, Environment::Testing).is_ok());
        assert!(ServerPort::new(0, Environment::Development).is_err());
        assert!(ServerPort::new(0, Environment::Production).is_err());

        assert!(ServerPort::new(3000, Environment::Development).is_ok());
        assert!(ServerPort::new(443, Environment::Production).is_ok());
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Testing.to_string(), "testing");
    }

    #[test]
    fn defaults_apply_when_only_upstream_is_set() {
        let config =
            load_json(r#"{ "upstream": { "base_url": "https://script.example.com/exec" } }"#)
                .unwrap();

        assert_eq!(config.port.value(), 3000);
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(
            config.upstream.base_url.as_str(),
            "https://script.example.com/exec"
        );
        assert!(config.upstream.timeout_seconds.is_none());
        assert_eq!(config.cors, CorsConfig::default());
    }

    #[test]
    fn upstream_base_url_is_required() {
        let result = load_json("{}");
        assert!(result.is_err());
    }

    #[test]
    fn upstream_base_url_must_be_http() {
        let result = load_json(r#"{ "upstream": { "base_url": "ftp://example.com/exec" } }"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("invalid upstream configuration"), "{message}");
    }

    #[test]
    fn overrides_from_file() {
        let config = load_json(
            r#"{
                "port": 8080,
                "environment": "production",
                "upstream": { "base_url": "https://script.example.com/exec", "timeout_seconds": 15 },
                "cors": { "allowed_origins": ["http://localhost:5173", "https://committees.example.org"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.port.value(), 8080);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.upstream.client_config().timeout_seconds, Some(15));
        assert_eq!(config.cors.allowed_origins.len(), 2);
        assert_eq!(config.cors.origin_header_values().unwrap().len(), 2);
    }

    #[test]
    fn port_zero_rejected_outside_testing() {
        let result = load_json(
            r#"{ "port": 0, "upstream": { "base_url": "https://script.example.com/exec" } }"#,
        );
        assert!(result.is_err());

        let config = load_json(
            r#"{ "port": 0, "environment": "testing", "upstream": { "base_url": "https://script.example.com/exec" } }"#,
        )
        .unwrap();
        assert_eq!(config.port.value(), 0);
    }

    #[test]
    fn wildcard_origin_rejected() {
        let cors = CorsConfig {
            allowed_origins: vec!["*".to_string()],
        };
        assert!(cors.origin_header_values().is_err());

        let result = load_json(
            r#"{ "upstream": { "base_url": "https://script.example.com/exec" }, "cors": { "allowed_origins": ["*"] } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn testing_config_uses_ephemeral_port() {
        let upstream = Url::parse("http://127.0.0.1:9/exec").unwrap();
        let config = ServerConfig::for_testing(upstream);
        assert_eq!(config.socket_addr().port(), 0);
        assert_eq!(config.environment, Environment::Testing);
    }
}
