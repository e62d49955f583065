//! Runtime configuration for item-cache-service.
//!
//! Configuration is loaded from a JSON file (missing sections and fields fall
//! back to defaults) and then overridden by environment variables.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "item-cache-service", about = "Items CRUD service with a Redis cache-aside layer")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address; overrides `server.listen`.
    #[arg(long)]
    pub listen: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service identity.
    pub app: AppConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Redis connection settings.
    pub redis: RedisConfig,

    /// Cache-aside settings.
    pub cache: CacheConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Service identity reported by `/` and `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "item-cache-service".to_string(),
            environment: Environment::Development,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8000").
    pub listen: String,

    /// Allowed CORS origins; `"*"` allows any.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Redis connection pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Connection URL (e.g. "redis://localhost:6379/0").
    pub url: String,

    /// Maximum pooled connections.
    pub pool_size: usize,

    /// Connect, pool-wait and per-operation timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            pool_size: 10,
            timeout_secs: 5,
        }
    }
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which key-value store backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    /// In-process store; no external dependency.
    Memory,
    /// No cache at all; every read goes to the record store.
    Disabled,
}

/// Cache-aside behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Lifetime of cached item entries in seconds.
    pub entity_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            entity_ttl_secs: 3600, // 1 hour
        }
    }
}

impl CacheConfig {
    pub fn entity_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_ttl_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Console,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for this crate and tower-http when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Where [`Config::load`] took its values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file was missing.
    Defaults,
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    ///
    /// Runs before logging is installed, so a missing file is reported through
    /// the returned [`ConfigSource`] rather than logged here.
    pub fn load(path: &std::path::Path) -> anyhow::Result<(Self, ConfigSource)> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok((config, ConfigSource::File))
        } else {
            Ok((Config::default(), ConfigSource::Defaults))
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("APP_NAME") {
            self.app.name = name;
        }
        if let Some(env) = lookup("ENVIRONMENT") {
            self.app.environment = env.parse().map_err(anyhow::Error::msg)?;
        }

        match (lookup("HOST"), lookup("PORT")) {
            (None, None) => {}
            (host, port) => {
                let (current_host, current_port) = self
                    .server
                    .listen
                    .rsplit_once(':')
                    .unwrap_or(("0.0.0.0", "8000"));
                let host = host.unwrap_or_else(|| current_host.to_string());
                let port = port.unwrap_or_else(|| current_port.to_string());
                self.server.listen = format!("{host}:{port}");
            }
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(url) = lookup("REDIS_URL") {
            self.redis.url = url;
        }
        if let Some(size) = lookup("REDIS_POOL_SIZE") {
            self.redis.pool_size = size.parse()?;
        }
        if let Some(timeout) = lookup("REDIS_TIMEOUT") {
            self.redis.timeout_secs = timeout.parse()?;
        }

        if let Some(backend) = lookup("CACHE_BACKEND") {
            self.cache.backend = serde_json::from_value(serde_json::Value::String(
                backend.to_ascii_lowercase(),
            ))?;
        }
        if let Some(ttl) = lookup("CACHE_TTL") {
            self.cache.entity_ttl_secs = ttl.parse()?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        self.logging.level = normalize_level(&self.logging.level)?.to_string();
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = serde_json::from_value(serde_json::Value::String(
                format.to_ascii_lowercase(),
            ))?;
        }

        Ok(())
    }
}

/// Map a configured level name onto a tracing level directive.
///
/// Accepts tracing's names plus `warning` and `critical`, case-insensitively.
pub fn normalize_level(level: &str) -> anyhow::Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "critical" => Ok("error"),
        other => anyhow::bail!("unknown log level: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.cache.entity_ttl_secs, 3600);
        assert_eq!(cfg.redis.pool_size, 10);
        assert_eq!(cfg.redis.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.app.environment, Environment::Development);
        assert_eq!(cfg.server.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"redis": {"url": "redis://cache:6379/1"}, "cache": {"backend": "memory"}}"#)
                .unwrap();
        assert_eq!(cfg.redis.url, "redis://cache:6379/1");
        assert_eq!(cfg.redis.pool_size, 10);
        assert_eq!(cfg.cache.backend, CacheBackend::Memory);
        assert_eq!(cfg.cache.entity_ttl_secs, 3600);
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ENVIRONMENT", "production"),
            ("PORT", "9000"),
            ("REDIS_URL", "redis://redis:6379/2"),
            ("REDIS_POOL_SIZE", "25"),
            ("CACHE_BACKEND", "Memory"),
            ("LOG_FORMAT", "console"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(cfg.app.environment, Environment::Production);
        assert_eq!(cfg.server.listen, "0.0.0.0:9000");
        assert_eq!(cfg.redis.url, "redis://redis:6379/2");
        assert_eq!(cfg.redis.pool_size, 25);
        assert_eq!(cfg.cache.backend, CacheBackend::Memory);
        assert_eq!(cfg.logging.format, LogFormat::Console);
        assert_eq!(
            cfg.server.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_log_level_names_are_normalized() {
        for (input, expected) in [
            ("WARNING", "warn"),
            ("warning", "warn"),
            ("CRITICAL", "error"),
            ("Error", "error"),
            ("DEBUG", "debug"),
            ("info", "info"),
        ] {
            let mut cfg = Config::default();
            cfg.apply_overrides(|name| (name == "LOG_LEVEL").then(|| input.to_string()))
                .unwrap();
            assert_eq!(cfg.logging.level, expected, "input: {input}");
        }
    }

    #[test]
    fn test_level_from_file_is_normalized() {
        let mut cfg: Config = serde_json::from_str(r#"{"logging": {"level": "WARNING"}}"#).unwrap();
        cfg.apply_overrides(|_| None).unwrap();
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn test_unknown_log_level_is_an_error() {
        let mut cfg = Config::default();
        assert!(cfg
            .apply_overrides(|name| (name == "LOG_LEVEL").then(|| "verbose".to_string()))
            .is_err());
    }

    #[test]
    fn test_bad_override_is_an_error() {
        let mut cfg = Config::default();
        assert!(cfg
            .apply_overrides(|name| (name == "REDIS_POOL_SIZE").then(|| "many".to_string()))
            .is_err());
        assert!(cfg
            .apply_overrides(|name| (name == "ENVIRONMENT").then(|| "moon".to_string()))
            .is_err());
    }
}
