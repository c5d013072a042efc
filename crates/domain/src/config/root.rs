use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::ResolverConfig;

const LOCAL_CONFIG_PATH: &str = "rpcdns.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/rpcdns/config.toml";

/// Main configuration structure for rpcdns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Resolution behaviour (lookups, timeouts, backoff)
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. rpcdns.toml in current directory
    /// 3. /etc/rpcdns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::get_config_path() {
                Some(found) => Self::from_file(&found)?,
                None => Self::default(),
            },
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(server) = overrides.dns_server {
            self.resolver.dns_server = Some(server);
        }
        if overrides.enable_srv_queries {
            self.resolver.enable_srv_queries = true;
        }
        if overrides.request_service_config {
            self.resolver.request_service_config = true;
        }
        if let Some(timeout) = overrides.query_timeout_ms {
            self.resolver.query_timeout_ms = timeout;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let backoff = &self.resolver.backoff;

        if !backoff.multiplier.is_finite() || backoff.multiplier < 1.0 {
            return Err(ConfigError::Resolver {
                field: "backoff.multiplier",
                reason: format!("must be >= 1.0, got {}", backoff.multiplier),
            });
        }

        if !(0.0..=1.0).contains(&backoff.jitter) {
            return Err(ConfigError::Resolver {
                field: "backoff.jitter",
                reason: format!("must be within [0, 1], got {}", backoff.jitter),
            });
        }

        if backoff.initial_ms > backoff.max_ms {
            return Err(ConfigError::Resolver {
                field: "backoff.initial_ms",
                reason: format!(
                    "initial delay {}ms exceeds max delay {}ms",
                    backoff.initial_ms, backoff.max_ms
                ),
            });
        }

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG_PATH, SYSTEM_CONFIG_PATH]
            .into_iter()
            .find(|p| std::path::Path::new(p).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_server: Option<String>,
    pub enable_srv_queries: bool,
    pub request_service_config: bool,
    pub query_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}
