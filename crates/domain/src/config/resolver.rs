use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default = "default_false")]
    pub request_service_config: bool,

    #[serde(default = "default_false")]
    pub enable_srv_queries: bool,

    /// Whole-attempt timeout in milliseconds, `0` disables it.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    #[serde(default = "default_min_time_between_resolutions_ms")]
    pub min_time_between_resolutions_ms: u64,

    #[serde(default)]
    pub dns_server: Option<String>,

    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_service_config: false,
            enable_srv_queries: false,
            query_timeout_ms: default_query_timeout_ms(),
            min_time_between_resolutions_ms: default_min_time_between_resolutions_ms(),
            dns_server: None,
            backoff: BackoffConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        match self.query_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn min_time_between_resolutions(&self) -> Duration {
        Duration::from_millis(self.min_time_between_resolutions_ms)
    }

    pub fn with_srv_queries(mut self) -> Self {
        self.enable_srv_queries = true;
        self
    }

    pub fn with_service_config(mut self) -> Self {
        self.request_service_config = true;
        self
    }

    pub fn with_query_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.query_timeout_ms = timeout_ms;
        self
    }

    pub fn with_min_time_between_resolutions_ms(mut self, ms: u64) -> Self {
        self.min_time_between_resolutions_ms = ms;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_initial_ms")]
    pub initial_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_backoff_jitter")]
    pub jitter: f64,

    #[serde(default = "default_backoff_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: default_backoff_initial_ms(),
            multiplier: default_backoff_multiplier(),
            jitter: default_backoff_jitter(),
            max_ms: default_backoff_max_ms(),
        }
    }
}

impl BackoffConfig {
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

fn default_false() -> bool {
    false
}

fn default_query_timeout_ms() -> u64 {
    120_000
}

fn default_min_time_between_resolutions_ms() -> u64 {
    30_000
}

fn default_backoff_initial_ms() -> u64 {
    1_000
}

fn default_backoff_multiplier() -> f64 {
    1.6
}

fn default_backoff_jitter() -> f64 {
    0.2
}

fn default_backoff_max_ms() -> u64 {
    120_000
}
