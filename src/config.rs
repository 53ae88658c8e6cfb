//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`indra-monitor.toml`, or the path given with `--config`)
//! 3. Environment variables, e.g. `INDRA_CONNECTION__URL` or
//!    `INDRA_POLLING__PROCESSES=15s`
//! 4. Command-line overrides, applied by the binary
//!
//! Durations are strings such as "500ms", "5s" or "2m".
//!
//! ```toml
//! [connection]
//! url = "ws://localhost:8000/api/ws/system-metrics"
//! base_delay = "1s"
//! max_delay = "30s"
//! max_attempts = 10
//!
//! [api]
//! base_url = "http://localhost:8000/api"
//! timeout = "10s"
//!
//! [polling]
//! processes = "10s"
//! insights = "0s"   # disabled
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::api::{PollIntervals, DEFAULT_BASE_URL};
use crate::data::{parse_duration, Thresholds};
use crate::store::StoreLimits;
use crate::sync::{ReconnectPolicy, SyncConfig};

/// Config file read when `--config` is not given. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "indra-monitor.toml";

/// Default live metrics endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/api/ws/system-metrics";

const ENV_PREFIX: &str = "INDRA";

/// Raw settings as read from the configuration sources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connection: ConnectionSettings,
    pub store: StoreSettings,
    pub api: ApiSettings,
    pub polling: PollingSettings,
    pub thresholds: Thresholds,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub url: String,
    pub base_delay: String,
    pub max_delay: String,
    pub max_attempts: u32,
    /// Connect on startup instead of waiting for a manual reconnect.
    pub auto_connect: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            base_delay: "1s".to_string(),
            max_delay: "30s".to_string(),
            max_attempts: 10,
            auto_connect: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub history_size: usize,
    pub max_alerts: usize,
    pub max_insights: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        let limits = StoreLimits::default();
        Self {
            history_size: limits.history_size,
            max_alerts: limits.max_alerts,
            max_insights: limits.max_insights,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: "10s".to_string(),
        }
    }
}

/// Refresh intervals. "0s" disables a refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub metrics: String,
    pub processes: String,
    pub system_info: String,
    pub insights: String,
    pub health: String,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            metrics: "5s".to_string(),
            processes: "10s".to_string(),
            system_info: "30s".to_string(),
            insights: "60s".to_string(),
            health: "10s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("indra-monitor.log"),
        }
    }
}

/// Validated, typed configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub sync: SyncConfig,
    pub limits: StoreLimits,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub polling: PollIntervals,
    pub thresholds: Thresholds,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Settings {
    /// Load from the default sources. An explicit `path` must exist; the
    /// default config file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE)
                .format(FileFormat::Toml)
                .required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Parse and validate every value.
    pub fn resolve(&self) -> Result<RuntimeConfig> {
        let url = Url::parse(&self.connection.url)
            .with_context(|| format!("Invalid connection url: {}", self.connection.url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            bail!("Connection url must use ws:// or wss://, got {}", url);
        }

        let policy = ReconnectPolicy {
            base_delay: duration("connection.base_delay", &self.connection.base_delay)?,
            max_delay: duration("connection.max_delay", &self.connection.max_delay)?,
            max_attempts: self.connection.max_attempts,
        };
        if policy.base_delay.is_zero() {
            bail!("connection.base_delay must be greater than zero");
        }
        if policy.max_delay < policy.base_delay {
            bail!("connection.max_delay must not be shorter than connection.base_delay");
        }

        let t = &self.thresholds;
        for (name, warning, critical) in [
            ("cpu", t.cpu_warning, t.cpu_critical),
            ("memory", t.memory_warning, t.memory_critical),
            ("disk", t.disk_warning, t.disk_critical),
        ] {
            if warning > critical {
                bail!("thresholds.{name}_warning must not exceed thresholds.{name}_critical");
            }
        }

        let api_timeout = duration("api.timeout", &self.api.timeout)?;
        if api_timeout.is_zero() {
            bail!("api.timeout must be greater than zero");
        }

        Ok(RuntimeConfig {
            sync: SyncConfig {
                url,
                policy,
                auto_connect: self.connection.auto_connect,
            },
            limits: StoreLimits {
                history_size: self.store.history_size,
                max_alerts: self.store.max_alerts,
                max_insights: self.store.max_insights,
            },
            api_base_url: self.api.base_url.clone(),
            api_timeout,
            polling: PollIntervals {
                metrics: duration("polling.metrics", &self.polling.metrics)?,
                processes: duration("polling.processes", &self.polling.processes)?,
                system_info: duration("polling.system_info", &self.polling.system_info)?,
                insights: duration("polling.insights", &self.polling.insights)?,
                health: duration("polling.health", &self.polling.health)?,
            },
            thresholds: self.thresholds,
            log_level: self.logging.level.clone(),
            log_file: self.logging.file.clone(),
        })
    }
}

fn duration(key: &str, value: &str) -> Result<Duration> {
    parse_duration(value).with_context(|| format!("Invalid duration for {}: {:?}", key, value))
}
