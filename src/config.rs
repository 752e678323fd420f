//! Application-level configuration loading for tick cadence and retention.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CLUB_TIMER_BACK_CONFIG_PATH";

const DEFAULT_HISTORY_KEEP: usize = 20;
const DEFAULT_TICK_PERIOD_MS: u64 = 1000;
const DEFAULT_CLEAR_DELAY_MS: u64 = 1000;
const DEFAULT_SNAPSHOT_TTL_MS: u64 = 10_000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    history_keep: usize,
    tick_period: Duration,
    clear_delay: Duration,
    snapshot_ttl: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        history_keep = app_config.history_keep,
                        tick_period_ms = app_config.tick_period.as_millis() as u64,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// How many history entries each club retains.
    pub fn history_keep(&self) -> usize {
        self.history_keep
    }

    /// Interval between two ticks of the session clock.
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Grace period between a session finishing and its automatic reset to idle.
    pub fn clear_delay(&self) -> Duration {
        self.clear_delay
    }

    /// How long a session-start snapshot stays retrievable.
    pub fn snapshot_ttl(&self) -> Duration {
        self.snapshot_ttl
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_keep: DEFAULT_HISTORY_KEEP,
            tick_period: Duration::from_millis(DEFAULT_TICK_PERIOD_MS),
            clear_delay: Duration::from_millis(DEFAULT_CLEAR_DELAY_MS),
            snapshot_ttl: Duration::from_millis(DEFAULT_SNAPSHOT_TTL_MS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    history_keep: Option<usize>,
    tick_period_ms: Option<u64>,
    clear_delay_ms: Option<u64>,
    snapshot_ttl_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            history_keep: value.history_keep.unwrap_or(defaults.history_keep),
            tick_period: value
                .tick_period_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_period),
            clear_delay: value
                .clear_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.clear_delay),
            snapshot_ttl: value
                .snapshot_ttl_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.snapshot_ttl),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
