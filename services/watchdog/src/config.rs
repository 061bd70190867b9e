//! Configuration types for the watchdog service

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub watchdog: WatchdogConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Where and how long to check backend liveness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_url")]
    pub url: String,
    /// Applied both to the HTTP client and as the watchdog's local guard
    #[serde(default = "default_check_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            url: default_health_url(),
            timeout: default_check_timeout(),
        }
    }
}

/// Reconnection loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    /// Route of the error view hosting the watchdog
    #[serde(default = "default_error_route")]
    pub error_route: String,
    #[serde(default = "default_fallback_route")]
    pub fallback_route: String,
    /// Incoming redirect parameter, i.e. where the user was before the outage
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default = "default_warn_after_failures")]
    pub warn_after_failures: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            error_route: default_error_route(),
            fallback_route: default_fallback_route(),
            redirect: None,
            warn_after_failures: default_warn_after_failures(),
        }
    }
}

/// Navigator configuration with tagged enum for extensibility
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NavigationConfig {
    /// Report the route through the log and stdout
    #[default]
    #[serde(rename = "log")]
    Log,
    /// Hand the route to the hosting application over HTTP
    #[serde(rename = "webhook")]
    Webhook { url: String },
}

/// Status dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

/// Platform REST API used by the session commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            session_file: default_session_file(),
        }
    }
}

fn default_health_url() -> String {
    "http://localhost:5000/api/v1/health".to_string()
}

fn default_check_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_interval() -> Duration {
    Duration::from_millis(2000)
}

fn default_error_route() -> String {
    "/error".to_string()
}

fn default_fallback_route() -> String {
    "/".to_string()
}

fn default_warn_after_failures() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_api_base_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from("session.json")
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::WatchdogError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject settings the watchdog cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.watchdog.interval.is_zero() {
            return Err(crate::WatchdogError::Config(
                "watchdog.interval must be greater than zero".to_string(),
            ));
        }
        if self.health.timeout.is_zero() {
            return Err(crate::WatchdogError::Config(
                "health.timeout must be greater than zero".to_string(),
            ));
        }
        if !self.watchdog.fallback_route.starts_with('/') {
            return Err(crate::WatchdogError::Config(format!(
                "watchdog.fallback_route must be an absolute route, got '{}'",
                self.watchdog.fallback_route
            )));
        }
        Ok(())
    }
}
