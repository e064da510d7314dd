//! Runner configuration
//!
//! Defines where pipelines are loaded from and how progress is reported to
//! the monitor.

use std::path::PathBuf;
use std::time::Duration;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Monitor base URL (e.g., "http://localhost:8765"); `None` disables reporting
    pub monitor_url: Option<String>,

    /// Directory holding `<name>.pipeline.yaml` definitions
    pub pipelines_dir: PathBuf,

    /// Upper bound on each reporting call
    pub report_timeout: Duration,

    /// Pause after each step, for runs meant to be watched
    pub step_delay: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(monitor_url: Option<String>) -> Self {
        Self {
            monitor_url,
            pipelines_dir: PathBuf::from("./pipelines"),
            report_timeout: Duration::from_secs(2),
            step_delay: Duration::ZERO,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MONITOR_URL (optional, default: http://localhost:8765, empty disables reporting)
    /// - PIPELINES_DIR (optional, default: ./pipelines)
    /// - REPORT_TIMEOUT (optional, seconds, default: 2)
    /// - STEP_DELAY_MS (optional, milliseconds, default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let monitor_url = match std::env::var("MONITOR_URL") {
            Ok(url) => normalize_url(&url),
            Err(_) => defaults.monitor_url,
        };

        let pipelines_dir = std::env::var("PIPELINES_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.pipelines_dir);

        let report_timeout = std::env::var("REPORT_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.report_timeout);

        let step_delay = std::env::var("STEP_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.step_delay);

        Self {
            monitor_url,
            pipelines_dir,
            report_timeout,
            step_delay,
        }
    }

    /// Replaces the monitor URL; an empty string disables reporting
    pub fn with_monitor_url(mut self, url: &str) -> Self {
        self.monitor_url = normalize_url(url);
        self
    }

    pub fn with_pipelines_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pipelines_dir = dir.into();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.monitor_url
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            anyhow::bail!("monitor_url must start with http:// or https://");
        }

        if self.report_timeout.is_zero() {
            anyhow::bail!("report_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Some("http://localhost:8765".to_string()))
    }
}

fn normalize_url(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    (!url.is_empty()).then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.monitor_url.as_deref(), Some("http://localhost:8765"));
        assert_eq!(config.pipelines_dir, PathBuf::from("./pipelines"));
        assert_eq!(config.report_timeout, Duration::from_secs(2));
        assert_eq!(config.step_delay, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.monitor_url = Some("localhost:8765".to_string());
        assert!(config.validate().is_err());

        config.monitor_url = None;
        assert!(config.validate().is_ok());

        config.report_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_url_override() {
        let config = Config::default().with_monitor_url("http://monitor:9000/");
        assert_eq!(config.monitor_url.as_deref(), Some("http://monitor:9000"));

        let disabled = Config::default().with_monitor_url("  ");
        assert!(disabled.monitor_url.is_none());
    }
}
