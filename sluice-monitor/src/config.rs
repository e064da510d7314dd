//! Monitor configuration
//!
//! Defines the listening address and per-observer buffering of the monitor.

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP/WebSocket server binds to (e.g., "0.0.0.0:8765")
    pub bind_addr: String,

    /// How many events an observer may have queued before it is dropped
    pub observer_buffer: usize,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(bind_addr: String) -> Self {
        Self {
            bind_addr,
            observer_buffer: 256,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MONITOR_BIND_ADDR (required)
    /// - OBSERVER_BUFFER (optional, default: 256)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("MONITOR_BIND_ADDR")
            .map_err(|_| anyhow::anyhow!("MONITOR_BIND_ADDR environment variable not set"))?;

        let observer_buffer = std::env::var("OBSERVER_BUFFER")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(256);

        Ok(Self {
            bind_addr,
            observer_buffer,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            anyhow::bail!("bind_addr must be a socket address like 0.0.0.0:8765");
        }

        if self.observer_buffer == 0 {
            anyhow::bail!("observer_buffer must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("0.0.0.0:8765".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8765");
        assert_eq!(config.observer_buffer, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.bind_addr = "localhost".to_string();
        assert!(config.validate().is_err());

        config.bind_addr = "127.0.0.1:9000".to_string();
        assert!(config.validate().is_ok());

        config.observer_buffer = 0;
        assert!(config.validate().is_err());
    }
}
