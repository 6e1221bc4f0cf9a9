//! Receiver configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use parallax_core::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Default UDP port the eye tracker sends to.
pub const DEFAULT_PORT: u16 = 6768;

/// Default receive buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 512;

/// Configuration for [`EyeTrackingReceiver`](crate::EyeTrackingReceiver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Local endpoint to bind. Port 0 picks an ephemeral port.
    pub bind_addr: SocketAddr,
    /// Receive buffer size. Longer datagrams are truncated and then rejected.
    pub buffer_size: usize,
    /// Upper bound on a single blocking receive, in milliseconds.
    pub read_timeout_ms: u64,
    /// Time without a valid packet before the tracker is flagged stale.
    pub silence_timeout_ms: u64,
    /// Optional pause after each accepted packet, in milliseconds.
    pub packet_delay_ms: u64,
    /// Rebind policy after socket faults.
    pub retry: RetryConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            buffer_size: DEFAULT_BUFFER_SIZE,
            read_timeout_ms: 250,
            silence_timeout_ms: 2_000,
            packet_delay_ms: 0,
            retry: RetryConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Default configuration bound to the given address.
    #[must_use]
    pub fn with_bind_addr(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Read timeout as a [`Duration`].
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Silence timeout as a [`Duration`].
    #[must_use]
    pub const fn silence_timeout(&self) -> Duration {
        Duration::from_millis(self.silence_timeout_ms)
    }

    /// Inter-packet delay, or `None` when disabled.
    #[must_use]
    pub const fn packet_delay(&self) -> Option<Duration> {
        if self.packet_delay_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.packet_delay_ms))
        }
    }

    /// Check the configuration for values the receiver cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be > 0".into()));
        }
        // A zero read timeout means "block forever" to the socket API.
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("read_timeout_ms must be > 0".into()));
        }
        if self.silence_timeout_ms == 0 {
            return Err(ConfigError::Invalid("silence_timeout_ms must be > 0".into()));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.multiplier must be finite and > 0, got {}",
                self.retry.multiplier
            )));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tracker_endpoint() {
        let config = TrackerConfig::default();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:6768");
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.read_timeout(), Duration::from_millis(250));
        assert_eq!(config.silence_timeout(), Duration::from_secs(2));
        assert!(config.packet_delay().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "bind_addr": "0.0.0.0:7000", "packet_delay_ms": 5 }"#;
        let config: TrackerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.bind_addr.port(), 7000);
        assert_eq!(config.packet_delay(), Some(Duration::from_millis(5)));
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = TrackerConfig::default();
        config.read_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = TrackerConfig::default();
        config.buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_retry() {
        let mut config = TrackerConfig::default();
        config.retry.multiplier = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.retry.initial_delay_ms = 10_000;
        assert!(config.validate().is_err());
    }
}
