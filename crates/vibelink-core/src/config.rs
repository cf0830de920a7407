//! Configuration types for the publish pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// MQTT quality-of-service level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Qos {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl Default for Qos {
    fn default() -> Self {
        // Broker-acknowledged delivery; duplicates possible, loss not.
        Self::AtLeastOnce
    }
}

impl TryFrom<u8> for Qos {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            other => Err(other),
        }
    }
}

/// Broker connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker host name or address.
    pub host: String,

    /// Broker port (default 1883).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Client ID. Generated when not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Keep-alive interval in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// QoS level for published messages.
    #[serde(default)]
    pub qos: Qos,

    /// Deadline for the CONNACK handshake in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    1883
}

fn default_keep_alive() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    30
}

impl BrokerConfig {
    /// Create a configuration for the given broker host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            client_id: None,
            username: None,
            password: None,
            keep_alive_secs: default_keep_alive(),
            qos: Qos::default(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set authentication.
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the client ID.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the QoS level.
    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }

    /// Get the full broker address.
    pub fn broker_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pacing knobs for a publish session.
///
/// The session is rate-limited by fixed delays rather than readiness
/// polling: a settle pause after connect, a pause between messages, and
/// a bounded acknowledgment drain before disconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause after connect before the first publish, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Pause between consecutive messages, in milliseconds.
    #[serde(default = "default_per_message_ms")]
    pub per_message_ms: u64,

    /// Upper bound on waiting for outstanding acknowledgments at close,
    /// in milliseconds.
    #[serde(default = "default_drain_ms")]
    pub drain_ms: u64,
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_per_message_ms() -> u64 {
    200
}

fn default_drain_ms() -> u64 {
    2000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            per_message_ms: default_per_message_ms(),
            drain_ms: default_drain_ms(),
        }
    }
}

impl PacingConfig {
    /// Settle pause as a [`Duration`].
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Inter-message pause as a [`Duration`].
    pub fn per_message(&self) -> Duration {
        Duration::from_millis(self.per_message_ms)
    }

    /// Acknowledgment drain bound as a [`Duration`].
    pub fn drain(&self) -> Duration {
        Duration::from_millis(self.drain_ms)
    }
}

/// One tabular sample source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the CSV file.
    pub path: PathBuf,

    /// Whether rows carry a `label` column.
    pub labeled: bool,

    /// Width of the signal vector; signal columns are the headers that
    /// parse as integers in `1..=signal_width`.
    #[serde(default = "default_signal_width")]
    pub signal_width: usize,
}

fn default_signal_width() -> usize {
    6000
}

impl SourceConfig {
    /// A labeled source (training data with a `label` column).
    pub fn labeled(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            labeled: true,
            signal_width: default_signal_width(),
        }
    }

    /// An unlabeled source (rows await prediction downstream).
    pub fn unlabeled(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            labeled: false,
            signal_width: default_signal_width(),
        }
    }

    /// Set the signal vector width.
    pub fn with_signal_width(mut self, width: usize) -> Self {
        self.signal_width = width;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_config() {
        let config = BrokerConfig::new("192.168.1.100")
            .with_port(1884)
            .with_auth("algo", "secret")
            .with_client_id("sender-1");

        assert_eq!(config.host, "192.168.1.100");
        assert_eq!(config.port, 1884);
        assert_eq!(config.username, Some("algo".to_string()));
        assert_eq!(config.password, Some("secret".to_string()));
        assert_eq!(config.client_id, Some("sender-1".to_string()));
        assert_eq!(config.broker_addr(), "192.168.1.100:1884");
    }

    #[test]
    fn test_broker_config_defaults() {
        let config = BrokerConfig::new("localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.qos, Qos::AtLeastOnce);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_qos_from_u8() {
        assert_eq!(Qos::try_from(0), Ok(Qos::AtMostOnce));
        assert_eq!(Qos::try_from(1), Ok(Qos::AtLeastOnce));
        assert_eq!(Qos::try_from(2), Ok(Qos::ExactlyOnce));
        assert_eq!(Qos::try_from(3), Err(3));
    }

    #[test]
    fn test_pacing_defaults() {
        let pacing = PacingConfig::default();
        assert_eq!(pacing.settle(), Duration::from_millis(1000));
        assert_eq!(pacing.per_message(), Duration::from_millis(200));
        assert_eq!(pacing.drain(), Duration::from_millis(2000));
    }
}
