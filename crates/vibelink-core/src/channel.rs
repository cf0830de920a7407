//! Delivery channel seam and accounting types.
//!
//! The publish driver talks to the broker through [`DeliveryChannel`]
//! so it can be exercised against a scripted channel in tests and
//! against rumqttc in production.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ChannelError, ConnectError};

/// Connection lifecycle of a channel.
///
/// `Disconnected → Connecting → Connected → Disconnecting →
/// Disconnected`. Publishing is valid only in `Connected`; a lost
/// connection drops straight back to `Disconnected` (no reconnect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Result of one publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl DeliveryOutcome {
    /// A successful delivery.
    pub fn ok() -> Self {
        Self {
            success: true,
            error_code: None,
        }
    }

    /// A failed delivery with a short machine-readable code.
    pub fn failed(code: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(code.into()),
        }
    }
}

/// Aggregated accounting for one publish session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Percentage of successful deliveries, rounded to two decimals;
    /// 0.0 for an empty session.
    pub success_rate: f64,
}

impl RunSummary {
    /// Finalize a summary from the two counters.
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        let total = succeeded + failed;
        let success_rate = if total == 0 {
            0.0
        } else {
            let pct = succeeded as f64 / total as f64 * 100.0;
            (pct * 100.0).round() / 100.0
        };
        Self {
            total,
            succeeded,
            failed,
            success_rate,
        }
    }
}

/// One connection to the broker, owned for the duration of a session.
///
/// `publish` never fails for ordinary transport reasons; those come
/// back as unsuccessful [`DeliveryOutcome`]s so the caller's loop keeps
/// going. Errors are reserved for connection establishment and for
/// calling `publish` outside the `Connected` state.
#[async_trait]
pub trait DeliveryChannel {
    /// Establish the connection and start servicing it in the
    /// background.
    async fn open(&mut self) -> Result<(), ConnectError>;

    /// Publish one payload. Valid only while `Connected`.
    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<DeliveryOutcome, ChannelError>;

    /// Drain outstanding acknowledgments (bounded) and release the
    /// connection. Safe to call from any state.
    async fn close(&mut self) -> Result<(), ChannelError>;

    /// Current lifecycle state.
    fn state(&self) -> ChannelState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_arithmetic() {
        let s = RunSummary::from_counts(3, 0);
        assert_eq!(s.total, 3);
        assert_eq!(s.success_rate, 100.0);

        let s = RunSummary::from_counts(2, 1);
        assert_eq!(s.total, 3);
        assert_eq!(s.succeeded + s.failed, s.total);
        assert_eq!(s.success_rate, 66.67);
    }

    #[test]
    fn test_empty_summary_has_zero_rate() {
        let s = RunSummary::from_counts(0, 0);
        assert_eq!(s.total, 0);
        assert_eq!(s.success_rate, 0.0);
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(DeliveryOutcome::ok().success);
        assert!(DeliveryOutcome::ok().error_code.is_none());

        let failed = DeliveryOutcome::failed("connection_lost");
        assert!(!failed.success);
        assert_eq!(failed.error_code.as_deref(), Some("connection_lost"));
    }
}
