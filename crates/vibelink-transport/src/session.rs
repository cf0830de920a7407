//! Sequential publish session.
//!
//! Drives one connection over an ordered row sequence: derive features,
//! build the envelope, publish, account for the outcome, pace, repeat.
//! One row is fully in flight before the next begins.

use thiserror::Error;
use tracing::{info, warn};

use vibelink_core::channel::{DeliveryChannel, DeliveryOutcome, RunSummary};
use vibelink_core::config::PacingConfig;
use vibelink_core::datasource::RowRecord;
use vibelink_core::envelope::Envelope;
use vibelink_core::error::{ChannelError, ConnectError, FeatureError};
use vibelink_core::faults::FaultCatalog;
use vibelink_core::features::SignalFeatures;

/// Session-fatal failures.
///
/// Row-level problems never surface here; they are recorded as failed
/// deliveries and the loop continues.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The channel could not connect; no publish was attempted.
    #[error("connection failed: {0}")]
    Connect(#[from] ConnectError),

    /// The channel was misused; indicates a bug in the driver.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Orchestrates a full publish session over one channel.
pub struct PublishSession<C> {
    channel: C,
    topic: String,
    pacing: PacingConfig,
}

impl<C: DeliveryChannel + Send> PublishSession<C> {
    pub fn new(channel: C, topic: impl Into<String>, pacing: PacingConfig) -> Self {
        Self {
            channel,
            topic: topic.into(),
            pacing,
        }
    }

    /// Run the session and return the delivery summary.
    ///
    /// A connect failure aborts before any publish and no summary is
    /// produced. Messages go out in row order; the settle pause after
    /// connect and the per-message pause are fixed delays, not
    /// readiness polls. `close` bounds the final acknowledgment drain.
    pub async fn run(
        mut self,
        rows: &[RowRecord],
        catalog: &FaultCatalog,
    ) -> Result<RunSummary, SessionError> {
        self.channel.open().await?;
        tokio::time::sleep(self.pacing.settle()).await;

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        for row in rows {
            let outcome = self.publish_row(row, catalog).await?;
            if outcome.success {
                succeeded += 1;
            } else {
                failed += 1;
            }
            tokio::time::sleep(self.pacing.per_message()).await;
        }

        self.channel.close().await?;

        let summary = RunSummary::from_counts(succeeded, failed);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            success_rate = summary.success_rate,
            "publish session finished"
        );
        Ok(summary)
    }

    async fn publish_row(
        &mut self,
        row: &RowRecord,
        catalog: &FaultCatalog,
    ) -> Result<DeliveryOutcome, SessionError> {
        let features = match SignalFeatures::derive(&row.signal) {
            Ok(features) => features,
            Err(FeatureError::EmptySignal) => {
                warn!(sample_id = row.id, "sample has an empty signal vector");
                return Ok(DeliveryOutcome::failed("empty_signal"));
            }
        };

        let envelope = Envelope::build(row, &features, catalog);
        let payload = match envelope.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(sample_id = row.id, error = %e, "sample could not be encoded");
                return Ok(DeliveryOutcome::failed("encode_error"));
            }
        };

        let outcome = self.channel.publish(&self.topic, payload).await?;
        if outcome.success {
            info!(
                sample_id = row.id,
                fault_code = %envelope.fault_code,
                "sample published"
            );
        } else {
            warn!(
                sample_id = row.id,
                error_code = outcome.error_code.as_deref().unwrap_or("unknown"),
                "sample delivery failed"
            );
        }
        Ok(outcome)
    }
}
