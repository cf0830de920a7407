//! MQTT delivery channel using rumqttc.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, MqttOptions, Outgoing, Packet};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vibelink_core::channel::{ChannelState, DeliveryChannel, DeliveryOutcome};
use vibelink_core::config::{BrokerConfig, PacingConfig, Qos};
use vibelink_core::error::{ChannelError, ConnectError};

/// rumqttc request queue depth.
const REQUEST_CAP: usize = 10;

/// Poll interval while draining acknowledgments at close.
const DRAIN_POLL: Duration = Duration::from_millis(20);

/// One MQTT connection to the algorithm host.
///
/// `open` drives the event loop inline until CONNACK so every refusal
/// cause surfaces as its own [`ConnectError`]; afterwards the event
/// loop moves to a background task that services protocol frames,
/// counts PUBACKs for drain accounting, and flips the shared connected
/// flag when the link drops. No automatic reconnect.
pub struct MqttChannel {
    config: BrokerConfig,
    drain_timeout: Duration,
    state: ChannelState,
    client: Option<AsyncClient>,
    event_task: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
    inflight: Arc<AtomicUsize>,
}

impl MqttChannel {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            drain_timeout: PacingConfig::default().drain(),
            state: ChannelState::Disconnected,
            client: None,
            event_task: None,
            connected: Arc::new(AtomicBool::new(false)),
            inflight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bound the acknowledgment drain performed by `close`.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    fn options(&self) -> MqttOptions {
        let client_id = self
            .config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("vibelink-{}", Uuid::new_v4().simple()));

        let mut opts = MqttOptions::new(client_id, self.config.host.clone(), self.config.port);
        opts.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            opts.set_credentials(username.clone(), password.clone());
        }
        opts
    }

    fn map_connack(code: ConnectReturnCode) -> Result<(), ConnectError> {
        match code {
            ConnectReturnCode::Success => Ok(()),
            ConnectReturnCode::RefusedProtocolVersion => Err(ConnectError::ProtocolVersion),
            ConnectReturnCode::BadClientId => Err(ConnectError::BadClientId),
            ConnectReturnCode::ServiceUnavailable => Err(ConnectError::ServiceUnavailable),
            ConnectReturnCode::BadUserNamePassword => Err(ConnectError::BadCredentials),
            ConnectReturnCode::NotAuthorized => Err(ConnectError::NotAuthorized),
        }
    }
}

#[async_trait]
impl DeliveryChannel for MqttChannel {
    async fn open(&mut self) -> Result<(), ConnectError> {
        self.state = ChannelState::Connecting;
        let (client, mut event_loop) = AsyncClient::new(self.options(), REQUEST_CAP);

        // Poll inline until CONNACK so a refusal is attributable.
        let deadline = Duration::from_secs(self.config.connect_timeout_secs);
        let handshake = tokio::time::timeout(deadline, async {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => return Ok(ack.code),
                    Ok(_) => continue,
                    Err(e) => return Err(ConnectError::Unreachable(e.to_string())),
                }
            }
        })
        .await;

        let code = match handshake {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                self.state = ChannelState::Disconnected;
                return Err(e);
            }
            Err(_) => {
                self.state = ChannelState::Disconnected;
                return Err(ConnectError::Timeout(self.config.connect_timeout_secs));
            }
        };
        if let Err(e) = Self::map_connack(code) {
            self.state = ChannelState::Disconnected;
            return Err(e);
        }

        self.connected.store(true, Ordering::Release);
        self.inflight.store(0, Ordering::Release);

        let connected = Arc::clone(&self.connected);
        let inflight = Arc::clone(&self.inflight);
        self.event_task = Some(tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::PubAck(ack))) => {
                        debug!(pkid = ack.pkid, "publish acknowledged");
                        let _ = inflight.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                            n.checked_sub(1)
                        });
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        connected.store(false, Ordering::Release);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt event loop error, connection lost");
                        connected.store(false, Ordering::Release);
                        break;
                    }
                }
            }
        }));

        self.client = Some(client);
        self.state = ChannelState::Connected;
        info!(broker = %self.config.broker_addr(), "mqtt channel connected");
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<DeliveryOutcome, ChannelError> {
        if self.state != ChannelState::Connected {
            return Err(ChannelError::NotConnected);
        }
        let client = self.client.as_ref().ok_or(ChannelError::NotConnected)?;

        // A lost connection is a delivery failure, not misuse.
        if !self.connected.load(Ordering::Acquire) {
            self.state = ChannelState::Disconnected;
            return Ok(DeliveryOutcome::failed("connection_lost"));
        }

        self.inflight.fetch_add(1, Ordering::AcqRel);
        match client
            .publish(topic, to_rumqttc_qos(self.config.qos), false, payload)
            .await
        {
            Ok(()) => Ok(DeliveryOutcome::ok()),
            Err(e) => {
                let _ = self
                    .inflight
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
                Ok(DeliveryOutcome::failed(format!("publish_error: {e}")))
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.client.is_none() {
            // open never completed; nothing to release
            self.state = ChannelState::Disconnected;
            return Ok(());
        }
        self.state = ChannelState::Disconnecting;

        // Bounded wait for outstanding QoS-1 acknowledgments.
        let deadline = Instant::now() + self.drain_timeout;
        while self.inflight.load(Ordering::Acquire) > 0
            && self.connected.load(Ordering::Acquire)
            && Instant::now() < deadline
        {
            tokio::time::sleep(DRAIN_POLL).await;
        }
        let unacked = self.inflight.load(Ordering::Acquire);
        if unacked > 0 {
            warn!(unacked, "closing with unacknowledged publishes");
        }

        if let Some(client) = self.client.take() {
            let _ = client.disconnect().await;
        }
        if let Some(task) = self.event_task.take() {
            // The task exits once it sees the outgoing disconnect.
            let abort = task.abort_handle();
            if tokio::time::timeout(Duration::from_secs(1), task).await.is_err() {
                abort.abort();
            }
        }

        self.connected.store(false, Ordering::Release);
        self.state = ChannelState::Disconnected;
        info!("mqtt channel closed");
        Ok(())
    }

    fn state(&self) -> ChannelState {
        // A connection lost mid-session reads as Disconnected.
        if self.state == ChannelState::Connected && !self.connected.load(Ordering::Acquire) {
            ChannelState::Disconnected
        } else {
            self.state
        }
    }
}

/// Map the configured QoS onto rumqttc's.
fn to_rumqttc_qos(qos: Qos) -> rumqttc::QoS {
    match qos {
        Qos::AtMostOnce => rumqttc::QoS::AtMostOnce,
        Qos::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        Qos::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connack_mapping() {
        assert!(MqttChannel::map_connack(ConnectReturnCode::Success).is_ok());
        assert_eq!(
            MqttChannel::map_connack(ConnectReturnCode::RefusedProtocolVersion),
            Err(ConnectError::ProtocolVersion)
        );
        assert_eq!(
            MqttChannel::map_connack(ConnectReturnCode::BadClientId),
            Err(ConnectError::BadClientId)
        );
        assert_eq!(
            MqttChannel::map_connack(ConnectReturnCode::ServiceUnavailable),
            Err(ConnectError::ServiceUnavailable)
        );
        assert_eq!(
            MqttChannel::map_connack(ConnectReturnCode::BadUserNamePassword),
            Err(ConnectError::BadCredentials)
        );
        assert_eq!(
            MqttChannel::map_connack(ConnectReturnCode::NotAuthorized),
            Err(ConnectError::NotAuthorized)
        );
    }

    #[test]
    fn test_qos_mapping() {
        assert_eq!(to_rumqttc_qos(Qos::AtMostOnce), rumqttc::QoS::AtMostOnce);
        assert_eq!(to_rumqttc_qos(Qos::AtLeastOnce), rumqttc::QoS::AtLeastOnce);
        assert_eq!(to_rumqttc_qos(Qos::ExactlyOnce), rumqttc::QoS::ExactlyOnce);
    }

    #[tokio::test]
    async fn test_publish_before_open_is_misuse() {
        let mut channel = MqttChannel::new(BrokerConfig::new("localhost"));
        assert_eq!(channel.state(), ChannelState::Disconnected);

        let err = channel.publish("t", b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, ChannelError::NotConnected));
    }

    #[tokio::test]
    async fn test_close_without_open_is_safe() {
        let mut channel = MqttChannel::new(BrokerConfig::new("localhost"));
        channel.close().await.unwrap();
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }
}
