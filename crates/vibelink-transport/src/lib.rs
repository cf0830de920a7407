//! MQTT transport and the sequential publish driver.
//!
//! [`MqttChannel`] implements the core delivery-channel seam on top of
//! rumqttc; [`PublishSession`] drives a full session over an ordered
//! row sequence against any channel implementation.

pub mod mqtt;
pub mod session;

pub use mqtt::MqttChannel;
pub use session::{PublishSession, SessionError};
