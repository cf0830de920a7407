//! Core data model and seams for the VibeLink sample publisher.
//!
//! This crate defines everything the transport layer and the CLI share:
//! row records and the CSV source that produces them, the fault
//! classification catalog, signal feature derivation, the message
//! envelope, configuration types, and the [`DeliveryChannel`] trait that
//! decouples the publish driver from any concrete broker client.

pub mod channel;
pub mod config;
pub mod datasource;
pub mod envelope;
pub mod error;
pub mod faults;
pub mod features;

pub use channel::{ChannelState, DeliveryChannel, DeliveryOutcome, RunSummary};
pub use config::{BrokerConfig, PacingConfig, Qos, SourceConfig};
pub use datasource::{CsvSource, LoadedSource, MalformedRow, RowRecord};
pub use envelope::Envelope;
pub use error::{ChannelError, ConnectError, FeatureError, SourceError};
pub use faults::{FaultCatalog, FaultClass, FaultLevel};
pub use features::SignalFeatures;
