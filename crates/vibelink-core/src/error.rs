//! Error types shared across the publish pipeline.

use thiserror::Error;

/// Errors reading a sample source.
///
/// These are file-level failures. A caller that cannot load a source
/// skips that source's publish session and moves on; malformed
/// individual rows are handled by the loader itself (skipped and
/// counted), not reported through this type.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not parseable as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

/// Errors deriving summary features from a signal vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// The signal vector has no samples. An empty signal is a malformed
    /// input; callers record it as a failed delivery rather than
    /// aborting the session.
    #[error("signal vector is empty")]
    EmptySignal,
}

/// Errors establishing a broker connection.
///
/// Each CONNACK refusal cause the broker can report is a distinct
/// variant; all of them abort the session before any publish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The broker does not accept the protocol revision.
    #[error("broker refused connection: unacceptable protocol version")]
    ProtocolVersion,

    /// The broker rejected the client identifier.
    #[error("broker refused connection: client identifier rejected")]
    BadClientId,

    /// The broker is up but refusing service.
    #[error("broker refused connection: service unavailable")]
    ServiceUnavailable,

    /// The user name or password is malformed or wrong.
    #[error("broker refused connection: bad user name or password")]
    BadCredentials,

    /// The client is not authorized to connect.
    #[error("broker refused connection: not authorized")]
    NotAuthorized,

    /// The broker could not be reached at the transport level.
    #[error("broker unreachable: {0}")]
    Unreachable(String),

    /// No CONNACK arrived within the configured deadline.
    #[error("connection attempt timed out after {0}s")]
    Timeout(u64),
}

/// Errors from misusing a delivery channel.
///
/// Ordinary transport failures are not errors: `publish` reports them as
/// failed [`DeliveryOutcome`](crate::channel::DeliveryOutcome)s so the
/// session keeps running. This type only covers contract violations and
/// connection establishment.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// `publish` was called outside the `Connected` state.
    #[error("channel is not connected")]
    NotConnected,

    /// Connection establishment failed.
    #[error(transparent)]
    Connect(#[from] ConnectError),
}
