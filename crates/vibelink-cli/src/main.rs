//! Command-line interface for the VibeLink sample publisher.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use vibelink_core::config::{BrokerConfig, PacingConfig, Qos, SourceConfig};
use vibelink_core::datasource::CsvSource;
use vibelink_core::envelope::Envelope;
use vibelink_core::faults::FaultCatalog;
use vibelink_core::features::SignalFeatures;
use vibelink_transport::{MqttChannel, PublishSession};

/// VibeLink - stream vibration samples to an algorithm host over MQTT.
#[derive(Parser, Debug)]
#[command(name = "vibelink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish the configured sample sources, one session per source.
    Send {
        #[command(flatten)]
        broker: BrokerArgs,

        #[command(flatten)]
        pacing: PacingArgs,

        /// Topic the algorithm host subscribes to.
        #[arg(long, default_value = "bearing/fault/detection")]
        topic: String,

        /// Labeled training source (CSV with a `label` column).
        #[arg(long)]
        train: Option<PathBuf>,

        /// Unlabeled test source (rows await prediction downstream).
        #[arg(long)]
        test: Option<PathBuf>,

        /// Signal vector width (signal columns are headers 1..=WIDTH).
        #[arg(long, default_value_t = 6000)]
        signal_width: usize,
    },
    /// Load a source and preview derived features without publishing.
    Inspect {
        /// Path to the CSV file.
        path: PathBuf,

        /// Treat the source as unlabeled.
        #[arg(long)]
        unlabeled: bool,

        /// Signal vector width (signal columns are headers 1..=WIDTH).
        #[arg(long, default_value_t = 6000)]
        signal_width: usize,

        /// Number of rows to preview.
        #[arg(short = 'n', long, default_value_t = 5)]
        rows: usize,
    },
}

/// Broker connection flags.
#[derive(Args, Debug)]
struct BrokerArgs {
    /// Broker host name or address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Broker port.
    #[arg(long, default_value_t = 1883)]
    port: u16,

    /// Username (paired with --password).
    #[arg(long)]
    username: Option<String>,

    /// Password (paired with --username).
    #[arg(long)]
    password: Option<String>,

    /// Client ID; generated when omitted.
    #[arg(long)]
    client_id: Option<String>,

    /// QoS level (0, 1 or 2).
    #[arg(long, default_value_t = 1)]
    qos: u8,

    /// Keep-alive interval in seconds.
    #[arg(long, default_value_t = 60)]
    keep_alive: u64,
}

/// Session pacing flags.
#[derive(Args, Debug)]
struct PacingArgs {
    /// Pause after connect before the first publish, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// Pause between consecutive messages, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pace_ms: u64,

    /// Bound on the acknowledgment drain at close, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    drain_ms: u64,
}

impl BrokerArgs {
    fn into_config(self) -> Result<BrokerConfig> {
        let qos = Qos::try_from(self.qos)
            .map_err(|v| anyhow::anyhow!("invalid QoS level {v}, expected 0, 1 or 2"))?;

        let mut config = BrokerConfig::new(self.host)
            .with_port(self.port)
            .with_qos(qos);
        config.keep_alive_secs = self.keep_alive;
        if let Some(client_id) = self.client_id {
            config = config.with_client_id(client_id);
        }
        if let (Some(username), Some(password)) = (self.username, self.password) {
            config = config.with_auth(username, password);
        }
        Ok(config)
    }
}

impl PacingArgs {
    fn into_config(self) -> PacingConfig {
        PacingConfig {
            settle_ms: self.settle_ms,
            per_message_ms: self.pace_ms,
            drain_ms: self.drain_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Command::Send {
            broker,
            pacing,
            topic,
            train,
            test,
            signal_width,
        } => send(broker, pacing, topic, train, test, signal_width).await,
        Command::Inspect {
            path,
            unlabeled,
            signal_width,
            rows,
        } => inspect(path, unlabeled, signal_width, rows),
    }
}

async fn send(
    broker: BrokerArgs,
    pacing: PacingArgs,
    topic: String,
    train: Option<PathBuf>,
    test: Option<PathBuf>,
    signal_width: usize,
) -> Result<()> {
    if train.is_none() && test.is_none() {
        bail!("nothing to send: pass --train and/or --test");
    }

    let broker = broker.into_config()?;
    let pacing = pacing.into_config();
    let catalog = FaultCatalog::builtin();

    let sources = [(train, true, "train"), (test, false, "test")];
    for (path, labeled, kind) in sources {
        let Some(path) = path else { continue };

        let config = if labeled {
            SourceConfig::labeled(path)
        } else {
            SourceConfig::unlabeled(path)
        }
        .with_signal_width(signal_width);

        let loaded = match CsvSource::new(config).load() {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(source = kind, error = %e, "failed to load source, skipping session");
                continue;
            }
        };
        if loaded.rows.is_empty() {
            warn!(source = kind, "source produced no rows, skipping session");
            continue;
        }

        let channel = MqttChannel::new(broker.clone()).with_drain_timeout(pacing.drain());
        let session = PublishSession::new(channel, topic.as_str(), pacing.clone());
        let summary = session
            .run(&loaded.rows, &catalog)
            .await
            .with_context(|| format!("publish session for {kind} source failed"))?;

        println!("\n===== delivery summary ({kind}) =====");
        println!("total:        {}", summary.total);
        println!("succeeded:    {}", summary.succeeded);
        println!("failed:       {}", summary.failed);
        println!("success rate: {:.2}%", summary.success_rate);
    }

    Ok(())
}

fn inspect(path: PathBuf, unlabeled: bool, signal_width: usize, rows: usize) -> Result<()> {
    let config = if unlabeled {
        SourceConfig::unlabeled(path)
    } else {
        SourceConfig::labeled(path)
    }
    .with_signal_width(signal_width);

    let loaded = CsvSource::new(config).load().context("failed to load source")?;
    println!("rows: {}  skipped: {}", loaded.rows.len(), loaded.skipped);

    let catalog = FaultCatalog::builtin();
    for row in loaded.rows.iter().take(rows) {
        match SignalFeatures::derive(&row.signal) {
            Ok(features) => {
                let envelope = Envelope::build(row, &features, &catalog);
                println!(
                    "sample {:>6}  {:<8} {:<8} mean={:+.6} std={:.6} p2p={:.6}",
                    envelope.sample_id,
                    envelope.fault_code,
                    envelope.fault_level,
                    envelope.signal_features.mean,
                    envelope.signal_features.std,
                    envelope.signal_features.peak_to_peak,
                );
            }
            Err(e) => println!("sample {:>6}  <{e}>", row.id),
        }
    }

    Ok(())
}
