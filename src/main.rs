//! camrec daemon
//!
//! Runs a capture session against a camera stream, reading motion alerts
//! from stdin, one message per line.

use anyhow::Context;
use camrec::alerts::{extract_timestamp, parse_timestamp};
use camrec::config::{generate_default_config, Config, DiscoveredConfig, LoggingConfig};
use camrec::{CaptureSession, FileEventStore, LineAlertSource, ProcessSource, SharedBuffer};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "camrec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Continuous camera capture with alert-triggered event extraction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture the stream and save footage for alerts read from stdin
    Run {
        /// Config file (default: search standard locations)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Camera stream URL
        #[arg(long)]
        stream_url: Option<String>,
        /// Directory for the events/ folder
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Seconds of footage kept in memory
        #[arg(short, long)]
        retention: Option<u64>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the alert time found in a message
    Extract {
        /// Alert message text
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            stream_url,
            output_dir,
            retention,
        } => {
            let mut discovered = match config {
                Some(path) => DiscoveredConfig {
                    config: Config::load_with_env(&path)?,
                    path: Some(path),
                    failures: Vec::new(),
                },
                None => Config::discover(),
            };

            let config = &mut discovered.config;
            if let Some(url) = stream_url {
                config.capture.stream_url = Some(url);
            }
            if let Some(dir) = output_dir {
                config.events.output_dir = dir;
            }
            if let Some(secs) = retention {
                config.capture.retention_secs = secs;
            }

            init_logging(&config.logging);
            discovered.log();
            discovered.config.validate()?;

            let code = match run(discovered.config).await {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    1
                }
            };

            // stdin is read on a blocking thread the runtime would wait on at
            // shutdown, and it only returns once a line or EOF arrives
            std::process::exit(code);
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
            Ok(())
        }

        Commands::Extract { text } => {
            let raw = extract_timestamp(&text).context("No timestamp found")?;
            let ts = parse_timestamp(raw)?;
            println!("{}", ts.to_rfc3339());
            Ok(())
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("camrec={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!("camrec v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Retention {} sec, events directory {:?}",
        config.capture.retention_secs,
        config.events.output_dir
    );

    let buffer = SharedBuffer::new(config.retention());
    let store = Arc::new(FileEventStore::new(&config.events.output_dir));
    let session = CaptureSession::new(buffer, store, config.session_config());

    let mut alerts = LineAlertSource::new(tokio::io::BufReader::new(tokio::io::stdin()));
    if let Some(sender) = &config.alerts.sender {
        alerts = alerts.with_sender(sender.clone());
    }

    let mut source = ProcessSource::spawn(&config.process_config()?)
        .await
        .context("Streaming start failed")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received shutdown signal");
            }
            cancel.cancel();
        });
    }

    tracing::info!("Press Ctrl+C to interrupt");

    let result = session.run(&mut source, alerts, cancel).await;

    if let Err(e) = source.stop().await {
        tracing::warn!("Failed to stop streamer process: {}", e);
    }

    match result {
        Ok(()) => {
            tracing::info!("Capture stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Streaming end: {}", e);
            Err(e.into())
        }
    }
}
