//! triggerd - The Signal K trigger service
//!
//! This is the main entry point for the triggerd service.
//! It wires together all the components:
//! - Configuration loading (and reload on SIGHUP)
//! - In-memory data model fed by Signal K deltas, one JSON object per line
//! - Trigger engine
//! - Notification output, one JSON object per line on stdout

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use trigger_api::{ProviderStatus, UpdateBatch};
use trigger_config::{TriggerSettings, load_config};
use trigger_core::{CoreEvent, TriggerEngine};
use trigger_host::{
    JsonLinesSink, LogStatusReporter, MemoryDataModel, NotificationSink, StatusReporter,
};
use trigger_util::{MonotonicInstant, default_config_path};

/// Deltas buffered between the reader task and the evaluation loop
const INPUT_QUEUE_DEPTH: usize = 1024;

/// How often expired debounce records are dropped
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// triggerd - Signal K trigger service
#[derive(Parser, Debug)]
#[command(name = "triggerd")]
#[command(about = "Emit events when conditions over Signal K data change", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/signalk-trigger/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Read deltas from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    config_path: PathBuf,
    engine: TriggerEngine,
    model: MemoryDataModel,
    sink: Box<dyn NotificationSink>,
    status: Box<dyn StatusReporter>,
    startup_timer: Option<JoinHandle<()>>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            variables = settings.variables.len(),
            triggers = settings.triggers.len(),
            "Configuration loaded"
        );

        let mut service = Self {
            config_path: args.config.clone(),
            engine: TriggerEngine::new(),
            model: Self::new_model(&settings),
            sink: Box::new(JsonLinesSink::stdout()),
            status: Box::new(LogStatusReporter::new()),
            startup_timer: None,
        };
        service.apply_settings(&settings);
        Ok(service)
    }

    fn new_model(settings: &TriggerSettings) -> MemoryDataModel {
        match &settings.self_id {
            Some(self_id) => MemoryDataModel::new().with_self_id(self_id.clone()),
            None => MemoryDataModel::new(),
        }
    }

    /// Configure the engine and arm the startup timer
    fn apply_settings(&mut self, settings: &TriggerSettings) {
        if let Some(timer) = self.startup_timer.take() {
            timer.abort();
        }

        let report = self.engine.configure(settings, MonotonicInstant::now());
        self.status.set_status(report.status);

        if !settings.startup_silence.is_zero() {
            let release = self.engine.startup_release();
            let silence = settings.startup_silence;
            self.startup_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(silence).await;
                release.release();
                info!("Startup silence elapsed");
            }));
        }
    }

    /// Rebuild the engine from the config file. A config that fails to load
    /// leaves the running triggers in place.
    fn reload(&mut self) {
        let settings = match load_config(&self.config_path) {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "Failed to reload configuration, keeping current triggers");
                return;
            }
        };

        if settings.self_id.as_ref() != self.model.self_id() {
            info!("Self id changed, discarding data model");
            self.model = Self::new_model(&settings);
        }

        self.engine.reset();
        self.engine = TriggerEngine::new();
        self.apply_settings(&settings);

        info!(triggers = self.engine.triggers().len(), "Configuration reloaded");
    }

    async fn run(mut self, input: Box<dyn AsyncRead + Unpin + Send>) -> Result<()> {
        let (tx, mut batches) = mpsc::channel(INPUT_QUEUE_DEPTH);
        let reader = spawn_reader(input, tx);

        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let mut cleanup_timer = tokio::time::interval(CLEANUP_INTERVAL);

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Signal: SIGHUP - reload configuration
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    self.reload();
                }

                _ = cleanup_timer.tick() => {
                    self.engine.cleanup(MonotonicInstant::now());
                }

                batch = batches.recv() => match batch {
                    Some(batch) => self.handle_batch(&batch),
                    None => {
                        info!("End of input, shutting down");
                        break;
                    }
                },
            }
        }

        reader.abort();
        self.shutdown();
        Ok(())
    }

    fn handle_batch(&mut self, batch: &UpdateBatch) {
        if let Err(e) = self.model.apply(batch) {
            warn!(error = %e, "Skipping malformed delta");
            return;
        }

        let events = self
            .engine
            .handle_update(batch, &self.model, MonotonicInstant::now());
        for event in events {
            self.handle_core_event(event);
        }
    }

    fn handle_core_event(&mut self, event: CoreEvent) {
        match &event {
            CoreEvent::Fired {
                trigger_id,
                notification,
            } => {
                info!(
                    trigger_id = %trigger_id,
                    event = %notification.event,
                    transition = %notification.transition,
                    "Notification emitted"
                );
                if let Err(e) = self.sink.emit(trigger_id, notification) {
                    error!(trigger_id = %trigger_id, error = %e, "Failed to write notification");
                }
            }
            // Already logged by the engine
            CoreEvent::Suppressed { .. }
            | CoreEvent::EvaluationFailed { .. }
            | CoreEvent::BatchSkipped { .. } => {}
        }
    }

    fn shutdown(&mut self) {
        info!("Shutting down triggerd");

        if let Some(timer) = self.startup_timer.take() {
            timer.abort();
        }
        self.engine.reset();
        self.status.set_status(ProviderStatus::Stopped);

        info!("Shutdown complete");
    }
}

/// Read deltas line by line and queue them for the evaluation loop. The
/// channel closes at end of input.
fn spawn_reader(
    input: Box<dyn AsyncRead + Unpin + Send>,
    tx: mpsc::Sender<UpdateBatch>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(input).lines();
        let mut line_number = 0usize;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read input");
                    break;
                }
            };
            line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<UpdateBatch>(line) {
                Ok(batch) => {
                    if tx.send(batch).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(line = line_number, error = %e, "Skipping unparseable delta"),
            }
        }

        debug!(lines = line_number, "Input closed");
    })
}

async fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {:?}", path))?;
            info!(input = %path.display(), "Reading deltas from file");
            Ok(Box::new(file))
        }
        None => {
            info!("Reading deltas from stdin");
            Ok(Box::new(tokio::io::stdin()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries notifications only
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "triggerd starting");

    let input = open_input(args.input.as_ref()).await?;
    let service = Service::new(&args)?;
    service.run(input).await
}
