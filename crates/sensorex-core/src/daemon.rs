//! Exporter daemon — startup sequencing, shutdown, and the run loop.
//!
//! Startup order is fixed: device discovery, then hddtemp launch and
//! readiness, then collector registration, then HTTP serving. Shutdown
//! reverses it: a termination signal fans out over the broadcast channel,
//! the supervisor interrupts the daemon, and the process exits only after
//! both the serving task and the supervision task have finished.

use std::path::Path;
use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use sensorex_config::{AppConfig, ConfigError};

use crate::collector::{self, ChipCollector, HddCollector};
use crate::discovery::{self, DiscoveryError};
use crate::hddtemp::client::HddtempClient;
use crate::hwmon::HwmonEnumerator;
use crate::server::{self, AppState, ServerError};
use crate::supervisor::{self, ProcessState, Supervisor, SupervisorError, SupervisorOutcome};

/// Shutdown signal sent via broadcast channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal;

/// Errors terminating the daemon. [`DaemonError::exit_code`] maps each to
/// the exporter's process exit code.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("failed to discover HDDs: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("hddtemp exited unexpectedly (exit code {code:?})")]
    DaemonExited { code: Option<i32> },

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build metric registry: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("failed to install signal handler: {0}")]
    Signals(#[from] std::io::Error),
}

impl DaemonError {
    /// Process exit code: 1 for discovery failures and a dead or
    /// unreachable daemon, 2 for a missing executable and serving-side
    /// failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Discovery(_) | Self::DaemonExited { .. } => 1,
            Self::Supervisor(SupervisorError::NotReady { .. }) => 1,
            Self::Supervisor(_)
            | Self::Server(_)
            | Self::Config(_)
            | Self::Metrics(_)
            | Self::Signals(_) => 2,
        }
    }
}

/// The sensorex exporter daemon.
pub struct Daemon {
    config: AppConfig,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    _shutdown_rx: broadcast::Receiver<ShutdownSignal>,
}

enum Event {
    Signal(&'static str),
    SupervisorDone(SupervisorOutcome),
    ServerDone(Result<(), ServerError>),
}

impl Daemon {
    /// Create a new daemon instance with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        Self {
            config,
            shutdown_tx,
            _shutdown_rx,
        }
    }

    /// Request a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(ShutdownSignal);
    }

    /// Get a reference to the daemon's configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run until a termination signal or a fatal condition.
    pub async fn run(&self) -> Result<(), DaemonError> {
        let config = &self.config;

        let devices = discovery::discover_devices(Path::new(&config.hddtemp.device_dir))?;
        let supervisor =
            Supervisor::start(&config.hddtemp, &devices, self.shutdown_tx.subscribe())?;
        info!(pid = ?supervisor.pid(), devices = devices.len(), "hddtemp started");

        let daemon_addr = config.hddtemp.daemon_addr()?;
        if let Err(e) = supervisor::await_ready(
            daemon_addr,
            config.hddtemp.ready_attempts,
            config.hddtemp.ready_delay(),
        )
        .await
        {
            // The child is up but not serving; take it down before failing.
            let _ = self.shutdown_tx.send(ShutdownSignal);
            let _ = supervisor.into_task().await;
            return Err(e.into());
        }

        let client = HddtempClient::new(
            daemon_addr,
            config.hddtemp.connect_timeout(),
            config.hddtemp.read_timeout(),
        );
        let hdd = HddCollector::new(client, collector::hdd_family_spec()?);
        let chips = ChipCollector::new(HwmonEnumerator::new(), collector::ChipFamilySpecs::new()?);
        let registry = collector::build_registry(hdd, chips)?;

        let state = Arc::new(AppState {
            registry,
            telemetry_path: config.server.telemetry_path.clone(),
        });
        let listen_addr = config.server.listen_addr.clone();
        let server_rx = self.shutdown_tx.subscribe();
        let mut server_task: JoinHandle<Result<(), ServerError>> =
            tokio::spawn(async move { server::serve(&listen_addr, state, server_rx).await });

        let mut supervisor_task = supervisor.into_task();

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigquit = signal(SignalKind::quit())?;

        let event = tokio::select! {
            _ = sigint.recv() => Event::Signal("SIGINT"),
            _ = sigterm.recv() => Event::Signal("SIGTERM"),
            _ = sigquit.recv() => Event::Signal("SIGQUIT"),
            join = &mut supervisor_task => Event::SupervisorDone(flatten_supervisor(join)),
            join = &mut server_task => Event::ServerDone(flatten_server(join)),
        };

        match event {
            Event::Signal(sig) => {
                info!(signal = sig, "waiting for HTTP server and hddtemp to terminate");
                let _ = self.shutdown_tx.send(ShutdownSignal);
                let outcome = flatten_supervisor(supervisor_task.await);
                if outcome.state != ProcessState::ExitedClean {
                    warn!(state = ?outcome.state, "hddtemp did not stop cleanly");
                }
                flatten_server(server_task.await)?;
                info!("done, exiting");
                Ok(())
            }
            Event::SupervisorDone(outcome) => {
                error!(code = ?outcome.exit_code, "hddtemp exited before shutdown was requested");
                let _ = self.shutdown_tx.send(ShutdownSignal);
                let _ = flatten_server(server_task.await);
                Err(DaemonError::DaemonExited {
                    code: outcome.exit_code,
                })
            }
            Event::ServerDone(result) => {
                let _ = self.shutdown_tx.send(ShutdownSignal);
                let _ = supervisor_task.await;
                result?;
                warn!("HTTP server stopped without a shutdown request");
                Ok(())
            }
        }
    }
}

fn flatten_supervisor(
    join: Result<SupervisorOutcome, tokio::task::JoinError>,
) -> SupervisorOutcome {
    join.unwrap_or_else(|e| {
        error!(error = %e, "supervision task failed");
        SupervisorOutcome {
            state: ProcessState::ExitedUnexpected,
            exit_code: None,
        }
    })
}

fn flatten_server(
    join: Result<Result<(), ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    join.unwrap_or_else(|e| {
        error!(error = %e, "serving task failed");
        Err(ServerError::Serve(std::io::Error::other(e)))
    })
}
