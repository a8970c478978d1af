//! Lifecycle supervision of the external hddtemp daemon.
//!
//! The daemon is spawned once at startup and runs until either the
//! exporter shuts down (we interrupt it and treat whatever exit status
//! follows as expected) or it dies on its own, which is fatal for the
//! whole exporter, since disk temperatures can no longer be produced.
//!
//! The "was this exit expected" decision lives in the [`ProcessState`]
//! transition table, and the supervision race runs over the
//! [`ManagedProcess`] trait so it can be exercised in tests with a fake
//! process handle.

use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use sensorex_config::HddtempConfig;

use crate::daemon::ShutdownSignal;

/// Errors from starting or probing the supervised daemon.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("hddtemp executable {0:?} not found on PATH")]
    ExecutableNotFound(String),

    #[error("failed to start {exe}: {source}")]
    Spawn {
        exe: PathBuf,
        source: std::io::Error,
    },

    #[error("hddtemp at {addr} not ready after {attempts} probes")]
    NotReady { addr: SocketAddr, attempts: u32 },
}

// ── Process state machine ───────────────────────────────────────────────

/// Lifecycle states of the supervised daemon.
///
/// `ExitedUnexpected` is the only state reachable without passing through
/// `Terminating`, and the only one that is fatal for the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Starting,
    Running,
    Terminating,
    ExitedClean,
    ExitedUnexpected,
}

/// Observed events driving the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
    Spawned,
    ShutdownRequested,
    Exited,
}

impl ProcessState {
    /// Apply one event. Terminal states absorb all further events.
    pub fn step(self, event: ProcessEvent) -> ProcessState {
        match (self, event) {
            (ProcessState::Starting, ProcessEvent::Spawned) => ProcessState::Running,
            (ProcessState::Running, ProcessEvent::ShutdownRequested) => ProcessState::Terminating,
            (ProcessState::Running, ProcessEvent::Exited) => ProcessState::ExitedUnexpected,
            (ProcessState::Terminating, ProcessEvent::Exited) => ProcessState::ExitedClean,
            (state, _) => state,
        }
    }

    /// Whether this state requires process-wide fatal shutdown.
    pub fn is_fatal(self) -> bool {
        self == ProcessState::ExitedUnexpected
    }
}

/// Terminal result of a supervision run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOutcome {
    pub state: ProcessState,
    pub exit_code: Option<i32>,
}

// ── Process handle abstraction ──────────────────────────────────────────

/// A process the supervisor can signal and reap.
///
/// `wait` must be cancel-safe: dropping an unfinished wait future must
/// leave the process reapable by a later call.
pub trait ManagedProcess: Send {
    /// OS pid, if the process has not been reaped yet.
    fn pid(&self) -> Option<u32>;

    /// Deliver the interrupt signal used for graceful termination.
    fn interrupt(&mut self) -> std::io::Result<()>;

    /// Wait for the process to exit, returning its exit code when known.
    fn wait(&mut self) -> impl Future<Output = std::io::Result<Option<i32>>> + Send;
}

/// [`ManagedProcess`] backed by a real spawned hddtemp child.
pub struct HddtempChild {
    child: Child,
}

impl ManagedProcess for HddtempChild {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn interrupt(&mut self) -> std::io::Result<()> {
        let pid = self.child.id().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "process already exited")
        })?;
        kill(Pid::from_raw(pid as i32), Signal::SIGINT).map_err(std::io::Error::from)
    }

    async fn wait(&mut self) -> std::io::Result<Option<i32>> {
        self.child.wait().await.map(|status| status.code())
    }
}

// ── Supervision ─────────────────────────────────────────────────────────

/// Race shutdown-cancellation against the process's own exit.
///
/// Shutdown first: interrupt, reap, and report `ExitedClean` whatever exit
/// status the process chose. Self-exit first: report `ExitedUnexpected`.
pub async fn supervise<P: ManagedProcess>(
    mut process: P,
    mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
) -> SupervisorOutcome {
    let mut state = ProcessState::Starting.step(ProcessEvent::Spawned);

    let self_exit = tokio::select! {
        _ = shutdown_rx.recv() => None,
        result = process.wait() => Some(result),
    };

    match self_exit {
        Some(result) => {
            state = state.step(ProcessEvent::Exited);
            let exit_code = match result {
                Ok(code) => code,
                Err(e) => {
                    warn!(error = %e, "failed to reap hddtemp");
                    None
                }
            };
            error!(code = ?exit_code, "hddtemp exited without being asked to");
            SupervisorOutcome { state, exit_code }
        }
        None => {
            state = state.step(ProcessEvent::ShutdownRequested);
            if let Err(e) = process.interrupt() {
                warn!(error = %e, "failed to signal hddtemp");
            }
            let exit_code = match process.wait().await {
                Ok(code) => code,
                Err(e) => {
                    warn!(error = %e, "failed to reap hddtemp");
                    None
                }
            };
            state = state.step(ProcessEvent::Exited);
            info!(code = ?exit_code, "hddtemp exited after shutdown request");
            SupervisorOutcome { state, exit_code }
        }
    }
}

/// Handle to the running supervision task.
pub struct Supervisor {
    task: JoinHandle<SupervisorOutcome>,
    pid: Option<u32>,
}

impl Supervisor {
    /// Resolve and launch the daemon, then start supervising it.
    ///
    /// The daemon is told to run in the foreground, bound to the
    /// configured loopback address and port, with the discovered device
    /// paths as positional arguments. Its stdout/stderr are inherited so
    /// its output lands in the exporter's log stream.
    pub fn start(
        config: &HddtempConfig,
        devices: &[PathBuf],
        shutdown_rx: broadcast::Receiver<ShutdownSignal>,
    ) -> Result<Self, SupervisorError> {
        let exe = resolve_executable(&config.executable)?;

        let mut args: Vec<String> = vec![
            "-d".to_string(),
            "-F".to_string(),
            "-l".to_string(),
            config.bind_addr.clone(),
            "-p".to_string(),
            config.port.to_string(),
        ];
        args.extend(devices.iter().map(|d| d.display().to_string()));
        info!(exe = %exe.display(), args = ?args, "starting hddtemp");

        let child = Command::new(&exe)
            .args(&args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SupervisorError::Spawn { exe, source })?;
        let pid = child.id();

        let task = tokio::spawn(supervise(HddtempChild { child }, shutdown_rx));
        Ok(Self { task, pid })
    }

    /// OS pid of the supervised daemon.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// The supervision task handle; resolves to the terminal outcome.
    pub fn into_task(self) -> JoinHandle<SupervisorOutcome> {
        self.task
    }
}

/// Find an executable on PATH, honouring an explicit path if given.
pub fn resolve_executable(name: &str) -> Result<PathBuf, SupervisorError> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        if is_executable(candidate) {
            return Ok(candidate.to_path_buf());
        }
        return Err(SupervisorError::ExecutableNotFound(name.to_string()));
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Ok(candidate);
        }
    }
    Err(SupervisorError::ExecutableNotFound(name.to_string()))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Probe the daemon's socket until it accepts a connection.
///
/// Replaces the fixed startup sleeps of older exporters: a bounded number
/// of connect attempts with a short delay, failing loudly if the daemon
/// never comes up.
pub async fn await_ready(
    addr: SocketAddr,
    attempts: u32,
    delay: Duration,
) -> Result<(), SupervisorError> {
    for attempt in 1..=attempts {
        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => {
                debug!(%addr, attempt, "hddtemp ready");
                return Ok(());
            }
            Err(e) => {
                debug!(%addr, attempt, error = %e, "hddtemp not ready yet");
            }
        }
        tokio::time::sleep(delay).await;
    }
    Err(SupervisorError::NotReady { addr, attempts })
}
