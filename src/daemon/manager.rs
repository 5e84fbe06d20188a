// Daemon lifecycle management

use super::daemonize::daemonize;
use super::liveness::is_process_alive;
use super::pid::PidFile;
use crate::config::ServiceDescriptor;
use crate::error::Result;
use std::fmt;

#[cfg(unix)]
use nix::sys::signal::{kill, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// State of a service, derived from its pidfile on every query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No pidfile
    NotRunning,
    /// Pidfile names a live process
    Running(u32),
    /// Pidfile exists but is malformed or names a dead process
    Stale,
}

impl ServiceState {
    pub fn pid(&self) -> Option<u32> {
        match self {
            ServiceState::Running(pid) => Some(*pid),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::NotRunning => write!(f, "not running"),
            ServiceState::Running(pid) => write!(f, "running (pid {})", pid),
            ServiceState::Stale => write!(f, "stale"),
        }
    }
}

/// What a `start` invocation ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Only seen inside the detached daemon, carrying its own pid
    Detached(u32),
    /// A live instance already exists
    AlreadyRunning(u32),
}

/// What a `stop` invocation ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// A live instance was sent SIGTERM
    Signaled(u32),
    /// Nothing was running; a stale pidfile may have been removed
    NotRunning,
}

/// Daemon status information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub pid_file: std::path::PathBuf,
}

/// Controls the lifecycle of one service through its pidfile
pub struct DaemonManager {
    descriptor: ServiceDescriptor,
    pid_file: PidFile,
}

impl DaemonManager {
    pub fn new(descriptor: ServiceDescriptor) -> Self {
        let pid_file = PidFile::with_path(&descriptor.pid_file);
        Self {
            descriptor,
            pid_file,
        }
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn pid_file(&self) -> &PidFile {
        &self.pid_file
    }

    /// Resolve the current state from the pidfile and the OS process table
    pub fn state(&self) -> ServiceState {
        if !self.pid_file.exists() {
            return ServiceState::NotRunning;
        }

        match self.pid_file.read() {
            Ok(pid) if is_process_alive(pid) => ServiceState::Running(pid),
            Ok(_) | Err(_) => ServiceState::Stale,
        }
    }

    /// Start the service unless a live instance exists.
    ///
    /// When no instance is running this detaches: the calling process exits
    /// inside and only the daemon returns, with [`StartOutcome::Detached`].
    pub fn start(&self) -> Result<StartOutcome> {
        match self.state() {
            ServiceState::Running(pid) => return Ok(StartOutcome::AlreadyRunning(pid)),
            ServiceState::Stale => {
                tracing::debug!(
                    pid_file = %self.pid_file.path().display(),
                    "Removing stale pidfile"
                );
                self.pid_file.remove()?;
            }
            ServiceState::NotRunning => {}
        }

        let pid = daemonize(&self.descriptor, &self.pid_file)?;
        Ok(StartOutcome::Detached(pid))
    }

    /// Send SIGTERM to a live instance and remove the pidfile.
    ///
    /// Does not wait for the process to exit. The pidfile is removed even
    /// when signaling fails.
    #[cfg(unix)]
    pub fn stop(&self) -> Result<StopOutcome> {
        let state = self.state();
        let signaled = match state {
            ServiceState::Running(pid) => {
                tracing::debug!(service = %self.descriptor.name, pid, "Sending SIGTERM");
                Some((pid, kill(Pid::from_raw(pid as i32), Signal::SIGTERM)))
            }
            ServiceState::NotRunning | ServiceState::Stale => None,
        };

        self.pid_file.remove()?;

        match signaled {
            Some((pid, Ok(()))) => Ok(StopOutcome::Signaled(pid)),
            Some((pid, Err(nix::errno::Errno::ESRCH))) => {
                tracing::warn!(pid, "Process exited before it could be signaled");
                Ok(StopOutcome::NotRunning)
            }
            Some((pid, Err(e))) => Err(crate::error::DaemonError::Signal {
                pid,
                reason: e.to_string(),
            }),
            None => Ok(StopOutcome::NotRunning),
        }
    }

    #[cfg(not(unix))]
    pub fn stop(&self) -> Result<StopOutcome> {
        Err(crate::error::DaemonError::Other(
            "Daemon stop is only supported on Unix systems".to_string(),
        ))
    }

    /// Inspect the service without touching the pidfile
    pub fn status(&self) -> DaemonStatus {
        let pid = self.state().pid();
        DaemonStatus {
            running: pid.is_some(),
            pid,
            pid_file: self.pid_file.path().to_path_buf(),
        }
    }

    /// Stop then start, without waiting for the old instance to exit
    pub fn restart(&self) -> Result<StartOutcome> {
        self.stop()?;
        self.start()
    }
}
