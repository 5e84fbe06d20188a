// Service runner - configure once, then drive with a lifecycle command

use crate::cli::{output, Command};
use crate::config::ServiceDescriptor;
use crate::daemon::{DaemonManager, DaemonStatus, StartOutcome, StopOutcome};
use crate::error::Result;

/// Result of one lifecycle command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `start` or `restart`
    Started(StartOutcome),
    Stopped(StopOutcome),
    Status(DaemonStatus),
}

/// A configured service. Creating one has no OS-level effects.
pub struct Service {
    manager: DaemonManager,
}

/// Configure a service and return its runner
pub fn daemon(descriptor: ServiceDescriptor) -> Result<Service> {
    Service::configure(descriptor)
}

impl Service {
    /// Validate `descriptor` and pin its relative paths to the current directory
    pub fn configure(descriptor: ServiceDescriptor) -> Result<Self> {
        descriptor.validate()?;
        let cwd = std::env::current_dir()?;
        let descriptor = descriptor.resolve_relative_to(&cwd);

        Ok(Self {
            manager: DaemonManager::new(descriptor),
        })
    }

    pub fn name(&self) -> &str {
        &self.manager.descriptor().name
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        self.manager.descriptor()
    }

    pub fn manager(&self) -> &DaemonManager {
        &self.manager
    }

    /// Perform `command` without printing anything.
    ///
    /// `start` and `restart` detach when no instance is live, so they only
    /// return inside the new daemon.
    pub fn execute(&self, command: Command) -> Result<Outcome> {
        tracing::debug!(service = %self.name(), %command, "Executing command");
        match command {
            Command::Start => self.manager.start().map(Outcome::Started),
            Command::Stop => self.manager.stop().map(Outcome::Stopped),
            Command::Restart => self.manager.restart().map(Outcome::Started),
            Command::Status => Ok(Outcome::Status(self.manager.status())),
        }
    }

    /// Perform `command`, report it, and run `routine` if this process became
    /// the daemon.
    ///
    /// Every other outcome terminates the calling process with status 0.
    pub fn run<F, T>(&self, command: Command, routine: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let outcome = self.execute(command)?;
        output::print_outcome(self.name(), &outcome);

        match outcome {
            Outcome::Started(StartOutcome::Detached(_)) => Ok(routine()),
            _ => std::process::exit(0),
        }
    }
}
