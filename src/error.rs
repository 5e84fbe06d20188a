use std::path::PathBuf;
use thiserror::Error;

/// Which of the two detach forks failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkStage {
    First,
    Second,
}

impl std::fmt::Display for ForkStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForkStage::First => write!(f, "first"),
            ForkStage::Second => write!(f, "second"),
        }
    }
}

/// Main error type for daemonctl
#[derive(Debug, Error)]
pub enum DaemonError {
    // Detach errors
    #[error("{0} fork failed: {1}")]
    Fork(ForkStage, String),

    #[error("setsid failed: {0}")]
    Setsid(String),

    #[error("Failed to change directory to {}: {source}", path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open {stream} redirect {}: {source}", path.display())]
    RedirectOpen {
        stream: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to redirect {stream}: {reason}")]
    Redirect {
        stream: &'static str,
        reason: String,
    },

    // Pidfile errors
    #[error("PID file error at {}: {source}", path.display())]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid PID in file: {0}")]
    InvalidPid(String),

    // Signal errors
    #[error("Failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error("Failed to install termination handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),

    #[error("Failed to register exit hook")]
    ExitHook,

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for daemonctl operations
pub type Result<T> = std::result::Result<T, DaemonError>;
