// Daemon module - detaching and pidfile-based lifecycle control

pub mod daemonize;
pub mod liveness;
pub mod manager;
pub mod pid;

pub use daemonize::daemonize;
pub use liveness::is_process_alive;
pub use manager::{DaemonManager, DaemonStatus, ServiceState, StartOutcome, StopOutcome};
pub use pid::PidFile;
