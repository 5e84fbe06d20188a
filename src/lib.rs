// Library exports for daemonctl

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod service;

pub use cli::Command;
pub use config::ServiceDescriptor;
pub use error::{DaemonError, Result};
pub use service::{daemon, Outcome, Service};
