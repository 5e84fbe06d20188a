// Output formatting for lifecycle outcomes

use crate::daemon::{StartOutcome, StopOutcome};
use crate::service::Outcome;
use colored::*;

/// Human-readable line describing `outcome` for the service `name`
pub fn describe(name: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Started(StartOutcome::Detached(pid)) => {
            format!("Service {} started with id={}.", name, pid)
        }
        Outcome::Started(StartOutcome::AlreadyRunning(pid)) => {
            format!("Service {} is already running with id={}.", name, pid)
        }
        Outcome::Stopped(StopOutcome::Signaled(pid)) => {
            format!("Service {} stopped (id={}).", name, pid)
        }
        Outcome::Stopped(StopOutcome::NotRunning) => format!("Service {} is stopped.", name),
        Outcome::Status(status) => match status.pid {
            Some(pid) => format!("Service {} is running with id={}.", name, pid),
            None => format!("Service {} is stopped.", name),
        },
    }
}

/// Print the outcome of a lifecycle command to stdout
pub fn print_outcome(name: &str, outcome: &Outcome) {
    let message = describe(name, outcome);
    match outcome {
        Outcome::Started(_) | Outcome::Stopped(StopOutcome::Signaled(_)) => {
            println!("{} {}", "✓".green().bold(), message)
        }
        Outcome::Status(status) if status.running => {
            println!("{} {}", "●".green().bold(), message)
        }
        Outcome::Status(_) | Outcome::Stopped(StopOutcome::NotRunning) => {
            println!("{} {}", "○".bright_black(), message)
        }
    }
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}
