// CLI module - the command surface of a daemonized program

pub mod output;

use clap::{Args, Parser, ValueEnum};
use std::fmt;

/// Lifecycle command understood by every daemonized program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Command {
    /// Detach and run the service, unless it is already running
    #[default]
    Start,
    /// Signal the running instance and remove its pidfile
    Stop,
    /// Stop, then start again
    Restart,
    /// Report whether the service is running
    Status,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Restart => "restart",
            Command::Status => "status",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The positional command, ready to be flattened into a larger parser
#[derive(Debug, Clone, Args)]
pub struct CommandArgs {
    /// Lifecycle command
    #[arg(value_enum, default_value_t = Command::Start)]
    pub command: Command,
}

/// Command line of a daemonized program: one optional positional command
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub args: CommandArgs,
}
