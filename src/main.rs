use anyhow::Context;
use chrono::Local;
use clap::Parser;
use daemonctl::cli::{output, CommandArgs};
use daemonctl::{logging, Service, ServiceDescriptor};
use std::path::PathBuf;
use std::time::Duration;

/// Example daemon that prints a timestamped greeting every few seconds
#[derive(Parser)]
#[command(name = "daemonctl", version, about, long_about = None)]
struct DemoCli {
    /// Service descriptor file (.toml or .json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Milliseconds between greetings
    #[arg(long, value_name = "MS", default_value_t = 3000)]
    interval_ms: u64,

    /// Return after this many greetings instead of running forever
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    #[command(flatten)]
    args: CommandArgs,
}

fn main() {
    logging::init_logging();

    if let Err(e) = run() {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = DemoCli::parse();

    let descriptor = match &cli.config {
        Some(path) => ServiceDescriptor::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ServiceDescriptor::new("ticker"),
    };

    let interval = Duration::from_millis(cli.interval_ms);
    let ticks = cli.ticks;

    let service = Service::configure(descriptor)?;
    service.run(cli.args.command, || tick(interval, ticks))?;
    Ok(())
}

fn tick(interval: Duration, ticks: Option<u64>) {
    match std::env::current_dir() {
        Ok(cwd) => tracing::info!("Ticker running in {}", cwd.display()),
        Err(e) => tracing::warn!("Ticker running in an unknown directory: {}", e),
    }

    let mut count = 0;
    while ticks.map_or(true, |limit| count < limit) {
        println!("{} hello world", Local::now().format("%Y-%m-%d %H:%M:%S"));
        std::thread::sleep(interval);
        count += 1;
    }

    tracing::info!("Ticker finished after {} greetings", count);
}
