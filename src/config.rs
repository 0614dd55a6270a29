use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run as daemon (default if no command specified)
    Daemon,
    /// Focus the next window in the current desktop/monitor context
    Next,
    /// Focus the last-used window on a different monitor
    OtherMonitor,
    /// Focus the last-used window on a different desktop
    OtherDesktop,
    /// Go to a desktop and focus its last-used window
    Desktop {
        /// Desktop (workspace) number
        number: i32,
    },
    /// Toggle back to the previously focused desktop
    LastDesktop,
    /// Toggle tracking of the currently focused window
    Toggle,
    /// Query daemon status
    Status,
    /// Shutdown the daemon
    Shutdown,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "sway-focus-ring")]
#[command(about = "Per-desktop, per-monitor MRU focus history for Sway", long_about = None)]
pub struct Config {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Config {
    pub fn parse() -> Self {
        <Config as Parser>::parse()
    }

    /// Get the command, defaulting to Daemon if none specified
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Daemon)
    }
}
