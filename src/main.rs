mod config;
mod daemon;
mod handle;
mod history;
mod ipc;
mod ring;
mod socket_client;
mod socket_server;
mod window_system;

use anyhow::{Context, Result};
use config::{Command, Config};
use daemon::Daemon;
use ipc::IpcCommand;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Get the path to the pidfile
fn get_pidfile_path() -> Result<PathBuf> {
    // Try to use XDG_RUNTIME_DIR, fall back to ~/.cache
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join("sway-focus-ring.pid"))
}

/// Check if another instance is already running
fn check_pidfile() -> Result<()> {
    let pidfile = get_pidfile_path()?;

    if pidfile.exists() {
        // Read the PID from the file
        let pid_str = fs::read_to_string(&pidfile).context("Failed to read pidfile")?;
        let pid: u32 = pid_str.trim().parse().context("Invalid PID in pidfile")?;

        // Check if the process is still running
        if process_exists(pid) {
            anyhow::bail!(
                "Another instance of sway-focus-ring is already running (PID: {}). \
                 If this is incorrect, remove the pidfile at: {}",
                pid,
                pidfile.display()
            );
        } else {
            // Stale pidfile, remove it
            info!("Removing stale pidfile (PID {} not found)", pid);
            if let Err(e) = fs::remove_file(&pidfile) {
                tracing::warn!("Failed to remove stale pidfile: {}", e);
            }
        }
    }

    Ok(())
}

/// Check if a process with the given PID exists
fn process_exists(pid: u32) -> bool {
    // Check if /proc/<pid> exists (Linux-specific, but this is for Sway which is Linux-only)
    PathBuf::from(format!("/proc/{}", pid)).exists()
}

/// Create the pidfile
fn create_pidfile() -> Result<PidfileGuard> {
    let pidfile = get_pidfile_path()?;
    let pid = std::process::id();

    fs::write(&pidfile, pid.to_string()).context("Failed to write pidfile")?;

    info!("Created pidfile at {} with PID {}", pidfile.display(), pid);

    Ok(PidfileGuard { path: pidfile })
}

/// Guard that removes the pidfile when dropped
struct PidfileGuard {
    path: PathBuf,
}

impl Drop for PidfileGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            error!("Failed to remove pidfile: {}", e);
        } else {
            info!("Removed pidfile at {}", self.path.display());
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let config = Config::parse();

    // Initialize logging
    let log_level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Subcommands other than `daemon` are one-shot clients
    match config.command() {
        Command::Daemon => {}
        Command::Next => socket_client::send_command_and_exit(IpcCommand::Next),
        Command::OtherMonitor => socket_client::send_command_and_exit(IpcCommand::OtherMonitor),
        Command::OtherDesktop => socket_client::send_command_and_exit(IpcCommand::OtherDesktop),
        Command::Desktop { number } => {
            socket_client::send_command_and_exit(IpcCommand::Desktop(number))
        }
        Command::LastDesktop => socket_client::send_command_and_exit(IpcCommand::LastDesktop),
        Command::Toggle => socket_client::send_command_and_exit(IpcCommand::Toggle),
        Command::Status => socket_client::send_command_and_exit(IpcCommand::Status),
        Command::Shutdown => socket_client::send_command_and_exit(IpcCommand::Shutdown),
    }

    // Ignore SIGUSR1 signal to prevent crashes
    #[cfg(unix)]
    unsafe {
        use libc::{signal, SIGUSR1, SIG_IGN};
        signal(SIGUSR1, SIG_IGN);
    }

    info!("Starting sway-focus-ring daemon");

    // Check if another instance is already running
    check_pidfile()?;

    // Create pidfile (will be automatically removed when the guard is dropped)
    let _pidfile_guard = create_pidfile()?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(async {
        let (command_rx, _socket_guard) = socket_server::start_server().await?;

        let daemon = Daemon::new()?;
        info!("Starting daemon event loop");
        daemon.run(command_rx).await
    })?;

    info!("Daemon exited");
    Ok(())
}
