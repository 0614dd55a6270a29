use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Commands sent from the CLI client to the daemon. Bind these to sway keys,
/// e.g. `bindsym $mod+w exec sway-focus-ring next`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IpcCommand {
    /// Focus the next window in the current (desktop, monitor) context
    Next,
    /// Focus the last-used window on a different monitor of this desktop
    OtherMonitor,
    /// Focus the last-used window on a different desktop
    OtherDesktop,
    /// Go to the given desktop and focus its last-used window
    Desktop(i32),
    /// Toggle back to the previously focused desktop
    LastDesktop,
    /// Toggle tracking of the currently focused window
    Toggle,
    /// Query the daemon's tracked contexts
    Status,
    /// Shutdown the daemon gracefully
    Shutdown,
}

/// Response from daemon to CLI client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpcResponse {
    /// Command executed (possibly as a no-op; "no window found" is normal)
    Ok,
    /// Error occurred
    Error(String),
    /// Status response
    Status { report: String },
}

/// Get the path to the Unix socket
pub fn get_socket_path() -> Result<PathBuf> {
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join("sway-focus-ring.sock"))
}

/// Error returned when parsing an invalid IpcCommand string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIpcCommandError;

impl fmt::Display for ParseIpcCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid IPC command")
    }
}

impl std::error::Error for ParseIpcCommandError {}

impl FromStr for IpcCommand {
    type Err = ParseIpcCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();

        if let Some(rest) = lowered.strip_prefix("desktop") {
            let desktop: i32 = rest.trim().parse().map_err(|_| ParseIpcCommandError)?;
            if desktop < 0 {
                return Err(ParseIpcCommandError);
            }
            return Ok(IpcCommand::Desktop(desktop));
        }

        match lowered.as_str() {
            "next" => Ok(IpcCommand::Next),
            "other-monitor" => Ok(IpcCommand::OtherMonitor),
            "other-desktop" => Ok(IpcCommand::OtherDesktop),
            "last-desktop" => Ok(IpcCommand::LastDesktop),
            "toggle" => Ok(IpcCommand::Toggle),
            "status" => Ok(IpcCommand::Status),
            "shutdown" => Ok(IpcCommand::Shutdown),
            _ => Err(ParseIpcCommandError),
        }
    }
}

impl fmt::Display for IpcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpcCommand::Next => write!(f, "next"),
            IpcCommand::OtherMonitor => write!(f, "other-monitor"),
            IpcCommand::OtherDesktop => write!(f, "other-desktop"),
            IpcCommand::Desktop(n) => write!(f, "desktop {}", n),
            IpcCommand::LastDesktop => write!(f, "last-desktop"),
            IpcCommand::Toggle => write!(f, "toggle"),
            IpcCommand::Status => write!(f, "status"),
            IpcCommand::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipc_command_from_str() {
        assert_eq!("next".parse(), Ok(IpcCommand::Next));
        assert_eq!("other-monitor".parse(), Ok(IpcCommand::OtherMonitor));
        assert_eq!("other-desktop".parse(), Ok(IpcCommand::OtherDesktop));
        assert_eq!("desktop 3".parse(), Ok(IpcCommand::Desktop(3)));
        assert_eq!("last-desktop".parse(), Ok(IpcCommand::LastDesktop));
        assert_eq!("toggle".parse(), Ok(IpcCommand::Toggle));
        assert_eq!("status".parse(), Ok(IpcCommand::Status));
        assert_eq!("shutdown".parse(), Ok(IpcCommand::Shutdown));
        assert_eq!("invalid".parse::<IpcCommand>(), Err(ParseIpcCommandError));
    }

    #[test]
    fn test_ipc_command_from_str_case_insensitive() {
        assert_eq!("NEXT".parse(), Ok(IpcCommand::Next));
        assert_eq!("Next".parse(), Ok(IpcCommand::Next));
        assert_eq!("  next  ".parse(), Ok(IpcCommand::Next));
    }

    #[test]
    fn test_ipc_command_desktop_parsing() {
        assert_eq!("desktop 0".parse(), Ok(IpcCommand::Desktop(0)));
        assert_eq!("desktop 9".parse(), Ok(IpcCommand::Desktop(9)));
        assert_eq!(
            "desktop -1".parse::<IpcCommand>(),
            Err(ParseIpcCommandError)
        );
        assert_eq!("desktop".parse::<IpcCommand>(), Err(ParseIpcCommandError));
        assert_eq!("desktop x".parse::<IpcCommand>(), Err(ParseIpcCommandError));
    }

    #[test]
    fn test_ipc_command_roundtrip() {
        let commands = [
            IpcCommand::Next,
            IpcCommand::OtherMonitor,
            IpcCommand::OtherDesktop,
            IpcCommand::Desktop(4),
            IpcCommand::LastDesktop,
            IpcCommand::Toggle,
            IpcCommand::Status,
            IpcCommand::Shutdown,
        ];

        for cmd in commands {
            let s = cmd.to_string();
            let parsed: IpcCommand = s.parse().unwrap();
            assert_eq!(parsed, cmd);
        }
    }

    #[test]
    fn test_ipc_response_serialization() {
        let ok_response = IpcResponse::Ok;
        let json = serde_json::to_string(&ok_response).unwrap();
        assert!(json.contains("ok"));

        let error_response = IpcResponse::Error("test error".to_string());
        let json = serde_json::to_string(&error_response).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("test error"));

        let status_response = IpcResponse::Status {
            report: "Tracked contexts: 0".to_string(),
        };
        let json = serde_json::to_string(&status_response).unwrap();
        assert!(json.contains("status"));
        assert!(json.contains("Tracked contexts"));
    }

    #[test]
    fn test_get_socket_path() {
        let path = get_socket_path().unwrap();
        assert!(path.ends_with("sway-focus-ring.sock"));
    }
}
