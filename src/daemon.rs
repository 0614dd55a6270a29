use crate::handle::WindowHandle;
use crate::history::FocusHistory;
use crate::ipc::{IpcCommand, IpcResponse};
use crate::socket_server::CommandRequest;
use crate::window_system::{DesktopSystem, SwaySystem, WindowSystem};
use anyhow::Result;
use futures_lite::stream::StreamExt;
use swayipc_async::{Connection, Event, EventType, WindowChange, WorkspaceChange};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events distilled from the sway subscription.
#[derive(Debug, Clone)]
enum SwayEvent {
    /// A window received focus
    Focus(WindowHandle),
    /// A window moved (possibly to another workspace or output)
    Moved(WindowHandle),
    /// The focused workspace changed; carries the workspace we left
    LeftDesktop(i32),
}

pub struct Daemon<S> {
    history: FocusHistory<S>,
}

impl Daemon<SwaySystem> {
    pub fn new() -> Result<Self> {
        Ok(Self::with_system(SwaySystem::new()?))
    }
}

impl<S: WindowSystem + DesktopSystem> Daemon<S> {
    pub fn with_system(system: S) -> Self {
        Daemon {
            history: FocusHistory::new(system),
        }
    }

    /// Main event loop: IPC commands on one channel, sway events on the
    /// other. Returns when a shutdown command arrives.
    pub async fn run(self, mut command_rx: mpsc::UnboundedReceiver<CommandRequest>) -> Result<()> {
        // Track whatever is focused right now, so the first cycle works
        // without waiting for a focus event
        let current = self.history.system().foreground_window();
        if !current.is_none() {
            self.history.add_or_move_to_front(current);
        }

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let sway_events = tokio::spawn(async move {
            if let Err(e) = monitor_sway_events(event_tx).await {
                error!("Sway event monitoring error: {}", e);
            }
        });

        loop {
            tokio::select! {
                Some(request) = command_rx.recv() => {
                    if self.handle_command(request) {
                        info!("Shutdown requested");
                        break;
                    }
                }
                Some(event) = event_rx.recv() => {
                    self.handle_sway_event(event);
                }
                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        sway_events.abort();
        Ok(())
    }

    /// Execute one IPC command and answer it. Returns true on shutdown.
    fn handle_command(&self, request: CommandRequest) -> bool {
        debug!("Handling command: {:?}", request.command);

        let response = match request.command {
            IpcCommand::Next => self.focus_result(self.history.next_in_current_context()),
            IpcCommand::OtherMonitor => {
                self.focus_result(self.history.last_focused_on_different_monitor())
            }
            IpcCommand::OtherDesktop => match self.history.last_focused_on_different_desktop() {
                Some(window) => {
                    let desktop = self.history.system().desktop_of(window);
                    self.switch_and_focus(desktop, Some(window))
                }
                None => IpcResponse::Ok,
            },
            IpcCommand::Desktop(desktop) => {
                let window = self.history.last_focused_window_on_desktop(desktop);
                self.switch_and_focus(desktop, window)
            }
            IpcCommand::LastDesktop => {
                let desktop = self.history.last_focused_desktop();
                if desktop < 0 {
                    debug!("No last-focused desktop recorded yet");
                    IpcResponse::Ok
                } else {
                    let window = self.history.last_focused_window_on_desktop(desktop);
                    self.switch_and_focus(desktop, window)
                }
            }
            IpcCommand::Toggle => {
                let current = self.history.system().foreground_window();
                self.history.toggle_window_management(current);
                IpcResponse::Ok
            }
            IpcCommand::Status => IpcResponse::Status {
                report: self.history.status_report(),
            },
            IpcCommand::Shutdown => IpcResponse::Ok,
        };

        let shutdown = request.command == IpcCommand::Shutdown;
        if request.respond.send(response).is_err() {
            debug!("Client went away before the response was sent");
        }
        shutdown
    }

    /// Focus `window` when present; "nothing to focus" is a normal outcome.
    fn focus_result(&self, window: Option<WindowHandle>) -> IpcResponse {
        match window {
            Some(window) => match self.history.system().focus(window) {
                Ok(()) => IpcResponse::Ok,
                Err(e) => {
                    warn!("Failed to focus window {}: {}", window, e);
                    IpcResponse::Error(format!("Failed to focus window: {}", e))
                }
            },
            None => {
                debug!("No window to switch to");
                IpcResponse::Ok
            }
        }
    }

    fn switch_and_focus(&self, desktop: i32, window: Option<WindowHandle>) -> IpcResponse {
        if desktop >= 0 {
            if let Err(e) = self.history.system().go_to_desktop(desktop) {
                warn!("Failed to switch to desktop {}: {}", desktop, e);
                return IpcResponse::Error(format!("Failed to switch desktop: {}", e));
            }
        }
        self.focus_result(window)
    }

    fn handle_sway_event(&self, event: SwayEvent) {
        match event {
            SwayEvent::Focus(window) => {
                debug!("Window {} focused", window);
                self.history.add_or_move_to_front(window);
            }
            SwayEvent::Moved(window) => {
                debug!("Window {} moved", window);
                self.history.handle_window_location_change(window);
            }
            SwayEvent::LeftDesktop(desktop) => {
                debug!("Left desktop {}", desktop);
                self.history.set_last_focused_desktop(desktop);
            }
        }
    }
}

/// Workspace numbers come from the workspace name: either the whole name
/// ("3") or a numeric prefix ("3: web"). -1 when the name has no number,
/// matching sway's own num for named workspaces.
fn workspace_number_from_name(name: &str) -> i32 {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(-1)
}

/// Subscribe to sway window and workspace events and forward the relevant
/// ones.
async fn monitor_sway_events(event_tx: mpsc::UnboundedSender<SwayEvent>) -> Result<()> {
    let subs = [EventType::Window, EventType::Workspace];
    let mut events = Connection::new().await?.subscribe(&subs).await?;

    info!("Subscribed to sway window and workspace events");

    while let Some(event) = events.next().await {
        let forwarded = match event? {
            Event::Window(e) => match e.change {
                WindowChange::Focus => Some(SwayEvent::Focus(WindowHandle(e.container.id))),
                WindowChange::Move | WindowChange::Floating => {
                    Some(SwayEvent::Moved(WindowHandle(e.container.id)))
                }
                _ => None,
            },
            Event::Workspace(e) => {
                if e.change == WorkspaceChange::Focus {
                    e.old
                        .as_ref()
                        .and_then(|node| node.name.as_deref())
                        .map(workspace_number_from_name)
                        .filter(|&num| num >= 0)
                        .map(SwayEvent::LeftDesktop)
                } else {
                    None
                }
            }
            _ => None,
        };

        if let Some(event) = forwarded {
            if event_tx.send(event).is_err() {
                warn!("Event receiver dropped, stopping sway event monitoring");
                break;
            }
        }
    }

    Ok(())
}
