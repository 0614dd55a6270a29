//! Window-system and virtual-desktop abstractions plus their sway backends.
//!
//! The focus history only ever needs a handful of read-only queries; putting
//! them behind traits keeps the history testable with fake implementations,
//! the same way the real connection is mockable here.

use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use swayipc::{Connection, Node, NodeType};
use tracing::warn;

use crate::handle::{MonitorId, WindowHandle};

/// Read-only view of the OS window system, plus the focus side effect used by
/// the daemon (never by the history itself).
pub trait WindowSystem {
    fn is_visible(&self, handle: WindowHandle) -> bool;

    fn title(&self, handle: WindowHandle) -> String;

    /// Monitor the window is on; the null monitor when unknown.
    fn monitor(&self, handle: WindowHandle) -> MonitorId;

    /// Currently focused window, `WindowHandle::NONE` when there is none.
    fn foreground_window(&self) -> WindowHandle;

    fn focus(&self, handle: WindowHandle) -> Result<()>;
}

/// Read-only view of the virtual-desktop system, plus the desktop-switch side
/// effect used by the daemon.
pub trait DesktopSystem {
    /// Active desktop number, -1 when it cannot be resolved.
    fn current_desktop(&self) -> i32;

    /// Desktop number of the given window, -1 when it cannot be resolved.
    fn desktop_of(&self, handle: WindowHandle) -> i32;

    fn go_to_desktop(&self, desktop: i32) -> Result<()>;
}

/// Where a window sits in the sway tree: the output and workspace enclosing
/// it, captured during a single walk.
struct WindowPlace {
    visible: bool,
    title: String,
    output: Option<String>,
    workspace: Option<String>,
}

/// Both collaborator traits backed by one sway IPC connection.
///
/// Windows are container ids, monitors are output names, desktops are
/// workspace numbers. Queries take `&self` so they can run inside the focus
/// history's critical section; the connection lives behind its own mutex.
pub struct SwaySystem {
    connection: Mutex<Connection>,
}

impl SwaySystem {
    pub fn new() -> Result<Self> {
        let connection = Connection::new()?;
        Ok(SwaySystem {
            connection: Mutex::new(connection),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn place_of(&self, handle: WindowHandle) -> Option<WindowPlace> {
        if handle.is_none() {
            return None;
        }
        let tree = match self.conn().get_tree() {
            Ok(tree) => tree,
            Err(e) => {
                warn!("get_tree failed: {}", e);
                return None;
            }
        };
        find_window(&tree, handle.0, None, None)
    }

    /// Map a workspace name to its number via the workspaces reply.
    fn workspace_number(&self, name: &str) -> i32 {
        match self.conn().get_workspaces() {
            Ok(workspaces) => workspaces
                .iter()
                .find(|ws| ws.name == name)
                .map(|ws| ws.num)
                .unwrap_or(-1),
            Err(e) => {
                warn!("get_workspaces failed: {}", e);
                -1
            }
        }
    }
}

impl WindowSystem for SwaySystem {
    fn is_visible(&self, handle: WindowHandle) -> bool {
        self.place_of(handle).map(|p| p.visible).unwrap_or(false)
    }

    fn title(&self, handle: WindowHandle) -> String {
        self.place_of(handle).map(|p| p.title).unwrap_or_default()
    }

    fn monitor(&self, handle: WindowHandle) -> MonitorId {
        self.place_of(handle)
            .and_then(|p| p.output)
            .map(MonitorId::new)
            .unwrap_or_else(MonitorId::none)
    }

    fn foreground_window(&self) -> WindowHandle {
        let tree = match self.conn().get_tree() {
            Ok(tree) => tree,
            Err(e) => {
                warn!("get_tree failed: {}", e);
                return WindowHandle::NONE;
            }
        };
        find_focused_window(&tree)
            .map(WindowHandle)
            .unwrap_or(WindowHandle::NONE)
    }

    fn focus(&self, handle: WindowHandle) -> Result<()> {
        self.conn()
            .run_command(format!("[con_id={}] focus", handle.0))?;
        Ok(())
    }
}

impl DesktopSystem for SwaySystem {
    fn current_desktop(&self) -> i32 {
        match self.conn().get_workspaces() {
            Ok(workspaces) => workspaces
                .iter()
                .find(|ws| ws.focused)
                .map(|ws| ws.num)
                .unwrap_or(-1),
            Err(e) => {
                warn!("get_workspaces failed: {}", e);
                -1
            }
        }
    }

    fn desktop_of(&self, handle: WindowHandle) -> i32 {
        match self.place_of(handle).and_then(|p| p.workspace) {
            Some(name) => self.workspace_number(&name),
            None => -1,
        }
    }

    fn go_to_desktop(&self, desktop: i32) -> Result<()> {
        self.conn()
            .run_command(format!("workspace number {}", desktop))?;
        Ok(())
    }
}

fn is_window(node: &Node) -> bool {
    // Views have a pid, containers don't
    matches!(node.node_type, NodeType::Con | NodeType::FloatingCon) && node.pid.is_some()
}

/// Walk the tree looking for the container with `id`, carrying the enclosing
/// output and workspace names downward.
fn find_window<'a>(
    node: &'a Node,
    id: i64,
    output: Option<&'a str>,
    workspace: Option<&'a str>,
) -> Option<WindowPlace> {
    let output = if node.node_type == NodeType::Output {
        node.name.as_deref().or(output)
    } else {
        output
    };
    let workspace = if node.node_type == NodeType::Workspace {
        node.name.as_deref().or(workspace)
    } else {
        workspace
    };

    if node.id == id && is_window(node) {
        return Some(WindowPlace {
            visible: node.visible.unwrap_or(false),
            title: node.name.clone().unwrap_or_default(),
            output: output.map(str::to_owned),
            workspace: workspace.map(str::to_owned),
        });
    }

    node.nodes
        .iter()
        .chain(node.floating_nodes.iter())
        .find_map(|child| find_window(child, id, output, workspace))
}

/// Find the currently focused window (not merely a focused container).
fn find_focused_window(node: &Node) -> Option<i64> {
    if node.focused && is_window(node) {
        return Some(node.id);
    }

    node.nodes
        .iter()
        .chain(node.floating_nodes.iter())
        .find_map(find_focused_window)
}
