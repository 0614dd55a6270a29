//! Context-partitioned focus history.
//!
//! One MRU ring exists per (desktop, monitor) context. The history owns a
//! single lock over the whole context map and the last-focused-desktop scalar;
//! every public operation holds it for its full duration, because it is
//! invoked concurrently from the IPC command path and the sway event path.
//!
//! Every operation is total: bad input (null handle, invisible window,
//! unresolvable desktop, unknown context) is a silent no-op or `None`, never
//! an error.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::handle::{ContextKey, WindowHandle};
use crate::ring::MruRing;
use crate::window_system::{DesktopSystem, WindowSystem};

struct State {
    contexts: HashMap<ContextKey, MruRing>,
    /// Desktop the user was on before the current one; -1 until recorded.
    last_focused_desktop: i32,
}

/// MRU focus history across all (desktop, monitor) contexts.
pub struct FocusHistory<S> {
    system: S,
    state: Mutex<State>,
}

impl<S: WindowSystem + DesktopSystem> FocusHistory<S> {
    pub fn new(system: S) -> Self {
        FocusHistory {
            system,
            state: Mutex::new(State {
                contexts: HashMap::new(),
                last_focused_desktop: -1,
            }),
        }
    }

    /// The collaborator backing this history, for the side-effecting calls
    /// (focus, desktop switch) the history itself never makes.
    pub fn system(&self) -> &S {
        &self.system
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record that `handle` received focus: promote it to the front of its
    /// context's ring, creating the ring if needed.
    ///
    /// Untitled and near-untitled windows are transient surfaces (tooltips,
    /// menus) and are not tracked.
    pub fn add_or_move_to_front(&self, handle: WindowHandle) {
        if handle.is_none() || !self.system.is_visible(handle) {
            return;
        }
        if self.system.title(handle).chars().count() < 2 {
            return;
        }

        let mut state = self.lock();
        let desktop = self.system.desktop_of(handle);
        if desktop == -1 {
            return;
        }
        let monitor = self.system.monitor(handle);
        let key = ContextKey::new(desktop, monitor);

        // A handle lives in at most one ring system-wide; evict it from a
        // stale context before promoting it in the current one.
        Self::evict_from_other_contexts(&mut state, handle, &key);

        state
            .contexts
            .entry(key)
            .or_default()
            .add_or_move_to_front(handle);
        self.cleanup(&mut state);
    }

    /// Next window in the cycle for the context of the current foreground
    /// window, skipping the foreground window itself while others exist.
    pub fn next_in_current_context(&self) -> Option<WindowHandle> {
        let current = self.system.foreground_window();
        if current.is_none() {
            return None;
        }

        let mut state = self.lock();
        let desktop = self.system.current_desktop();
        let monitor = self.system.monitor(current);
        let key = ContextKey::new(desktop, monitor);

        state.contexts.get_mut(&key)?.next_in_cycle()
    }

    /// Most recently focused window on the current desktop but on a different
    /// (known) monitor.
    pub fn last_focused_on_different_monitor(&self) -> Option<WindowHandle> {
        let current_desktop = self.system.current_desktop();
        let current_monitor = self.system.monitor(self.system.foreground_window());

        let state = self.lock();
        for (key, ring) in &state.contexts {
            if key.desktop == current_desktop
                && key.monitor != current_monitor
                && !key.monitor.is_none()
            {
                if let Some(head) = ring.head_handle() {
                    if self.system.is_visible(head) {
                        return Some(head);
                    }
                }
            }
        }
        None
    }

    /// Most recently focused window on any desktop other than the current
    /// one.
    pub fn last_focused_on_different_desktop(&self) -> Option<WindowHandle> {
        let current_desktop = self.system.current_desktop();

        let state = self.lock();
        for (key, ring) in &state.contexts {
            if key.desktop != current_desktop {
                if let Some(head) = ring.head_handle() {
                    if self.system.is_visible(head) {
                        return Some(head);
                    }
                }
            }
        }
        None
    }

    /// Most recently focused window on the given desktop, any monitor.
    pub fn last_focused_window_on_desktop(&self, desktop: i32) -> Option<WindowHandle> {
        let state = self.lock();
        for (key, ring) in &state.contexts {
            if key.desktop == desktop {
                if let Some(head) = ring.head_handle() {
                    if self.system.is_visible(head) {
                        return Some(head);
                    }
                }
            }
        }
        None
    }

    /// Desktop recorded by the last `set_last_focused_desktop`, -1 if none.
    pub fn last_focused_desktop(&self) -> i32 {
        self.lock().last_focused_desktop
    }

    pub fn set_last_focused_desktop(&self, desktop: i32) {
        self.lock().last_focused_desktop = desktop;
    }

    /// React to a window changing position: if its context changed, take it
    /// out of the old ring.
    ///
    /// It is re-inserted only when the *monitor* changed to a known one; a
    /// desktop-only move leaves the window untracked until its next focus
    /// event, which re-adds it through `add_or_move_to_front`.
    pub fn handle_window_location_change(&self, handle: WindowHandle) {
        if handle.is_none() || !self.system.is_visible(handle) {
            return;
        }

        let mut state = self.lock();
        let Some(old_key) = Self::context_of(&state, handle) else {
            return;
        };

        let new_desktop = self.system.desktop_of(handle);
        let new_monitor = self.system.monitor(handle);
        let new_key = ContextKey::new(new_desktop, new_monitor.clone());
        if new_key == old_key {
            return;
        }

        debug!("window {} moved: {} -> {}", handle, old_key, new_key);
        Self::remove_from(&mut state, &old_key, handle);

        if old_key.monitor != new_monitor && !new_monitor.is_none() {
            state
                .contexts
                .entry(new_key)
                .or_default()
                .add_or_move_to_front(handle);
        }
    }

    /// Flip whether `handle` is tracked: forget it if some ring holds it,
    /// otherwise insert it into the ring for its resolved context.
    pub fn toggle_window_management(&self, handle: WindowHandle) {
        if handle.is_none() || !self.system.is_visible(handle) {
            return;
        }
        if self.system.title(handle).chars().count() < 2 {
            return;
        }

        let mut state = self.lock();
        match Self::context_of(&state, handle) {
            Some(key) => {
                debug!("untracking window {} from {}", handle, key);
                Self::remove_from(&mut state, &key, handle);
            }
            None => {
                let desktop = self.system.desktop_of(handle);
                if desktop == -1 {
                    return;
                }
                let monitor = self.system.monitor(handle);
                let key = ContextKey::new(desktop, monitor);
                debug!("tracking window {} in {}", handle, key);
                state
                    .contexts
                    .entry(key)
                    .or_default()
                    .add_or_move_to_front(handle);
            }
        }
        self.cleanup(&mut state);
    }

    /// Human-readable dump of every context and its MRU order, head first.
    pub fn status_report(&self) -> String {
        let state = self.lock();

        let mut keys: Vec<&ContextKey> = state.contexts.keys().collect();
        keys.sort_by(|a, b| {
            (a.desktop, a.monitor.name()).cmp(&(b.desktop, b.monitor.name()))
        });

        let mut out = String::new();
        let _ = writeln!(out, "Tracked contexts: {}", keys.len());
        for key in keys {
            let ring = &state.contexts[key];
            let _ = writeln!(out, "[{}] {} window(s)", key, ring.len());
            for (i, handle) in ring.handles().into_iter().enumerate() {
                let title = self.system.title(handle);
                let marker = if i == 0 { " (head)" } else { "" };
                let _ = writeln!(out, "  {}. {} \"{}\"{}", i + 1, handle, title, marker);
            }
        }
        let _ = writeln!(out, "Last focused desktop: {}", state.last_focused_desktop);
        out
    }

    /// Which context currently holds `handle`. Ring indexes are per-ring, so
    /// this is a linear scan over all rings; context counts are tiny.
    fn context_of(state: &State, handle: WindowHandle) -> Option<ContextKey> {
        state
            .contexts
            .iter()
            .find(|(_, ring)| ring.contains(handle))
            .map(|(key, _)| key.clone())
    }

    fn remove_from(state: &mut State, key: &ContextKey, handle: WindowHandle) {
        if let Some(ring) = state.contexts.get_mut(key) {
            ring.remove(handle);
            if ring.is_empty() {
                state.contexts.remove(key);
            }
        }
    }

    fn evict_from_other_contexts(state: &mut State, handle: WindowHandle, keep: &ContextKey) {
        let stale: Vec<ContextKey> = state
            .contexts
            .iter()
            .filter(|(key, ring)| *key != keep && ring.contains(handle))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            debug!("evicting window {} from stale context {}", handle, key);
            Self::remove_from(state, &key, handle);
        }
    }

    /// Drop every tracked window the window system no longer reports as
    /// visible, and every ring that ends up empty. Runs after each mutating
    /// call so memory stays bounded by currently-visible windows even when a
    /// close notification was missed.
    fn cleanup(&self, state: &mut State) {
        for (key, ring) in state.contexts.iter_mut() {
            // handles() walks at most len() nodes, so a damaged ring cannot
            // hang the cleanup pass
            let dead: Vec<WindowHandle> = ring
                .handles()
                .into_iter()
                .filter(|&h| !self.system.is_visible(h))
                .collect();
            for handle in dead {
                debug!("cleanup: dropping invisible window {} from {}", handle, key);
                ring.remove(handle);
            }
        }
        state.contexts.retain(|_, ring| !ring.is_empty());
    }
}
