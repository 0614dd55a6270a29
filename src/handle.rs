//! Identifier types shared by the focus history and its collaborators.
//!
//! Handles and monitor ids are opaque values observed from the window system;
//! the history only ever compares and hashes them.

use std::fmt;

/// Opaque identifier for a window (a sway container id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub i64);

impl WindowHandle {
    /// Null sentinel, analogous to "no foreground window".
    pub const NONE: WindowHandle = WindowHandle(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a physical display (a sway output name).
///
/// The empty string is the null monitor, meaning "unknown/none".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorId(String);

impl MonitorId {
    pub fn new(name: impl Into<String>) -> Self {
        MonitorId(name.into())
    }

    /// The null monitor.
    pub fn none() -> Self {
        MonitorId(String::new())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "<none>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Partition key for MRU tracking: one ring exists per (desktop, monitor).
///
/// Keys are immutable values. A window that changes desktop or monitor gets a
/// different key and must move between rings, never edit a key in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub desktop: i32,
    pub monitor: MonitorId,
}

impl ContextKey {
    pub fn new(desktop: i32, monitor: MonitorId) -> Self {
        ContextKey { desktop, monitor }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "desktop {} / monitor {}", self.desktop, self.monitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_window_handle_none_sentinel() {
        assert!(WindowHandle::NONE.is_none());
        assert!(WindowHandle(0).is_none());
        assert!(!WindowHandle(42).is_none());
    }

    #[test]
    fn test_monitor_id_none_sentinel() {
        assert!(MonitorId::none().is_none());
        assert!(!MonitorId::new("DP-1").is_none());
        assert_eq!(MonitorId::new("DP-1").name(), "DP-1");
    }

    #[test]
    fn test_context_key_equality() {
        let a = ContextKey::new(0, MonitorId::new("DP-1"));
        let b = ContextKey::new(0, MonitorId::new("DP-1"));
        let c = ContextKey::new(1, MonitorId::new("DP-1"));
        let d = ContextKey::new(0, MonitorId::new("DP-2"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_context_key_as_map_key() {
        let mut map = HashMap::new();
        map.insert(ContextKey::new(0, MonitorId::new("DP-1")), "first");
        map.insert(ContextKey::new(0, MonitorId::new("DP-2")), "second");

        assert_eq!(
            map.get(&ContextKey::new(0, MonitorId::new("DP-1"))),
            Some(&"first")
        );
        assert_eq!(map.len(), 2);
    }
}
