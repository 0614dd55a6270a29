//! Circular MRU list for a single (desktop, monitor) context.
//!
//! Nodes live in a slot arena and link to each other by slot index, with a
//! handle-to-slot map mirroring membership. Promote-to-front and removal are
//! O(1); they run inside the history's lock on every focus event, so they
//! cannot afford a linear reshuffle.

use std::collections::HashMap;

use crate::handle::WindowHandle;

#[derive(Debug, Clone)]
struct Node {
    handle: WindowHandle,
    next: usize,
    prev: usize,
}

/// One circular MRU list.
///
/// `head` is the most recently promoted window (the one currently focused in
/// this context). `cursor` is where cycling last stopped, so repeated
/// next-in-cycle calls keep walking instead of restarting.
#[derive(Debug, Default)]
pub struct MruRing {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    cursor: Option<usize>,
    index: HashMap<WindowHandle, usize>,
}

impl MruRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Handle of the most recently promoted window, if any.
    pub fn head_handle(&self) -> Option<WindowHandle> {
        self.head.map(|slot| self.node(slot).handle)
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.index.contains_key(&handle)
    }

    /// Promote `handle` to the front, inserting it first if unknown.
    ///
    /// Afterwards `head` is always the node for `handle` and the cycle cursor
    /// is reset to it.
    pub fn add_or_move_to_front(&mut self, handle: WindowHandle) {
        if let Some(&slot) = self.index.get(&handle) {
            self.move_to_front(slot);
        } else {
            let slot = self.alloc(handle);
            match self.head {
                None => {
                    // First node forms a self-linked ring
                    let node = self.node_mut(slot);
                    node.next = slot;
                    node.prev = slot;
                    self.head = Some(slot);
                }
                Some(head) => {
                    self.insert_before(head, slot);
                    self.head = Some(slot);
                }
            }
            self.index.insert(handle, slot);
        }
        self.cursor = self.head;
    }

    /// Advance the cycle cursor and return the window it lands on.
    ///
    /// The head (currently focused window) is skipped whenever the ring holds
    /// more than one node; a single-element ring keeps returning its only
    /// element.
    pub fn next_in_cycle(&mut self) -> Option<WindowHandle> {
        let head = self.head?;
        let cursor = self.cursor?;

        let mut next = self.node(cursor).next;
        if next == head && self.len() > 1 {
            next = self.node(next).next;
        }
        self.cursor = Some(next);
        Some(self.node(next).handle)
    }

    /// Remove `handle` from the ring; no-op when it is not a member.
    pub fn remove(&mut self, handle: WindowHandle) {
        let Some(slot) = self.index.remove(&handle) else {
            return;
        };

        let node = self.node(slot).clone();
        self.unlink(slot);

        if self.head == Some(slot) {
            self.head = if node.next == slot {
                None
            } else {
                Some(node.next)
            };
        }
        if self.cursor == Some(slot) {
            self.cursor = self.head;
        }

        self.nodes[slot] = None;
        self.free.push(slot);
    }

    /// Walk the ring from the head in MRU order, bounded by the ring's size so
    /// a corrupted link can never loop forever.
    pub fn handles(&self) -> Vec<WindowHandle> {
        let mut out = Vec::with_capacity(self.len());
        let Some(head) = self.head else {
            return out;
        };

        let mut slot = head;
        for _ in 0..self.len() {
            out.push(self.node(slot).handle);
            slot = self.node(slot).next;
            if slot == head {
                break;
            }
        }
        out
    }

    fn move_to_front(&mut self, slot: usize) {
        let head = match self.head {
            Some(head) if head != slot && self.len() > 1 => head,
            _ => return, // already at front, or the only node
        };

        self.unlink(slot);
        self.insert_before(head, slot);
        self.head = Some(slot);
    }

    /// Link `slot` so that `slot.next == at`, i.e. directly in front of `at`
    /// in walk order. Promotion inserts in front of the old head and then
    /// reassigns the head, which keeps the walk in strict MRU order.
    fn insert_before(&mut self, at: usize, slot: usize) {
        let before = self.node(at).prev;
        {
            let node = self.node_mut(slot);
            node.prev = before;
            node.next = at;
        }
        self.node_mut(before).next = slot;
        self.node_mut(at).prev = slot;
    }

    fn unlink(&mut self, slot: usize) {
        let Node { next, prev, .. } = *self.node(slot);
        self.node_mut(prev).next = next;
        self.node_mut(next).prev = prev;
    }

    fn alloc(&mut self, handle: WindowHandle) -> usize {
        let node = Node {
            handle,
            next: 0,
            prev: 0,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn node(&self, slot: usize) -> &Node {
        self.nodes[slot].as_ref().expect("slot points at live node")
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        self.nodes[slot].as_mut().expect("slot points at live node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(id: i64) -> WindowHandle {
        WindowHandle(id)
    }

    /// Check bidirectional link consistency and that the index matches the
    /// set of handles reachable from the head.
    fn assert_ring_invariant(ring: &MruRing) {
        let reachable = ring.handles();
        assert_eq!(reachable.len(), ring.len());
        for handle in &reachable {
            assert!(ring.contains(*handle));
        }

        for (slot, entry) in ring.nodes.iter().enumerate() {
            if let Some(node) = entry {
                assert_eq!(ring.node(node.next).prev, slot);
                assert_eq!(ring.node(node.prev).next, slot);
            }
        }
    }

    #[test]
    fn test_empty_ring() {
        let mut ring = MruRing::new();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.head_handle(), None);
        assert_eq!(ring.next_in_cycle(), None);
        assert!(ring.handles().is_empty());
    }

    #[test]
    fn test_single_node_self_links() {
        let mut ring = MruRing::new();
        ring.add_or_move_to_front(w(1));

        assert_eq!(ring.len(), 1);
        assert_eq!(ring.head_handle(), Some(w(1)));
        assert_eq!(ring.handles(), vec![w(1)]);
        assert_ring_invariant(&ring);
    }

    #[test]
    fn test_add_orders_most_recent_first() {
        let mut ring = MruRing::new();
        ring.add_or_move_to_front(w(1));
        ring.add_or_move_to_front(w(2));
        ring.add_or_move_to_front(w(3));

        assert_eq!(ring.handles(), vec![w(3), w(2), w(1)]);
        assert_ring_invariant(&ring);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut ring = MruRing::new();
        ring.add_or_move_to_front(w(1));
        ring.add_or_move_to_front(w(2));
        ring.add_or_move_to_front(w(2));

        assert_eq!(ring.handles(), vec![w(2), w(1)]);
        assert_eq!(ring.len(), 2);
        assert_ring_invariant(&ring);
    }

    #[test]
    fn test_promote_preserves_remainder_order() {
        // [A(head), B, C], promote C => [C(head), A, B]
        let mut ring = MruRing::new();
        for id in [3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }
        assert_eq!(ring.handles(), vec![w(1), w(2), w(3)]);

        ring.add_or_move_to_front(w(3));
        assert_eq!(ring.handles(), vec![w(3), w(1), w(2)]);
        assert_ring_invariant(&ring);
    }

    #[test]
    fn test_cycle_skips_head() {
        // [A(head), B, C]: cycling yields B, C, B, C, ...
        let mut ring = MruRing::new();
        for id in [3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }

        assert_eq!(ring.next_in_cycle(), Some(w(2)));
        assert_eq!(ring.next_in_cycle(), Some(w(3)));
        assert_eq!(ring.next_in_cycle(), Some(w(2)));
        assert_eq!(ring.next_in_cycle(), Some(w(3)));
    }

    #[test]
    fn test_cycle_single_element_returns_itself() {
        let mut ring = MruRing::new();
        ring.add_or_move_to_front(w(7));

        assert_eq!(ring.next_in_cycle(), Some(w(7)));
        assert_eq!(ring.next_in_cycle(), Some(w(7)));
    }

    #[test]
    fn test_cycle_resumes_from_cursor() {
        let mut ring = MruRing::new();
        for id in [4, 3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }
        // [1(head), 2, 3, 4]
        assert_eq!(ring.next_in_cycle(), Some(w(2)));
        assert_eq!(ring.next_in_cycle(), Some(w(3)));
        assert_eq!(ring.next_in_cycle(), Some(w(4)));
        // wraps past head
        assert_eq!(ring.next_in_cycle(), Some(w(2)));
    }

    #[test]
    fn test_promote_resets_cursor() {
        let mut ring = MruRing::new();
        for id in [3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }
        assert_eq!(ring.next_in_cycle(), Some(w(2)));

        // Promotion resets the cursor to the new head
        ring.add_or_move_to_front(w(2));
        assert_eq!(ring.handles(), vec![w(2), w(1), w(3)]);
        assert_eq!(ring.next_in_cycle(), Some(w(1)));
    }

    #[test]
    fn test_remove_head_promotes_next() {
        let mut ring = MruRing::new();
        for id in [3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }
        // [1(head), 2, 3]
        ring.remove(w(1));

        assert_eq!(ring.head_handle(), Some(w(2)));
        assert_eq!(ring.handles(), vec![w(2), w(3)]);
        assert_ring_invariant(&ring);
    }

    #[test]
    fn test_remove_middle_node() {
        let mut ring = MruRing::new();
        for id in [3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }
        ring.remove(w(2));

        assert_eq!(ring.handles(), vec![w(1), w(3)]);
        assert_ring_invariant(&ring);
    }

    #[test]
    fn test_remove_cursor_falls_back_to_head() {
        let mut ring = MruRing::new();
        for id in [3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }
        assert_eq!(ring.next_in_cycle(), Some(w(2)));

        ring.remove(w(2));
        // Cursor fell back to head, so cycling continues from there
        assert_eq!(ring.next_in_cycle(), Some(w(3)));
    }

    #[test]
    fn test_remove_last_node_empties_ring() {
        let mut ring = MruRing::new();
        ring.add_or_move_to_front(w(1));
        ring.remove(w(1));

        assert!(ring.is_empty());
        assert_eq!(ring.head_handle(), None);
        assert_eq!(ring.next_in_cycle(), None);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut ring = MruRing::new();
        ring.add_or_move_to_front(w(1));
        ring.remove(w(99));

        assert_eq!(ring.handles(), vec![w(1)]);
    }

    #[test]
    fn test_slot_reuse_after_removal() {
        let mut ring = MruRing::new();
        for id in [3, 2, 1] {
            ring.add_or_move_to_front(w(id));
        }
        ring.remove(w(2));
        ring.add_or_move_to_front(w(4));
        ring.add_or_move_to_front(w(5));

        assert_eq!(ring.handles(), vec![w(5), w(4), w(1), w(3)]);
        // Arena reused the freed slot before growing
        assert_eq!(ring.nodes.len(), 4);
        assert_ring_invariant(&ring);
    }

    #[test]
    fn test_invariant_under_mixed_operations() {
        let mut ring = MruRing::new();
        for id in 1..=6 {
            ring.add_or_move_to_front(w(id));
        }
        ring.remove(w(3));
        ring.add_or_move_to_front(w(1));
        ring.next_in_cycle();
        ring.remove(w(6));
        ring.add_or_move_to_front(w(7));
        ring.remove(w(1));

        assert_ring_invariant(&ring);
        assert_eq!(ring.len(), 4);
    }
}
