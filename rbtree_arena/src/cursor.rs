use core::fmt::Debug;
use std::ptr;

use crate::{node::NodeId, Handle, RedBlackTree};

/// Moves `current` one step forward. Reaching end remembers the node we came
/// from in `last`, staying at end is a no-op.
fn step_next<K, V>(
    tree: &RedBlackTree<K, V>,
    current: &mut Option<NodeId>,
    last: &mut Option<NodeId>,
) {
    if let Some(id) = *current {
        let next = tree.successor(id);
        if next.is_none() {
            *last = Some(id);
        }
        *current = next;
    }
}

/// Moves `current` one step back. From end this lands on `last` (the largest
/// key), before the smallest key lies end again.
fn step_prev<K, V>(
    tree: &RedBlackTree<K, V>,
    current: &mut Option<NodeId>,
    last: &mut Option<NodeId>,
) {
    match *current {
        Some(id) => {
            let prev = tree.predecessor(id);
            if prev.is_none() {
                *last = tree.last_node();
            }
            *current = prev;
        }
        None => *current = *last,
    }
}

/// A read only bidirectional cursor over a [`RedBlackTree`].
///
/// A cursor either points at an entry or at the end position, one past the
/// largest key. Two cursors are equal when they point at the same entry of
/// the same tree, all end cursors of a tree are equal.
pub struct Cursor<'a, K, V> {
    tree: &'a RedBlackTree<K, V>,
    current: Option<NodeId>,
    last: Option<NodeId>,
}

impl<'a, K, V> Clone for Cursor<'a, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, K, V> Copy for Cursor<'a, K, V> {}

impl<'a, K, V> PartialEq for Cursor<'a, K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.current == other.current
    }
}

impl<'a, K, V> Eq for Cursor<'a, K, V> {}

impl<'a, K: Debug, V: Debug> Debug for Cursor<'a, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn new(
        tree: &'a RedBlackTree<K, V>,
        current: Option<NodeId>,
    ) -> Self {
        Self {
            tree,
            current,
            last: tree.last_node(),
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Handle of the current entry, `None` at end.
    pub fn handle(&self) -> Option<Handle> {
        self.current.map(|id| self.tree.handle_of(id))
    }

    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(key, _)| key)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, value)| value)
    }

    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        let tree = self.tree;
        self.current.map(|id| tree.entry(id))
    }

    pub fn move_next(&mut self) {
        step_next(self.tree, &mut self.current, &mut self.last);
    }

    pub fn move_prev(&mut self) {
        step_prev(self.tree, &mut self.current, &mut self.last);
    }
}

/// A bidirectional cursor that can mutate values and remove entries.
///
/// Keys are never handed out mutably, changing one could break the order.
pub struct CursorMut<'a, K, V> {
    tree: &'a mut RedBlackTree<K, V>,
    current: Option<NodeId>,
    last: Option<NodeId>,
}

impl<'a, K: Debug, V: Debug> Debug for CursorMut<'a, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("CursorMut").field(&self.key_value()).finish()
    }
}

impl<'a, K, V> CursorMut<'a, K, V> {
    pub(crate) fn new(
        tree: &'a mut RedBlackTree<K, V>,
        current: Option<NodeId>,
    ) -> Self {
        let last = tree.last_node();
        Self {
            tree,
            current,
            last,
        }
    }

    /// A read only view of this cursor's position.
    pub fn as_cursor(&self) -> Cursor<K, V> {
        Cursor {
            tree: &*self.tree,
            current: self.current,
            last: self.last,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    pub fn handle(&self) -> Option<Handle> {
        self.current.map(|id| self.tree.handle_of(id))
    }

    pub fn key(&self) -> Option<&K> {
        self.current.map(|id| &self.tree.arena[id].key)
    }

    pub fn value(&self) -> Option<&V> {
        self.current.map(|id| &self.tree.arena[id].value)
    }

    pub fn key_value(&self) -> Option<(&K, &V)> {
        self.current.map(|id| self.tree.entry(id))
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        let id = self.current?;
        Some(&mut self.tree.arena[id].value)
    }

    pub fn key_value_mut(&mut self) -> Option<(&K, &mut V)> {
        let id = self.current?;
        let node = &mut self.tree.arena[id];
        Some((&node.key, &mut node.value))
    }

    /// Consumes the cursor, keeping the value borrowed for the whole
    /// lifetime of the tree borrow.
    pub fn into_value_mut(self) -> Option<&'a mut V> {
        let id = self.current?;
        let tree = self.tree;
        Some(&mut tree.arena[id].value)
    }

    pub fn move_next(&mut self) {
        step_next(&*self.tree, &mut self.current, &mut self.last);
    }

    pub fn move_prev(&mut self) {
        step_prev(&*self.tree, &mut self.current, &mut self.last);
    }

    /// Removes the current entry and moves to its successor. Does nothing at
    /// end.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let id = self.current?;
        let next = self.tree.successor(id);
        let entry = self.tree.remove_node(id);
        self.current = next;
        self.last = self.tree.last_node();
        Some(entry)
    }
}
