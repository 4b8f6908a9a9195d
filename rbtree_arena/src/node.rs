use std::sync::atomic::{AtomicU64, Ordering};

/// Index of a node inside the tree's arena.
pub(crate) type NodeId = usize;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(0);

/// Unique across every node of every tree in the process.
pub(crate) fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) color: Color,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) stamp: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Node<K, V> {
    /// New nodes are always red, the insertion fixup repaints them as needed.
    pub(crate) fn new(key: K, value: V, parent: Option<NodeId>) -> Self {
        Self {
            color: Color::Red,
            left: None,
            right: None,
            parent,
            stamp: next_stamp(),
            key,
            value,
        }
    }

    #[inline]
    pub(crate) fn is_red(&self) -> bool {
        self.color == Color::Red
    }
}

/// A stable reference to one entry of a tree.
///
/// Handles stay valid across insertions and across removals of other
/// entries. A handle whose entry was removed, or that came from another
/// tree, names nothing: lookups through it yield `None` even after its arena
/// slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    pub(crate) index: NodeId,
    pub(crate) stamp: u64,
}

impl Handle {
    /// Raw arena index, mostly useful for diagnostics.
    pub fn index(&self) -> usize {
        self.index
    }
}
