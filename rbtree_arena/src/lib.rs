use core::fmt::Debug;
use std::{borrow::Borrow, cmp::Ordering, mem, ops::Index};

use log::trace;
use slab::Slab;

mod cursor;
mod error;
mod iter;
mod node;
mod validate;

pub use cursor::{Cursor, CursorMut};
pub use error::{Error, Result};
pub use iter::{IntoIter, IntoKeys, Iter, IterMut, Keys, Values, ValuesMut};
pub use node::Handle;

use node::{next_stamp, Color, Node, NodeId, Side};

enum SearchResult {
    Found(NodeId),
    /// The key is absent, a new node would hang from this parent slot
    /// (`None` when the tree is empty).
    GoDown(Option<(NodeId, Side)>),
}

/// A red black tree where all nodes live in one slab arena and link to each
/// other by index.
pub struct RedBlackTree<K, V> {
    arena: Slab<Node<K, V>>,
    root: Option<NodeId>,
}

impl<K, V> Debug for RedBlackTree<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> PartialEq for RedBlackTree<K, V>
where
    K: Ord,
    V: PartialEq,
{
    fn eq(&self, other: &RedBlackTree<K, V>) -> bool {
        if self.len() != other.len() {
            return false;
        }

        self.iter()
            .all(|(key, value)| other.get(key).map_or(false, |v| *value == *v))
    }
}

impl<K, V> Eq for RedBlackTree<K, V>
where
    K: Ord,
    V: Eq,
{
}

impl<K, V, Q> Index<&Q> for RedBlackTree<K, V>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;

    fn index(&self, index: &Q) -> &V {
        self.get(index).expect("key not found")
    }
}

impl<K, V> Default for RedBlackTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for RedBlackTree<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Pre-order copy into a fresh, compact arena. Shape and colors are
    /// kept as is, so no rebalancing happens. Handles of `self` name nothing
    /// in the copy.
    fn clone(&self) -> Self {
        let mut arena = Slab::with_capacity(self.len());
        let root =
            self.root.map(|root| self.clone_subtree(root, None, &mut arena));
        Self { arena, root }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RedBlackTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for RedBlackTree<K, V> {
    /// Keeps the first value seen for a key, like repeated `insert`.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> IntoIterator for RedBlackTree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let order = self.in_order();
        IntoIter::new(self.arena, order)
    }
}

impl<'a, K, V> IntoIterator for &'a RedBlackTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut RedBlackTree<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V> RedBlackTree<K, V> {
    pub fn new() -> Self {
        Self {
            arena: Slab::new(),
            root: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Slab::with_capacity(capacity),
            root: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Upper bound on the number of nodes the address space could hold.
    pub fn max_size(&self) -> usize {
        isize::MAX as usize / mem::size_of::<Node<K, V>>().max(1)
    }

    pub fn clear(&mut self) {
        trace!("Clearing tree of {} nodes", self.len());
        self.root = None;
        self.arena.clear();
    }

    /// O(1), no node is touched.
    pub fn swap(&mut self, other: &mut RedBlackTree<K, V>) {
        mem::swap(self, other);
    }

    pub fn iter(&self) -> Iter<K, V> {
        Iter::new(self)
    }

    pub fn iter_mut(&mut self) -> IterMut<K, V> {
        IterMut::new(self)
    }

    pub fn keys(&self) -> Keys<K, V> {
        Keys(self.iter())
    }

    pub fn values(&self) -> Values<K, V> {
        Values(self.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<K, V> {
        ValuesMut(self.iter_mut())
    }

    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys(self.into_iter())
    }

    /// Read only cursor at the smallest key, or at end when empty.
    pub fn cbegin(&self) -> Cursor<K, V> {
        Cursor::new(self, self.first_node())
    }

    /// Read only cursor one past the largest key.
    pub fn cend(&self) -> Cursor<K, V> {
        Cursor::new(self, None)
    }

    pub fn begin(&mut self) -> CursorMut<K, V> {
        let first = self.first_node();
        CursorMut::new(self, first)
    }

    pub fn end(&mut self) -> CursorMut<K, V> {
        CursorMut::new(self, None)
    }

    /// Read only cursor at `handle`, or at end if the handle names no entry.
    pub fn cursor(&self, handle: Handle) -> Cursor<K, V> {
        let current = self.resolve(handle);
        Cursor::new(self, current)
    }

    pub fn cursor_mut(&mut self, handle: Handle) -> CursorMut<K, V> {
        let current = self.resolve(handle);
        CursorMut::new(self, current)
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.first_node().map(|id| self.entry(id))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.last_node().map(|id| self.entry(id))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.first_node().map(|id| self.remove_node(id))
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.last_node().map(|id| self.remove_node(id))
    }

    /// Removes the entry named by `handle`. Stale handles and handles of
    /// other trees are ignored.
    pub fn erase(&mut self, handle: Handle) -> Option<(K, V)> {
        let id = self.resolve(handle)?;
        Some(self.remove_node(id))
    }

    /// Keeps only the entries for which `keep` returns true, in key order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut next = self.first_node();
        while let Some(id) = next {
            next = self.successor(id);
            let node = &mut self.arena[id];
            if !keep(&node.key, &mut node.value) {
                self.remove_node(id);
            }
        }
    }

    pub(crate) fn handle_of(&self, id: NodeId) -> Handle {
        Handle {
            index: id,
            stamp: self.arena[id].stamp,
        }
    }

    /// The node `handle` names, if it is still an entry of this tree.
    fn resolve(&self, handle: Handle) -> Option<NodeId> {
        self.arena
            .get(handle.index)
            .filter(|node| node.stamp == handle.stamp)
            .map(|_| handle.index)
    }

    #[inline]
    fn entry(&self, id: NodeId) -> (&K, &V) {
        let node = &self.arena[id];
        (&node.key, &node.value)
    }

    #[inline]
    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.map_or(false, |id| self.arena[id].is_red())
    }

    #[inline]
    fn set_color(&mut self, id: Option<NodeId>, color: Color) {
        if let Some(id) = id {
            self.arena[id].color = color;
        }
    }

    pub(crate) fn first_node(&self) -> Option<NodeId> {
        self.root.map(|root| self.min_from(root))
    }

    pub(crate) fn last_node(&self) -> Option<NodeId> {
        self.root.map(|root| self.max_from(root))
    }

    fn min_from(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.arena[id].left {
            id = left;
        }
        id
    }

    fn max_from(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.arena[id].right {
            id = right;
        }
        id
    }

    /// In-order successor, `None` past the largest key.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.arena[id].right {
            return Some(self.min_from(right));
        }

        let mut child = id;
        let mut parent = self.arena[id].parent;
        while let Some(parent_id) = parent {
            if self.arena[parent_id].left == Some(child) {
                return Some(parent_id);
            }
            child = parent_id;
            parent = self.arena[parent_id].parent;
        }
        None
    }

    /// In-order predecessor, `None` before the smallest key.
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.arena[id].left {
            return Some(self.max_from(left));
        }

        let mut child = id;
        let mut parent = self.arena[id].parent;
        while let Some(parent_id) = parent {
            if self.arena[parent_id].right == Some(child) {
                return Some(parent_id);
            }
            child = parent_id;
            parent = self.arena[parent_id].parent;
        }
        None
    }

    fn in_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut next = self.first_node();
        while let Some(id) = next {
            order.push(id);
            next = self.successor(id);
        }
        order
    }

    fn clone_subtree(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        arena: &mut Slab<Node<K, V>>,
    ) -> NodeId
    where
        K: Clone,
        V: Clone,
    {
        let node = &self.arena[id];
        let copy_id = arena.insert(Node {
            color: node.color,
            left: None,
            right: None,
            parent,
            stamp: next_stamp(),
            key: node.key.clone(),
            value: node.value.clone(),
        });
        let left = node
            .left
            .map(|left| self.clone_subtree(left, Some(copy_id), arena));
        let right = node
            .right
            .map(|right| self.clone_subtree(right, Some(copy_id), arena));

        let copy = &mut arena[copy_id];
        copy.left = left;
        copy.right = right;
        copy_id
    }

    /// Points whichever slot of `parent` held `old` (or the root) at `new`.
    fn replace_child(
        &mut self,
        parent: Option<NodeId>,
        old: NodeId,
        new: Option<NodeId>,
    ) {
        match parent {
            Some(parent_id) => {
                let parent = &mut self.arena[parent_id];
                if parent.left == Some(old) {
                    parent.left = new;
                } else {
                    parent.right = new;
                }
            }
            None => self.root = new,
        }
    }

    fn rotate_left(&mut self, node_id: NodeId) {
        let Some(right_id) = self.arena[node_id].right else {
            return;
        };

        let right_left = self.arena[right_id].left;
        self.arena[node_id].right = right_left;
        if let Some(child) = right_left {
            self.arena[child].parent = Some(node_id);
        }

        let parent = self.arena[node_id].parent;
        self.arena[right_id].parent = parent;
        self.replace_child(parent, node_id, Some(right_id));

        self.arena[right_id].left = Some(node_id);
        self.arena[node_id].parent = Some(right_id);
    }

    fn rotate_right(&mut self, node_id: NodeId) {
        let Some(left_id) = self.arena[node_id].left else {
            return;
        };

        let left_right = self.arena[left_id].right;
        self.arena[node_id].left = left_right;
        if let Some(child) = left_right {
            self.arena[child].parent = Some(node_id);
        }

        let parent = self.arena[node_id].parent;
        self.arena[left_id].parent = parent;
        self.replace_child(parent, node_id, Some(left_id));

        self.arena[left_id].right = Some(node_id);
        self.arena[node_id].parent = Some(left_id);
    }

    fn attach(
        &mut self,
        key: K,
        value: V,
        at: Option<(NodeId, Side)>,
    ) -> NodeId {
        let parent = at.map(|(parent, _)| parent);
        let id = self.arena.insert(Node::new(key, value, parent));
        match at {
            Some((parent, Side::Left)) => self.arena[parent].left = Some(id),
            Some((parent, Side::Right)) => self.arena[parent].right = Some(id),
            None => self.root = Some(id),
        }
        self.insert_fixup(id);
        id
    }

    fn insert_fixup(&mut self, inserted: NodeId) {
        let mut node_id = inserted;
        while let Some(parent_id) = self.arena[node_id].parent {
            if !self.arena[parent_id].is_red() {
                break;
            }

            // A red parent is never the root.
            let Some(grand_parent_id) = self.arena[parent_id].parent else {
                break;
            };

            if Some(parent_id) == self.arena[grand_parent_id].left {
                let uncle = self.arena[grand_parent_id].right;
                if self.is_red(uncle) {
                    self.arena[parent_id].color = Color::Black;
                    self.set_color(uncle, Color::Black);
                    self.arena[grand_parent_id].color = Color::Red;
                    node_id = grand_parent_id;
                } else {
                    let mut parent_id = parent_id;
                    if Some(node_id) == self.arena[parent_id].right {
                        self.rotate_left(parent_id);
                        parent_id = node_id;
                    }

                    self.arena[parent_id].color = Color::Black;
                    self.arena[grand_parent_id].color = Color::Red;
                    self.rotate_right(grand_parent_id);
                    break;
                }
            } else {
                let uncle = self.arena[grand_parent_id].left;
                if self.is_red(uncle) {
                    self.arena[parent_id].color = Color::Black;
                    self.set_color(uncle, Color::Black);
                    self.arena[grand_parent_id].color = Color::Red;
                    node_id = grand_parent_id;
                } else {
                    let mut parent_id = parent_id;
                    if Some(node_id) == self.arena[parent_id].left {
                        self.rotate_right(parent_id);
                        parent_id = node_id;
                    }

                    self.arena[parent_id].color = Color::Black;
                    self.arena[grand_parent_id].color = Color::Red;
                    self.rotate_left(grand_parent_id);
                    break;
                }
            }
        }
        self.set_color(self.root, Color::Black);
    }

    /// Puts the `replacement` subtree where `node_id` hangs.
    fn transplant(&mut self, node_id: NodeId, replacement: Option<NodeId>) {
        let parent = self.arena[node_id].parent;
        self.replace_child(parent, node_id, replacement);
        if let Some(replacement) = replacement {
            self.arena[replacement].parent = parent;
        }
    }

    /// Unlinks `node_id`, rebalances and frees its slot.
    ///
    /// A node with two children is replaced by its in-order successor, which
    /// is relinked into its place, so the arena index of every other node
    /// stays the same.
    pub(crate) fn remove_node(&mut self, node_id: NodeId) -> (K, V) {
        let node = &self.arena[node_id];
        let (left, right) = (node.left, node.right);
        let mut removed_color = node.color;

        let (child, child_parent) = match (left, right) {
            (None, _) => {
                let parent = node.parent;
                self.transplant(node_id, right);
                (right, parent)
            }
            (Some(_), None) => {
                let parent = node.parent;
                self.transplant(node_id, left);
                (left, parent)
            }
            (Some(left_id), Some(right_id)) => {
                let successor_id = self.min_from(right_id);
                removed_color = self.arena[successor_id].color;
                let child = self.arena[successor_id].right;

                let child_parent = if successor_id == right_id {
                    Some(successor_id)
                } else {
                    let parent = self.arena[successor_id].parent;
                    self.transplant(successor_id, child);
                    self.arena[successor_id].right = Some(right_id);
                    self.arena[right_id].parent = Some(successor_id);
                    parent
                };

                self.transplant(node_id, Some(successor_id));
                self.arena[successor_id].left = Some(left_id);
                self.arena[left_id].parent = Some(successor_id);
                self.arena[successor_id].color = self.arena[node_id].color;
                (child, child_parent)
            }
        };

        if removed_color == Color::Black {
            self.remove_fixup(child, child_parent);
        }

        let node = self.arena.remove(node_id);
        (node.key, node.value)
    }

    /// Resolves the missing black on the path through `node` (possibly a nil
    /// leaf, hence the explicit `parent`).
    fn remove_fixup(
        &mut self,
        mut node: Option<NodeId>,
        mut parent: Option<NodeId>,
    ) {
        while node != self.root && !self.is_red(node) {
            let Some(parent_id) = parent else {
                break;
            };

            if node == self.arena[parent_id].left {
                let mut sibling = self.arena[parent_id].right;
                if self.is_red(sibling) {
                    self.set_color(sibling, Color::Black);
                    self.arena[parent_id].color = Color::Red;
                    self.rotate_left(parent_id);
                    sibling = self.arena[parent_id].right;
                }

                // The deficient side is lighter, so the sibling is real.
                let Some(mut sibling_id) = sibling else {
                    node = Some(parent_id);
                    parent = self.arena[parent_id].parent;
                    continue;
                };

                let near = self.arena[sibling_id].left;
                let far = self.arena[sibling_id].right;
                if !self.is_red(near) && !self.is_red(far) {
                    self.arena[sibling_id].color = Color::Red;
                    node = Some(parent_id);
                    parent = self.arena[parent_id].parent;
                    continue;
                }

                let near_red = near.filter(|&id| self.arena[id].is_red());
                if let Some(near_id) = near_red {
                    self.arena[near_id].color = Color::Black;
                    self.arena[sibling_id].color = Color::Red;
                    self.rotate_right(sibling_id);
                    sibling_id = near_id;
                }

                self.arena[sibling_id].color = self.arena[parent_id].color;
                self.arena[parent_id].color = Color::Black;
                self.set_color(self.arena[sibling_id].right, Color::Black);
                self.rotate_left(parent_id);
                node = self.root;
                parent = None;
            } else {
                let mut sibling = self.arena[parent_id].left;
                if self.is_red(sibling) {
                    self.set_color(sibling, Color::Black);
                    self.arena[parent_id].color = Color::Red;
                    self.rotate_right(parent_id);
                    sibling = self.arena[parent_id].left;
                }

                let Some(mut sibling_id) = sibling else {
                    node = Some(parent_id);
                    parent = self.arena[parent_id].parent;
                    continue;
                };

                let near = self.arena[sibling_id].right;
                let far = self.arena[sibling_id].left;
                if !self.is_red(near) && !self.is_red(far) {
                    self.arena[sibling_id].color = Color::Red;
                    node = Some(parent_id);
                    parent = self.arena[parent_id].parent;
                    continue;
                }

                let near_red = near.filter(|&id| self.arena[id].is_red());
                if let Some(near_id) = near_red {
                    self.arena[near_id].color = Color::Black;
                    self.arena[sibling_id].color = Color::Red;
                    self.rotate_left(sibling_id);
                    sibling_id = near_id;
                }

                self.arena[sibling_id].color = self.arena[parent_id].color;
                self.arena[parent_id].color = Color::Black;
                self.set_color(self.arena[sibling_id].left, Color::Black);
                self.rotate_right(parent_id);
                node = self.root;
                parent = None;
            }
        }
        self.set_color(node, Color::Black);
    }
}

impl<K: Ord, V> RedBlackTree<K, V> {
    fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut node_id) = self.root else {
            return SearchResult::GoDown(None);
        };

        loop {
            let node = &self.arena[node_id];
            let (side, next) = match key.cmp(node.key.borrow()) {
                Ordering::Less => (Side::Left, node.left),
                Ordering::Greater => (Side::Right, node.right),
                Ordering::Equal => return SearchResult::Found(node_id),
            };

            match next {
                Some(next) => node_id = next,
                None => return SearchResult::GoDown(Some((node_id, side))),
            }
        }
    }

    fn find_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            SearchResult::Found(id) => Some(id),
            SearchResult::GoDown(_) => None,
        }
    }

    /// Inserts `key` unless it is already present.
    ///
    /// Returns the handle of the entry holding `key` and whether a new node
    /// was created. An existing entry is left untouched, and the given key
    /// and value are dropped.
    pub fn insert(&mut self, key: K, value: V) -> (Handle, bool) {
        match self.search(&key) {
            SearchResult::Found(id) => (self.handle_of(id), false),
            SearchResult::GoDown(at) => {
                let id = self.attach(key, value, at);
                (self.handle_of(id), true)
            }
        }
    }

    /// Like [`insert`](Self::insert), but overwrites the value in place when
    /// the key exists. The boolean tells if a new node was created.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Handle, bool) {
        match self.search(&key) {
            SearchResult::Found(id) => {
                self.arena[id].value = value;
                (self.handle_of(id), false)
            }
            SearchResult::GoDown(at) => {
                let id = self.attach(key, value, at);
                (self.handle_of(id), true)
            }
        }
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let id = match self.search(&key) {
            SearchResult::Found(id) => id,
            SearchResult::GoDown(at) => self.attach(key, default(), at),
        };
        &mut self.arena[id].value
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|id| &self.arena[id].value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|id| self.entry(id))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|id| &mut self.arena[id].value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).is_some()
    }

    /// Cursor at `key`, or at end when the key is absent.
    pub fn find<Q>(&self, key: &Q) -> Cursor<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor::new(self, self.find_node(key))
    }

    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let current = self.find_node(key);
        CursorMut::new(self, current)
    }

    /// Cursor at the first key not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        let mut candidate = None;
        while let Some(id) = current {
            let node = &self.arena[id];
            if node.key.borrow() < key {
                current = node.right;
            } else {
                candidate = Some(id);
                current = node.left;
            }
        }
        Cursor::new(self, candidate)
    }

    /// Cursor at the first key greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        let mut candidate = None;
        while let Some(id) = current {
            let node = &self.arena[id];
            if node.key.borrow() <= key {
                current = node.right;
            } else {
                candidate = Some(id);
                current = node.left;
            }
        }
        Cursor::new(self, candidate)
    }

    /// Removes `key`, doing nothing when it is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|id| self.remove_node(id))
    }

    /// Moves every entry of `other` whose key is absent here into this tree.
    /// Entries with keys already present stay in `other`, this tree's values
    /// are never overwritten.
    pub fn merge(&mut self, other: &mut RedBlackTree<K, V>) {
        let mut moved = 0;
        let mut next = other.first_node();
        while let Some(id) = next {
            next = other.successor(id);

            let SearchResult::GoDown(at) = self.search(&other.arena[id].key)
            else {
                continue;
            };

            let (key, value) = other.remove_node(id);
            self.attach(key, value, at);
            moved += 1;
        }

        trace!(
            "Merged {} entries, {} conflicting entries left behind",
            moved,
            other.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
    use rstest::rstest;

    use super::{Color, Handle, RedBlackTree};

    fn keys<V>(tree: &RedBlackTree<i32, V>) -> Vec<i32> {
        tree.keys().copied().collect()
    }

    /// Pre-order (key, color, has left, has right) of every node.
    fn shape<V>(
        tree: &RedBlackTree<i32, V>,
    ) -> Vec<(i32, Color, bool, bool)> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = tree.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = &tree.arena[id];
            out.push((
                node.key,
                node.color,
                node.left.is_some(),
                node.right.is_some(),
            ));
            stack.extend(node.right);
            stack.extend(node.left);
        }
        out
    }

    #[test]
    fn insert_int() {
        let mut tree = RedBlackTree::new();
        assert_eq!(tree.len(), 0);
        assert!(tree.insert(1, 2).1);
        assert_eq!(tree.len(), 1);
        assert!(tree.insert(2, 4).1);
        assert_eq!(tree.len(), 2);
        assert!(!tree.insert(2, 6).1);
        assert_eq!(tree.len(), 2);
        assert!(tree.contains_key(&1));
        assert!(!tree.contains_key(&100));
        assert_eq!(tree.get(&1), Some(&2));
        assert_eq!(tree.get(&2), Some(&4));
        assert_eq!(tree.get(&3), None);
    }

    #[test]
    fn insert_str() {
        let mut tree = RedBlackTree::new();
        tree.insert("B", "are");
        tree.insert("A", "Trees");
        tree.insert("A", "B");
        tree.insert("C", "cool");
        assert_eq!(tree.len(), 3);
        assert!(tree.contains_key("C"));
        assert!(!tree.contains_key("nope"));
        assert_eq!(tree.get("A"), Some(&"Trees"));
        assert_eq!(tree["B"], "are");
        assert_eq!(tree.get("C"), Some(&"cool"));
        assert_eq!(tree.get("D"), None);
    }

    #[test]
    fn insert_returns_existing_handle() {
        let mut tree = RedBlackTree::new();
        let (first, inserted) = tree.insert(7, "a");
        assert!(inserted);
        let (second, inserted) = tree.insert(7, "b");
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(tree.cursor(first).value(), Some(&"a"));
    }

    #[test]
    fn insert_or_assign() {
        let mut tree = RedBlackTree::new();
        assert!(tree.insert_or_assign(1, "a").1);
        assert!(!tree.insert_or_assign(1, "b").1);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[&1], "b");
        tree.validate().unwrap();
    }

    #[test]
    fn valid_after_every_insert() {
        let mut tree = RedBlackTree::new();
        for key in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(key, ());
            tree.validate().unwrap();
        }
        assert_eq!(keys(&tree), vec![1, 3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn ascending_insert_stays_shallow() {
        let mut tree = RedBlackTree::new();
        for key in 0..1024 {
            tree.insert(key, ());
        }
        // A red black tree of n nodes has black height <= log2(n + 1).
        let black_height = tree.validate().unwrap();
        assert!(black_height <= 11);
    }

    #[test]
    fn remove_front() {
        let mut tree: RedBlackTree<i32, ()> =
            (1..=5).map(|key| (key, ())).collect();
        assert_eq!(tree.remove(&1), Some((1, ())));
        tree.validate().unwrap();
        assert_eq!(tree.remove(&2), Some((2, ())));
        tree.validate().unwrap();
        assert_eq!(keys(&tree), vec![3, 4, 5]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut tree: RedBlackTree<i32, ()> =
            (1..=5).map(|key| (key, ())).collect();
        assert_eq!(tree.remove(&42), None);
        assert_eq!(tree.len(), 5);
        tree.validate().unwrap();
    }

    #[test]
    fn remove_until_empty() {
        let mut tree: RedBlackTree<i32, i32> =
            (0..100).map(|key| (key, key * 2)).collect();
        for key in (0..100).rev() {
            assert_eq!(tree.remove(&key), Some((key, key * 2)));
            tree.validate().unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(1337)]
    fn random_insert_remove(#[case] seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut keys: Vec<u32> = (0..500).collect();
        keys.shuffle(&mut rng);

        let mut tree = RedBlackTree::new();
        for &key in &keys {
            tree.insert(key, key);
            tree.validate().unwrap();
        }

        keys.shuffle(&mut rng);
        for (removed, &key) in keys.iter().enumerate() {
            assert_eq!(tree.remove(&key), Some((key, key)));
            tree.validate().unwrap();
            assert_eq!(tree.len(), keys.len() - removed - 1);
        }
    }

    #[test]
    fn erase_keeps_other_handles() {
        let mut tree = RedBlackTree::new();
        let handles: Vec<(i32, Handle)> =
            (0..64).map(|key| (key, tree.insert(key, key).0)).collect();

        for &(key, handle) in handles.iter().filter(|(key, _)| key % 3 == 0) {
            assert_eq!(tree.erase(handle), Some((key, key)));
            tree.validate().unwrap();
        }

        for &(key, handle) in handles.iter().filter(|(key, _)| key % 3 != 0) {
            assert_eq!(tree.cursor(handle).key(), Some(&key));
        }
    }

    #[test]
    fn erase_unknown_handle() {
        let mut tree = RedBlackTree::new();
        let (handle, _) = tree.insert(1, 1);
        assert_eq!(tree.erase(handle), Some((1, 1)));
        assert_eq!(tree.erase(handle), None);
    }

    #[test]
    fn stale_handle_after_slot_reuse() {
        let mut tree = RedBlackTree::new();
        let (stale, _) = tree.insert(1, 1);
        tree.erase(stale);
        let (fresh, _) = tree.insert(2, 2);
        assert_eq!(fresh.index(), stale.index());

        assert!(tree.cursor(stale).is_end());
        assert!(tree.cursor_mut(stale).is_end());
        assert_eq!(tree.erase(stale), None);
        assert_eq!(tree.get(&2), Some(&2));
        assert_eq!(tree.cursor(fresh).key(), Some(&2));
    }

    #[test]
    fn foreign_handle() {
        let mut a = RedBlackTree::new();
        let (from_a, _) = a.insert(1, 1);
        let mut b = RedBlackTree::new();
        let (from_b, _) = b.insert(99, 99);
        assert_eq!(from_a.index(), from_b.index());

        assert_eq!(b.erase(from_a), None);
        assert!(b.cursor(from_a).is_end());
        assert_eq!(b.len(), 1);

        let copy = b.clone();
        assert!(copy.cursor(from_b).is_end());
        assert_eq!(b.cursor(from_b).key(), Some(&99));
    }

    #[test]
    fn iter() {
        let mut tree = RedBlackTree::new();
        tree.insert(100, "c");
        tree.insert(50, "a");
        tree.insert(75, "b");
        tree.insert(150, "d");
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some((&50, &"a")));
        assert_eq!(iter.next(), Some((&75, &"b")));
        assert_eq!(iter.next(), Some((&100, &"c")));
        assert_eq!(iter.next(), Some((&150, &"d")));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn iter_reverse() {
        let mut tree = RedBlackTree::new();
        tree.insert(100, "c");
        tree.insert(50, "a");
        tree.insert(75, "b");
        tree.insert(150, "d");
        let mut iter = tree.iter().rev();
        assert_eq!(iter.next(), Some((&150, &"d")));
        assert_eq!(iter.next(), Some((&100, &"c")));
        assert_eq!(iter.next(), Some((&75, &"b")));
        assert_eq!(iter.next(), Some((&50, &"a")));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn iter_from_both_ends() {
        let tree: RedBlackTree<i32, ()> =
            (1..=4).map(|key| (key, ())).collect();
        let mut iter = tree.keys();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn iter_mut() {
        let mut tree: RedBlackTree<i32, i32> =
            [(3, 30), (1, 10), (2, 20)].into_iter().collect();
        for (key, value) in tree.iter_mut() {
            *value += key;
        }
        assert_eq!(
            tree.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            vec![(1, 11), (2, 22), (3, 33)]
        );
    }

    #[test]
    fn into_iter() {
        let mut tree = RedBlackTree::new();
        tree.insert(100, "c");
        tree.insert(50, "a");
        tree.insert(75, "b");
        tree.insert(150, "d");
        let mut iter = tree.into_iter();
        assert_eq!(iter.next(), Some((50, "a")));
        assert_eq!(iter.next_back(), Some((150, "d")));
        assert_eq!(iter.next(), Some((75, "b")));
        assert_eq!(iter.next(), Some((100, "c")));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn into_iter_for_loop_no_crash() {
        struct User {
            // Test there is no double free on a dynamically allocated struct.
            _name: String,
            _age: u8,
        }

        let mut tree = RedBlackTree::new();
        tree.insert(
            "id1",
            User {
                _name: "John Doe".to_string(),
                _age: 123,
            },
        );
        tree.insert(
            "id2",
            User {
                _name: "Tony Solomonik".to_string(),
                _age: 24,
            },
        );

        let mut iter = tree.into_iter();
        iter.next();
    }

    #[test]
    fn clear() {
        let mut tree = RedBlackTree::new();
        tree.insert(100, "c");
        tree.insert(50, "a");
        tree.clear();
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        tree.insert(1, "x");
        assert_eq!(tree.len(), 1);
        tree.validate().unwrap();
    }

    #[test]
    fn equality() {
        let mut tree1 = RedBlackTree::new();
        tree1.insert(100, "c");
        tree1.insert(50, "a");
        tree1.insert(75, "b");
        tree1.insert(150, "d");

        let mut tree2 = RedBlackTree::new();
        tree2.insert(150, "d");
        tree2.insert(50, "a");
        tree2.insert(100, "c");
        tree2.insert(75, "b");

        assert_eq!(tree1, tree2);
        tree2.insert_or_assign(75, "x");
        assert_ne!(tree1, tree2);
    }

    #[test]
    fn clone_is_independent() {
        let mut original: RedBlackTree<i32, String> =
            (0..32).map(|key| (key, key.to_string())).collect();
        original.remove(&5);

        let mut copy = original.clone();
        copy.validate().unwrap();
        assert_eq!(copy, original);
        assert_eq!(shape(&copy), shape(&original));

        copy.insert(5, "five".to_string());
        copy.remove(&6);
        *copy.get_mut(&7).unwrap() = "seven".to_string();

        assert!(!original.contains_key(&5));
        assert_eq!(original.get(&6).map(String::as_str), Some("6"));
        assert_eq!(original.get(&7).map(String::as_str), Some("7"));
    }

    #[test]
    fn take_leaves_empty_source() {
        let mut source: RedBlackTree<i32, ()> =
            (0..10).map(|key| (key, ())).collect();
        let moved = std::mem::take(&mut source);
        assert_eq!(source.len(), 0);
        assert_eq!(moved.len(), 10);
        source.validate().unwrap();
        moved.validate().unwrap();
    }

    #[test]
    fn swap() {
        let mut tree1: RedBlackTree<i32, ()> =
            (1..=3).map(|key| (key, ())).collect();
        let mut tree2: RedBlackTree<i32, ()> =
            (4..=5).map(|key| (key, ())).collect();
        tree1.swap(&mut tree2);
        assert_eq!(keys(&tree1), vec![4, 5]);
        assert_eq!(keys(&tree2), vec![1, 2, 3]);
    }

    #[test]
    fn merge_moves_non_conflicting() {
        let mut tree1: RedBlackTree<i32, &str> =
            [(1, "a"), (2, "b"), (3, "c")].into_iter().collect();
        let mut tree2: RedBlackTree<i32, &str> =
            [(3, "x"), (4, "d"), (5, "e")].into_iter().collect();

        tree1.merge(&mut tree2);
        tree1.validate().unwrap();
        tree2.validate().unwrap();

        assert_eq!(keys(&tree1), vec![1, 2, 3, 4, 5]);
        assert_eq!(tree1[&3], "c");
        assert_eq!(keys(&tree2), vec![3]);
        assert_eq!(tree2[&3], "x");
    }

    #[test]
    fn first_last_pop() {
        let mut tree: RedBlackTree<i32, ()> =
            [4, 2, 9, 1].into_iter().map(|key| (key, ())).collect();
        assert_eq!(tree.first(), Some((&1, &())));
        assert_eq!(tree.last(), Some((&9, &())));
        assert_eq!(tree.pop_first(), Some((1, ())));
        assert_eq!(tree.pop_last(), Some((9, ())));
        assert_eq!(keys(&tree), vec![2, 4]);
        tree.validate().unwrap();
    }

    #[test]
    fn bounds() {
        let tree: RedBlackTree<i32, ()> =
            [10, 20, 30].into_iter().map(|key| (key, ())).collect();
        assert_eq!(tree.lower_bound(&20).key(), Some(&20));
        assert_eq!(tree.upper_bound(&20).key(), Some(&30));
        assert_eq!(tree.lower_bound(&15).key(), Some(&20));
        assert_eq!(tree.lower_bound(&5).key(), Some(&10));
        assert!(tree.lower_bound(&31).is_end());
        assert!(tree.upper_bound(&30).is_end());
    }

    #[test]
    fn retain() {
        let mut tree: RedBlackTree<i32, i32> =
            (0..50).map(|key| (key, key)).collect();
        tree.retain(|key, value| {
            *value *= 10;
            key % 2 == 0
        });
        tree.validate().unwrap();
        assert_eq!(tree.len(), 25);
        assert!(tree.iter().all(|(k, v)| k % 2 == 0 && *v == k * 10));
    }

    #[test]
    fn with_capacity() {
        let mut tree = RedBlackTree::with_capacity(16);
        assert!(tree.capacity() >= 16);
        tree.insert(1, 1);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn max_size_is_positive() {
        let tree: RedBlackTree<u64, u64> = RedBlackTree::new();
        assert!(tree.max_size() > 0);
        assert!(tree.max_size() < isize::MAX as usize);
    }
}
