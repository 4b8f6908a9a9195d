use std::iter::FusedIterator;

use slab::Slab;

use crate::{
    node::{Node, NodeId},
    RedBlackTree,
};

pub struct Iter<'a, K: 'a, V: 'a> {
    tree: &'a RedBlackTree<K, V>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    length: usize,
}

impl<'a, K: 'a, V: 'a> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Iter<'a, K, V> {
        Iter {
            tree: self.tree,
            head: self.head,
            tail: self.tail,
            length: self.length,
        }
    }
}

impl<'a, K: 'a, V: 'a> Iter<'a, K, V> {
    pub(crate) fn new(tree: &'a RedBlackTree<K, V>) -> Self {
        Self {
            tree,
            head: tree.first_node(),
            tail: tree.last_node(),
            length: tree.len(),
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        if self.length == 0 {
            return None;
        }

        let head = self.head?;
        self.head = self.tree.successor(head);
        self.length -= 1;
        Some(self.tree.entry(head))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.length, Some(self.length))
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        if self.length == 0 {
            return None;
        }

        let tail = self.tail?;
        self.tail = self.tree.predecessor(tail);
        self.length -= 1;
        Some(self.tree.entry(tail))
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Iter<'a, K, V> {}
impl<'a, K: 'a, V: 'a> FusedIterator for Iter<'a, K, V> {}

/// Mutable in-order iteration.
///
/// The arena hands out disjoint mutable borrows only in slot order, so the
/// borrows are placed by in-order rank up front.
pub struct IterMut<'a, K: 'a, V: 'a> {
    entries: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K: 'a, V: 'a> IterMut<'a, K, V> {
    pub(crate) fn new(tree: &'a mut RedBlackTree<K, V>) -> Self {
        let order = tree.in_order();
        let slots = order.iter().max().map_or(0, |max| max + 1);
        let mut rank = vec![0; slots];
        for (position, &id) in order.iter().enumerate() {
            rank[id] = position;
        }

        let mut placed: Vec<Option<(&'a K, &'a mut V)>> =
            std::iter::repeat_with(|| None).take(order.len()).collect();
        for (id, node) in tree.arena.iter_mut() {
            placed[rank[id]] = Some((&node.key, &mut node.value));
        }

        let entries: Vec<_> = placed.into_iter().flatten().collect();
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.entries.next_back()
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for IterMut<'a, K, V> {}
impl<'a, K: 'a, V: 'a> FusedIterator for IterMut<'a, K, V> {}

/// Owning in-order iteration. The tree structure is gone at this point, so
/// entries are taken out of their slots without rebalancing anything.
pub struct IntoIter<K, V> {
    arena: Slab<Node<K, V>>,
    order: std::vec::IntoIter<NodeId>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(arena: Slab<Node<K, V>>, order: Vec<NodeId>) -> Self {
        Self {
            arena,
            order: order.into_iter(),
        }
    }

    fn take(&mut self, id: NodeId) -> (K, V) {
        let node = self.arena.remove(id);
        (node.key, node.value)
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let id = self.order.next()?;
        Some(self.take(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let id = self.order.next_back()?;
        Some(self.take(id))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

macro_rules! project_iter {
    ($name:ident, $item:ty, $project:expr, [$($lt:lifetime)?]) => {
        impl<$($lt,)? K, V> Iterator for $name<$($lt,)? K, V> {
            type Item = $item;

            fn next(&mut self) -> Option<$item> {
                self.0.next().map($project)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                self.0.size_hint()
            }
        }

        impl<$($lt,)? K, V> DoubleEndedIterator for $name<$($lt,)? K, V> {
            fn next_back(&mut self) -> Option<$item> {
                self.0.next_back().map($project)
            }
        }

        impl<$($lt,)? K, V> ExactSizeIterator for $name<$($lt,)? K, V> {}
        impl<$($lt,)? K, V> FusedIterator for $name<$($lt,)? K, V> {}
    };
}

pub struct Keys<'a, K, V>(pub(crate) Iter<'a, K, V>);
pub struct Values<'a, K, V>(pub(crate) Iter<'a, K, V>);
pub struct ValuesMut<'a, K, V>(pub(crate) IterMut<'a, K, V>);
pub struct IntoKeys<K, V>(pub(crate) IntoIter<K, V>);

project_iter!(Keys, &'a K, |(key, _)| key, ['a]);
project_iter!(Values, &'a V, |(_, value)| value, ['a]);
project_iter!(ValuesMut, &'a mut V, |(_, value)| value, ['a]);
project_iter!(IntoKeys, K, |(key, _)| key, []);

impl<'a, K, V> Clone for Keys<'a, K, V> {
    fn clone(&self) -> Self {
        Keys(self.0.clone())
    }
}
