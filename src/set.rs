use core::fmt::Debug;
use std::{borrow::Borrow, marker::PhantomData};

use rbtree_arena::{Cursor, CursorMut, Handle, IntoKeys, Keys, RedBlackTree};
use serde::{
    de::{SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::error::Result;

pub type Iter<'a, T> = Keys<'a, T, ()>;
pub type IntoIter<T> = IntoKeys<T, ()>;

/// An ordered set of distinct elements.
///
/// The element is its own key, so the tree stores it once with a unit
/// payload.
pub struct OrderedSet<T> {
    tree: RedBlackTree<T, ()>,
}

impl<T> OrderedSet<T> {
    pub fn new() -> Self {
        Self {
            tree: RedBlackTree::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: RedBlackTree::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn swap(&mut self, other: &mut OrderedSet<T>) {
        self.tree.swap(&mut other.tree);
    }

    pub fn iter(&self) -> Iter<T> {
        self.tree.keys()
    }

    pub fn begin(&mut self) -> CursorMut<T, ()> {
        self.tree.begin()
    }

    pub fn end(&mut self) -> CursorMut<T, ()> {
        self.tree.end()
    }

    pub fn cbegin(&self) -> Cursor<T, ()> {
        self.tree.cbegin()
    }

    pub fn cend(&self) -> Cursor<T, ()> {
        self.tree.cend()
    }

    pub fn cursor(&self, handle: Handle) -> Cursor<T, ()> {
        self.tree.cursor(handle)
    }

    pub fn cursor_mut(&mut self, handle: Handle) -> CursorMut<T, ()> {
        self.tree.cursor_mut(handle)
    }

    pub fn first(&self) -> Option<&T> {
        self.tree.first().map(|(value, _)| value)
    }

    pub fn last(&self) -> Option<&T> {
        self.tree.last().map(|(value, _)| value)
    }

    pub fn pop_first(&mut self) -> Option<T> {
        self.tree.pop_first().map(|(value, _)| value)
    }

    pub fn pop_last(&mut self) -> Option<T> {
        self.tree.pop_last().map(|(value, _)| value)
    }

    pub fn erase(&mut self, handle: Handle) -> Option<T> {
        self.tree.erase(handle).map(|(value, _)| value)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.tree.retain(|value, _| keep(value));
    }
}

impl<T: Ord> OrderedSet<T> {
    /// Adds `value` unless an equal element is present. Either way the
    /// handle names the element now in the set.
    pub fn insert(&mut self, value: T) -> (Handle, bool) {
        self.tree.insert(value, ())
    }

    pub fn insert_many<I>(&mut self, values: I) -> Vec<(Handle, bool)>
    where
        I: IntoIterator<Item = T>,
    {
        values
            .into_iter()
            .map(|value| self.tree.insert(value, ()))
            .collect()
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(value)
    }

    /// The stored element equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_key_value(value).map(|(value, _)| value)
    }

    pub fn find<Q>(&self, value: &Q) -> Cursor<T, ()>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(value)
    }

    pub fn find_mut<Q>(&mut self, value: &Q) -> CursorMut<T, ()>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find_mut(value)
    }

    pub fn lower_bound<Q>(&self, value: &Q) -> Cursor<T, ()>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.lower_bound(value)
    }

    pub fn upper_bound<Q>(&self, value: &Q) -> Cursor<T, ()>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.upper_bound(value)
    }

    /// Returns whether the element was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(value).is_some()
    }

    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(value).map(|(value, _)| value)
    }

    /// Moves the elements missing here out of `other`. Elements both sets
    /// share stay in `other`.
    pub fn merge(&mut self, other: &mut OrderedSet<T>) {
        self.tree.merge(&mut other.tree);
    }

    pub fn validate(&self) -> Result<usize> {
        Ok(self.tree.validate()?)
    }
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for OrderedSet<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T: Debug> Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<T: Ord> Eq for OrderedSet<T> {}

impl<T: Ord> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for OrderedSet<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T: Ord> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        self.tree.into_keys()
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: Serialize> Serialize for OrderedSet<T> {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for value in self {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

struct OrderedSetVisitor<T> {
    marker: PhantomData<OrderedSet<T>>,
}

impl<'de, T> Visitor<'de> for OrderedSetVisitor<T>
where
    T: Deserialize<'de> + Ord,
{
    type Value = OrderedSet<T>;

    fn expecting(
        &self,
        formatter: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(
        self,
        mut access: A,
    ) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut set =
            OrderedSet::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(value) = access.next_element()? {
            set.insert(value);
        }
        Ok(set)
    }
}

impl<'de, T> Deserialize<'de> for OrderedSet<T>
where
    T: Deserialize<'de> + Ord,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(OrderedSetVisitor {
            marker: PhantomData,
        })
    }
}
