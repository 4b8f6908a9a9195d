use core::fmt::Debug;
use std::{borrow::Borrow, marker::PhantomData, ops::Index};

use rbtree_arena::{
    Cursor, CursorMut, Handle, IntoIter, Iter, IterMut, Keys, RedBlackTree,
    Values, ValuesMut,
};
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::error::{Error, Result};

/// An ordered map with one value per distinct key.
pub struct OrderedMap<K, V> {
    tree: RedBlackTree<K, V>,
}

impl<K, V> OrderedMap<K, V> {
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

    pub fn swap(&mut self, other: &mut OrderedMap<K, V>) {
        self.tree.swap(&mut other.tree);
    }

    pub fn iter(&self) -> Iter<K, V> {
        self.tree.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<K, V> {
        self.tree.iter_mut()
    }

    pub fn keys(&self) -> Keys<K, V> {
        self.tree.keys()
    }

    pub fn values(&self) -> Values<K, V> {
        self.tree.values()
    }

    pub fn values_mut(&mut self) -> ValuesMut<K, V> {
        self.tree.values_mut()
    }

    pub fn begin(&mut self) -> CursorMut<K, V> {
        self.tree.begin()
    }

    pub fn end(&mut self) -> CursorMut<K, V> {
        self.tree.end()
    }

    pub fn cbegin(&self) -> Cursor<K, V> {
        self.tree.cbegin()
    }

    pub fn cend(&self) -> Cursor<K, V> {
        self.tree.cend()
    }

    pub fn cursor(&self, handle: Handle) -> Cursor<K, V> {
        self.tree.cursor(handle)
    }

    pub fn cursor_mut(&mut self, handle: Handle) -> CursorMut<K, V> {
        self.tree.cursor_mut(handle)
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first()
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last()
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    /// Removes the entry at `handle`, `None` if the handle names no entry.
    pub fn erase(&mut self, handle: Handle) -> Option<(K, V)> {
        self.tree.erase(handle)
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.tree.retain(keep);
    }
}

impl<K: Ord, V> OrderedMap<K, V> {
    /// The value at `key`. Never inserts.
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).ok_or(Error::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// The value at `key`, inserting `V::default()` first if the key is
    /// absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.tree.get_or_insert_with(key, V::default)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_key_value(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    pub fn find<Q>(&self, key: &Q) -> Cursor<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key)
    }

    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find_mut(key)
    }

    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.lower_bound(key)
    }

    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.upper_bound(key)
    }

    /// Inserts unless `key` is present. The returned flag is `false` when an
    /// existing entry was found, in which case it is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> (Handle, bool) {
        self.tree.insert(key, value)
    }

    pub fn insert_pair(&mut self, (key, value): (K, V)) -> (Handle, bool) {
        self.tree.insert(key, value)
    }

    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Handle, bool) {
        self.tree.insert_or_assign(key, value)
    }

    /// Inserts every item in order, one result per item. Later items see the
    /// earlier ones, so a repeated key reports `false` and keeps the first
    /// value.
    pub fn insert_many<I>(&mut self, items: I) -> Vec<(Handle, bool)>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        items
            .into_iter()
            .map(|(key, value)| self.tree.insert(key, value))
            .collect()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(|(_, value)| value)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key)
    }

    /// Moves entries with keys absent here out of `other`. Keys present in
    /// both keep this map's value and stay behind in `other`.
    pub fn merge(&mut self, other: &mut OrderedMap<K, V>) {
        self.tree.merge(&mut other.tree);
    }

    /// Checks the underlying tree's invariants, returning its black height.
    pub fn validate(&self) -> Result<usize> {
        Ok(self.tree.validate()?)
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for OrderedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: Debug, V: Debug> Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.tree.fmt(f)
    }
}

impl<K: Ord, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K: Ord, V: Eq> Eq for OrderedMap<K, V> {}

impl<K, V, Q> Index<&Q> for OrderedMap<K, V>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        &self.tree[key]
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tree: RedBlackTree::from_iter(iter),
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for OrderedMap<K, V> {
    fn from(items: [(K, V); N]) -> Self {
        Self::from_iter(items)
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.tree.extend(iter);
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        self.tree.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.tree.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut OrderedMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.tree.iter_mut()
    }
}

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<K, V> {
    marker: PhantomData<OrderedMap<K, V>>,
}

impl<'de, K, V> Visitor<'de> for OrderedMapVisitor<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    type Value = OrderedMap<K, V>;

    fn expecting(
        &self,
        formatter: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(
        self,
        mut access: A,
    ) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map =
            OrderedMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedMap<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedMapVisitor {
            marker: PhantomData,
        })
    }
}
