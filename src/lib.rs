//! Ordered map and set containers.
//!
//! Both are thin views over [`rbtree_arena::RedBlackTree`]: the map stores a
//! value per key, the set stores keys only.

pub mod error;
pub mod map;
pub mod set;

pub use map::OrderedMap;
pub use rbtree_arena::{Cursor, CursorMut, Handle};
pub use set::OrderedSet;
