use thiserror::Error;

/// A broken red black tree invariant, as found by
/// [`RedBlackTree::validate`](crate::RedBlackTree::validate).
///
/// Nodes are identified by their arena index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("root node {0} is red")]
    RedRoot(usize),

    #[error("root node {0} has a parent")]
    RootHasParent(usize),

    #[error("red node {node} has a red parent")]
    RedChildOfRed { node: usize },

    #[error(
        "node {node} has black height {left} on the left and {right} on \
         the right"
    )]
    BlackHeightMismatch {
        node: usize,
        left: usize,
        right: usize,
    },

    #[error("node {node} is out of order relative to its ancestors")]
    OutOfOrder { node: usize },

    #[error("node {node} does not point back to its parent")]
    BrokenParentLink { node: usize },

    #[error("link to node {node} points to an empty arena slot")]
    DanglingLink { node: usize },

    #[error("arena holds {expected} nodes but {reachable} are reachable")]
    LengthMismatch { expected: usize, reachable: usize },
}

pub type Result<T> = ::std::result::Result<T, Error>;
