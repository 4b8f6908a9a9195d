use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("key not found")]
    KeyNotFound,

    #[error(transparent)]
    RedBlackTreeError(#[from] rbtree_arena::Error),
}

pub type Result<T> = ::std::result::Result<T, Error>;
