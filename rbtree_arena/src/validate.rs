use crate::{
    error::{Error, Result},
    node::NodeId,
    RedBlackTree,
};

impl<K: Ord, V> RedBlackTree<K, V> {
    /// Walks the whole tree checking every structural invariant.
    ///
    /// Returns the black height of the root (nil leaves not counted).
    /// O(n), meant for tests and debugging.
    pub fn validate(&self) -> Result<usize> {
        let Some(root) = self.root else {
            return match self.len() {
                0 => Ok(0),
                expected => Err(Error::LengthMismatch {
                    expected,
                    reachable: 0,
                }),
            };
        };

        let node = self
            .arena
            .get(root)
            .ok_or(Error::DanglingLink { node: root })?;
        if node.parent.is_some() {
            return Err(Error::RootHasParent(root));
        }
        if node.is_red() {
            return Err(Error::RedRoot(root));
        }

        let mut reachable = 0;
        let black_height =
            self.validate_subtree(root, None, None, &mut reachable)?;

        if reachable != self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                reachable,
            });
        }
        Ok(black_height)
    }

    fn validate_subtree(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        reachable: &mut usize,
    ) -> Result<usize> {
        *reachable += 1;
        // More nodes than the arena holds means a cycle.
        if *reachable > self.len() {
            return Err(Error::LengthMismatch {
                expected: self.len(),
                reachable: *reachable,
            });
        }

        let node = self.arena.get(id).ok_or(Error::DanglingLink { node: id })?;
        let above_lower = lower.map_or(true, |lower| node.key > *lower);
        let below_upper = upper.map_or(true, |upper| node.key < *upper);
        if !above_lower || !below_upper {
            return Err(Error::OutOfOrder { node: id });
        }

        for child_id in [node.left, node.right].into_iter().flatten() {
            let child = self
                .arena
                .get(child_id)
                .ok_or(Error::DanglingLink { node: child_id })?;
            if child.parent != Some(id) {
                return Err(Error::BrokenParentLink { node: child_id });
            }
            if node.is_red() && child.is_red() {
                return Err(Error::RedChildOfRed { node: child_id });
            }
        }

        let left = match node.left {
            Some(left) => {
                self.validate_subtree(left, lower, Some(&node.key), reachable)?
            }
            None => 0,
        };
        let right = match node.right {
            Some(right) => {
                self.validate_subtree(right, Some(&node.key), upper, reachable)?
            }
            None => 0,
        };

        if left != right {
            return Err(Error::BlackHeightMismatch {
                node: id,
                left,
                right,
            });
        }
        Ok(left + usize::from(!node.is_red()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{node::Color, Error, RedBlackTree};

    fn tree() -> RedBlackTree<i32, ()> {
        (1..=7).map(|key| (key, ())).collect()
    }

    #[test]
    fn empty_is_valid() {
        let tree: RedBlackTree<i32, ()> = RedBlackTree::new();
        assert_eq!(tree.validate(), Ok(0));
    }

    #[test]
    fn red_root() {
        let mut tree = tree();
        let root = tree.root.unwrap();
        tree.arena[root].color = Color::Red;
        assert_eq!(tree.validate(), Err(Error::RedRoot(root)));
    }

    #[test]
    fn black_height_mismatch() {
        let mut tree = tree();
        let first = tree.first_node().unwrap();
        let color = tree.arena[first].color;
        tree.arena[first].color = match color {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        };
        assert!(matches!(
            tree.validate(),
            Err(Error::BlackHeightMismatch { .. })
                | Err(Error::RedChildOfRed { .. })
        ));
    }

    #[test]
    fn out_of_order() {
        let mut tree = tree();
        let first = tree.first_node().unwrap();
        tree.arena[first].key = 100;
        assert_eq!(tree.validate(), Err(Error::OutOfOrder { node: first }));
    }

    #[test]
    fn broken_parent_link() {
        let mut tree = tree();
        let first = tree.first_node().unwrap();
        tree.arena[first].parent = Some(first);
        assert_eq!(
            tree.validate(),
            Err(Error::BrokenParentLink { node: first })
        );
    }
}
