//! # Materialized paths
//!
//! A post's position in its reply tree is stored as the ordered ids of its
//! ancestors followed by its own id. Paths compare element-wise as integer
//! sequences, with a proper prefix sorting first, which yields pre-order
//! depth-first order: a reply sorts after its parent and before the subtree
//! of any later sibling of that parent.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostPath(Vec<i64>);

impl PostPath {
    /// Path of a post without a parent.
    pub fn root(id: i64) -> Self {
        Self(vec![id])
    }

    /// Path of a direct reply with the given id.
    pub fn child(&self, id: i64) -> Self {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend_from_slice(&self.0);
        ids.push(id);
        Self(ids)
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Id of the top-level ancestor.
    pub fn root_id(&self) -> Option<i64> {
        self.0.first().copied()
    }

    /// Id of the post the path belongs to.
    pub fn leaf_id(&self) -> Option<i64> {
        self.0.last().copied()
    }

    pub fn is_ancestor_of(&self, other: &PostPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn into_inner(self) -> Vec<i64> {
        self.0
    }
}

impl From<Vec<i64>> for PostPath {
    fn from(ids: Vec<i64>) -> Self {
        Self(ids)
    }
}

impl fmt::Display for PostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}
