//! # Thread traversal
//!
//! The three linearizations of a thread's reply tree and their cursor
//! semantics. [`paginate`] is the reference implementation used by the
//! in-memory store; the PostgreSQL adapter expresses the same orderings in
//! SQL.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;
use crate::models::{page_cap, Post};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// By creation time, ties by id.
    #[default]
    Flat,
    /// Depth-first by materialized path.
    Tree,
    /// Pages over root posts; each selected root brings its whole subtree.
    ParentTree,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Flat => "flat",
            SortMode::Tree => "tree",
            SortMode::ParentTree => "parent_tree",
        }
    }
}

impl FromStr for SortMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(SortMode::Flat),
            "tree" => Ok(SortMode::Tree),
            "parent_tree" => Ok(SortMode::ParentTree),
            other => Err(DomainError::InvalidSortMode(other.to_string())),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page request over a thread's posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListQuery {
    pub sort: SortMode,
    /// 0 means no cap. For `ParentTree` the cap counts root posts.
    pub limit: u32,
    /// Exclusive cursor: id of the last post of the previous page.
    pub since: Option<i64>,
    pub desc: bool,
}

impl PostListQuery {
    /// The cursor, ignoring the non-id 0.
    pub fn cursor(&self) -> Option<i64> {
        self.since.filter(|&id| id > 0)
    }
}

fn flat_order(a: &Post, b: &Post) -> Ordering {
    (a.created, a.id).cmp(&(b.created, b.id))
}

fn tree_order(a: &Post, b: &Post) -> Ordering {
    a.path.cmp(&b.path).then(a.id.cmp(&b.id))
}

/// Selects one page from every post of a single thread.
///
/// A cursor that does not name a post of `posts` yields an empty page.
pub fn paginate(mut posts: Vec<Post>, query: &PostListQuery) -> Vec<Post> {
    let cursor = match query.cursor() {
        Some(id) => match posts.iter().find(|post| post.id == id) {
            Some(post) => Some(post.clone()),
            None => return Vec::new(),
        },
        None => None,
    };

    match query.sort {
        SortMode::Flat => linear_page(posts, cursor.as_ref(), query, flat_order),
        SortMode::Tree => linear_page(posts, cursor.as_ref(), query, tree_order),
        SortMode::ParentTree => {
            let mut roots: Vec<i64> = posts
                .iter()
                .filter(|post| post.is_root())
                .map(|post| post.id)
                .filter(|&id| match &cursor {
                    Some(since) if query.desc => id < since.root_parent_id,
                    Some(since) => id > since.root_parent_id,
                    None => true,
                })
                .collect();
            roots.sort_unstable();
            if query.desc {
                roots.reverse();
            }
            if let Some(cap) = page_cap(query.limit) {
                roots.truncate(cap);
            }

            let rank: HashMap<i64, usize> =
                roots.iter().enumerate().map(|(rank, &id)| (id, rank)).collect();
            posts.retain(|post| rank.contains_key(&post.root_parent_id));
            // Groups follow the root order; inside a group the path order stays
            // ascending even when the roots are walked in descending order.
            posts.sort_by(|a, b| {
                rank[&a.root_parent_id]
                    .cmp(&rank[&b.root_parent_id])
                    .then_with(|| tree_order(a, b))
            });
            posts
        }
    }
}

fn linear_page(
    mut posts: Vec<Post>,
    cursor: Option<&Post>,
    query: &PostListQuery,
    order: fn(&Post, &Post) -> Ordering,
) -> Vec<Post> {
    if let Some(since) = cursor {
        let wanted = if query.desc {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        posts.retain(|post| order(post, since) == wanted);
    }
    posts.sort_by(order);
    if query.desc {
        posts.reverse();
    }
    if let Some(cap) = page_cap(query.limit) {
        posts.truncate(cap);
    }
    posts
}
