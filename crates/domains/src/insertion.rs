//! # Batch insertion planning
//!
//! Storage adapters insert a whole batch of posts for one thread inside a
//! single transaction. The pure part of that work lives here:
//!
//! 1. [`stage`] turns the request into posts carrying reserved ids (handed out
//!    in input order from the store's monotonic sequence) and one shared
//!    creation timestamp.
//! 2. [`external_parents`] lists the parents the adapter has to look up among
//!    committed posts of the thread.
//! 3. [`assign_paths`] fills `path` and `root_parent_id`, walking the batch in
//!    [`resolution_order`] so that a parent created by the same batch is
//!    always resolved before its replies.
//!
//! Any unresolved parent fails the whole batch with
//! [`DomainError::ParentNotInThread`]; the adapter then rolls back.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::errors::{DomainError, Result};
use crate::models::{fold_key, NewPost, Post, Thread};
use crate::path::PostPath;

/// Tree position of a committed post, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLocation {
    pub path: PostPath,
    pub root_parent_id: i64,
}

/// Builds the posts of a batch. `ids` must hold one reserved id per input
/// post, in ascending order.
pub fn stage(thread: &Thread, ids: &[i64], posts: Vec<NewPost>, created: DateTime<Utc>) -> Vec<Post> {
    debug_assert_eq!(ids.len(), posts.len());
    posts
        .into_iter()
        .zip(ids)
        .map(|(new, &id)| Post {
            id,
            parent: new.parent,
            author: new.author,
            message: new.message,
            is_edited: false,
            forum: thread.forum.clone(),
            thread: thread.id,
            created,
            path: PostPath::default(),
            root_parent_id: 0,
        })
        .collect()
}

/// Parent ids referenced by the batch that the batch does not create itself.
pub fn external_parents(batch: &[Post]) -> Vec<i64> {
    let created: HashSet<i64> = batch.iter().map(|post| post.id).collect();
    let mut parents: Vec<i64> = batch
        .iter()
        .filter(|post| !post.is_root() && !created.contains(&post.parent))
        .map(|post| post.parent)
        .collect();
    parents.sort_unstable();
    parents.dedup();
    parents
}

/// Indices of `batch` in processing order: root posts by ascending id, then
/// replies by ascending parent id, ties by ascending own id.
pub fn resolution_order(batch: &[Post]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..batch.len()).collect();
    order.sort_by_key(|&index| {
        let post = &batch[index];
        (!post.is_root(), post.parent, post.id)
    });
    order
}

/// Assigns `path` and `root_parent_id` to every post of the batch.
///
/// A parent may be a committed post of the thread (present in `committed`)
/// or a post created earlier in the same batch.
pub fn assign_paths(
    thread_id: i64,
    batch: &mut [Post],
    committed: &HashMap<i64, ParentLocation>,
) -> Result<()> {
    let position: HashMap<i64, usize> = batch
        .iter()
        .enumerate()
        .map(|(index, post)| (post.id, index))
        .collect();
    let mut resolved: HashMap<i64, ParentLocation> = HashMap::with_capacity(batch.len());

    for index in resolution_order(batch) {
        let post = &batch[index];
        let location = if post.is_root() {
            ParentLocation {
                path: PostPath::root(post.id),
                root_parent_id: post.id,
            }
        } else {
            let parent = match position.get(&post.parent) {
                Some(&parent_index) if parent_index < index => resolved.get(&post.parent),
                Some(_) => None,
                None => committed.get(&post.parent),
            };
            let parent = parent.ok_or(DomainError::ParentNotInThread {
                parent: post.parent,
                thread: thread_id,
            })?;
            ParentLocation {
                path: parent.path.child(post.id),
                root_parent_id: parent.root_parent_id,
            }
        };

        let post = &mut batch[index];
        post.path = location.path.clone();
        post.root_parent_id = location.root_parent_id;
        resolved.insert(post.id, location);
    }
    Ok(())
}

/// Authors of the batch, each once (case-insensitive), in first-seen order.
pub fn distinct_authors<'a>(authors: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    authors
        .into_iter()
        .filter(|author| seen.insert(fold_key(author)))
        .collect()
}
