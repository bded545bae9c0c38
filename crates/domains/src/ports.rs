//! # Core Traits (Ports)
//!
//! Any storage adapter must implement these traits to be used by the
//! services. Every method that touches more than one record runs as a single
//! atomic unit inside the adapter.

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{
    Forum, ForumUserQuery, NewForum, NewPost, NewThread, Post, Status, Thread, ThreadListQuery,
    ThreadLocator, ThreadUpdate, User, UserUpdate,
};
use crate::traversal::PostListQuery;

/// Result of a write guarded by a uniqueness constraint.
///
/// `Duplicate` means another row already owns the unique key; the caller
/// re-reads that row instead of retrying the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted<T> {
    Stored(T),
    Duplicate,
}

/// Persistence contract for users.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<Persisted<User>>;
    async fn find_user(&self, nickname: &str) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Applies the non-empty fields of `update`. `None` when the user is gone.
    async fn update_user(&self, nickname: &str, update: &UserUpdate) -> Result<Option<Persisted<User>>>;
}

/// Persistence contract for forums and their derived listings.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ForumRepository: Send + Sync {
    async fn insert_forum(&self, forum: &NewForum) -> Result<Persisted<Forum>>;
    async fn find_forum(&self, slug: &str) -> Result<Option<Forum>>;
    async fn list_forum_threads(&self, slug: &str, query: &ThreadListQuery) -> Result<Vec<Thread>>;
    async fn list_forum_users(&self, slug: &str, query: &ForumUserQuery) -> Result<Vec<User>>;
}

/// Persistence contract for threads and the vote ledger.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Inserts the thread, bumps the forum thread counter and registers the
    /// author as a forum member.
    async fn insert_thread(&self, thread: &NewThread) -> Result<Persisted<Thread>>;
    async fn find_thread(&self, locator: &ThreadLocator) -> Result<Option<Thread>>;
    async fn update_thread(&self, id: i64, update: &ThreadUpdate) -> Result<Option<Thread>>;
    /// Records `voice` for `nickname`, adjusts the tally by the delta against
    /// any previous vote and reads the thread back, all atomically. A tally
    /// that would overflow fails with `Validation` and writes nothing.
    async fn vote(&self, thread_id: i64, nickname: &str, voice: i32) -> Result<Option<Thread>>;
}

/// Persistence contract for posts: batch insertion and traversal.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts the batch atomically and returns the posts in input order with
    /// ids, paths and root ids assigned. Also bumps the forum post counter
    /// and registers every author as a forum member.
    async fn create_posts(&self, thread: &Thread, posts: Vec<NewPost>) -> Result<Vec<Post>>;
    async fn list_posts(&self, thread_id: i64, query: &PostListQuery) -> Result<Vec<Post>>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>>;
    async fn update_post_message(&self, id: i64, message: &str) -> Result<Option<Post>>;
}

/// Whole-store maintenance.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    async fn status(&self) -> Result<Status>;
    /// Removes every record and restarts identifier sequences.
    async fn clear(&self) -> Result<()>;
}
