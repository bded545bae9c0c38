//! # Domain Models
//!
//! These structs represent the core entities of the forum: users, forums,
//! threads, posts and votes, plus the input shapes the services accept.
//! Identifiers of threads and posts are store-generated, strictly increasing
//! integers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::path::PostPath;

/// A registered participant. The nickname is the identity and compares
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub nickname: String,
    pub fullname: String,
    #[serde(default)]
    pub about: String,
    pub email: String,
}

/// Body of a user creation request; the nickname comes from the route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub fullname: String,
    #[serde(default)]
    pub about: String,
    pub email: String,
}

/// Partial profile update. Absent or empty fields keep the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub fullname: Option<String>,
    pub about: Option<String>,
    pub email: Option<String>,
}

/// A forum groups threads. `posts` and `threads` are store-maintained counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    pub slug: String,
    pub title: String,
    /// Canonical nickname of the owner
    pub user: String,
    #[serde(default)]
    pub posts: i64,
    #[serde(default)]
    pub threads: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewForum {
    pub slug: String,
    pub title: String,
    pub user: String,
}

/// A Thread contains a tree of Posts and carries the vote tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub forum: String,
    pub message: String,
    /// Sum of every stored vote on this thread
    #[serde(default)]
    pub votes: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub created: DateTime<Utc>,
}

/// Thread creation input. `forum` is filled in from the route by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewThread {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub forum: String,
    pub message: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadUpdate {
    pub title: Option<String>,
    pub message: Option<String>,
}

impl ThreadUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.message.is_none()
    }
}

/// How a request addresses a thread: numeric segments are ids, anything
/// else is a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadLocator {
    Id(i64),
    Slug(String),
}

impl ThreadLocator {
    pub fn parse(slug_or_id: &str) -> Self {
        match slug_or_id.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Slug(slug_or_id.to_string()),
        }
    }
}

impl fmt::Display for ThreadLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

/// The fundamental unit of conversation.
///
/// `path` and `root_parent_id` are assigned once, by the batch that created
/// the post, and are never serialized to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    /// 0 for root posts
    #[serde(default)]
    pub parent: i64,
    pub author: String,
    pub message: String,
    #[serde(rename = "isEdited", default)]
    pub is_edited: bool,
    pub forum: String,
    pub thread: i64,
    pub created: DateTime<Utc>,
    #[serde(skip)]
    pub path: PostPath,
    #[serde(skip)]
    pub root_parent_id: i64,
}

impl Post {
    pub fn is_root(&self) -> bool {
        self.parent == 0
    }
}

/// One element of a post creation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub parent: i64,
    pub author: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostUpdate {
    #[serde(default)]
    pub message: String,
}

/// A user's single voice on a thread. Re-voting replaces the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub nickname: String,
    pub voice: i32,
}

/// Thread tally after `voice` replaces the voter's stored `previous` vote.
///
/// Fails with [`DomainError::Validation`] when the change or the resulting
/// tally does not fit an `i32`; nothing should be written in that case.
pub fn apply_vote(tally: i32, previous: Option<i32>, voice: i32) -> Result<i32> {
    let delta = match previous {
        Some(old) => voice.checked_sub(old),
        None => Some(voice),
    };
    delta
        .and_then(|delta| tally.checked_add(delta))
        .ok_or_else(|| {
            DomainError::Validation(format!("voice {voice} overflows the thread vote tally"))
        })
}

/// Entities that can be attached to a post details response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Related {
    User,
    Thread,
    Forum,
}

impl Related {
    /// Parses a comma separated list such as `user,forum`. Unknown names are
    /// skipped.
    pub fn parse_list(raw: &str) -> Vec<Related> {
        let mut related = Vec::new();
        for name in raw.split(',') {
            let item = match name.trim().to_ascii_lowercase().as_str() {
                "user" => Related::User,
                "thread" => Related::Thread,
                "forum" => Related::Forum,
                _ => continue,
            };
            if !related.contains(&item) {
                related.push(item);
            }
        }
        related
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetails {
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<Thread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forum: Option<Forum>,
}

/// Row counts reported by the service status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub user: i64,
    pub forum: i64,
    pub thread: i64,
    pub post: i64,
}

/// Listing of a forum's threads, ordered by creation time. `since` is
/// inclusive.
#[derive(Debug, Clone, Default)]
pub struct ThreadListQuery {
    pub limit: u32,
    pub since: Option<DateTime<Utc>>,
    pub desc: bool,
}

/// Listing of a forum's members, ordered by lower-cased nickname. `since`
/// is an exclusive nickname cursor.
#[derive(Debug, Clone, Default)]
pub struct ForumUserQuery {
    pub limit: u32,
    pub since: Option<String>,
    pub desc: bool,
}

/// Converts a page limit into an optional cap; 0 means "no cap".
pub fn page_cap(limit: u32) -> Option<usize> {
    (limit > 0).then_some(limit as usize)
}

/// Key used for every case-insensitive comparison of nicknames and slugs.
pub fn fold_key(value: &str) -> String {
    value.to_lowercase()
}
