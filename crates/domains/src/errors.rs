//! # DomainError
//!
//! Centralized error handling for the forum backend.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

use crate::models::{Forum, Thread, User};

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The addressed thread (by id or slug) does not exist.
    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    /// Post creation referenced a parent that is neither committed in the
    /// target thread nor created earlier in the same batch.
    #[error("parent post {parent} is not in thread {thread}")]
    ParentNotInThread { parent: i64, thread: i64 },

    /// A user referenced as author, owner or voter does not exist.
    #[error("owner not found: {0}")]
    OwnerNotFound(String),

    /// Unrecognized traversal mode.
    #[error("invalid sort mode: {0}")]
    InvalidSortMode(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("forum not found: {0}")]
    ForumNotFound(String),

    #[error("post not found: {0}")]
    PostNotFound(i64),

    /// Nickname and/or email already taken. Carries every conflicting user.
    #[error("user conflict with {} existing user(s)", .0.len())]
    UserConflict(Vec<User>),

    /// Forum slug already taken. Carries the stored forum.
    #[error("forum conflict: {}", .0.slug)]
    ForumConflict(Box<Forum>),

    /// Thread slug already taken. Carries the stored thread.
    #[error("thread conflict: {}", .0.id)]
    ThreadConflict(Box<Thread>),

    /// Profile update tried to take an email owned by another user.
    #[error("email already in use: {0}")]
    EmailTaken(String),

    /// Malformed input that survived request decoding.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any unexpected persisted-store error, wrapped with context.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl DomainError {
    /// Wraps a store error with a short description of what was attempted.
    pub fn storage(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::StorageFailure(format!("{context}: {err}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ThreadNotFound(_)
                | Self::OwnerNotFound(_)
                | Self::UserNotFound(_)
                | Self::ForumNotFound(_)
                | Self::PostNotFound(_)
        )
    }
}

/// A specialized Result type for forum domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;
