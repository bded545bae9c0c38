//! Forums, thread creation and forum listings.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    DomainError, Forum, ForumRepository, ForumUserQuery, NewForum, NewThread, Persisted, Result,
    Thread, ThreadListQuery, ThreadLocator, ThreadRepository, User, UserRepository,
};
use tracing::{debug, info, warn};

pub struct ForumService {
    forums: Arc<dyn ForumRepository>,
    threads: Arc<dyn ThreadRepository>,
    users: Arc<dyn UserRepository>,
}

impl ForumService {
    pub fn new(
        forums: Arc<dyn ForumRepository>,
        threads: Arc<dyn ThreadRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { forums, threads, users }
    }

    pub async fn create_forum(&self, new: NewForum) -> Result<Forum> {
        debug!(slug = %new.slug, owner = %new.user, "creating forum");

        let owner = self
            .users
            .find_user(&new.user)
            .await?
            .ok_or_else(|| DomainError::OwnerNotFound(new.user.clone()))?;

        if let Some(existing) = self.forums.find_forum(&new.slug).await? {
            return Err(DomainError::ForumConflict(Box::new(existing)));
        }

        let forum = NewForum {
            user: owner.nickname,
            ..new
        };
        match self.forums.insert_forum(&forum).await? {
            Persisted::Stored(created) => {
                info!(slug = %created.slug, "forum created");
                Ok(created)
            }
            Persisted::Duplicate => {
                warn!(slug = %forum.slug, "forum insert lost a race");
                match self.forums.find_forum(&forum.slug).await? {
                    Some(winner) => Err(DomainError::ForumConflict(Box::new(winner))),
                    None => Err(DomainError::StorageFailure(format!(
                        "forum {} reported as duplicate but not found on re-read",
                        forum.slug
                    ))),
                }
            }
        }
    }

    pub async fn get_forum(&self, slug: &str) -> Result<Forum> {
        self.forums
            .find_forum(slug)
            .await?
            .ok_or_else(|| DomainError::ForumNotFound(slug.to_string()))
    }

    /// Opens a thread in the forum. The stored forum and author are the
    /// canonical spellings; creation time defaults to now.
    pub async fn create_thread(&self, forum_slug: &str, new: NewThread) -> Result<Thread> {
        debug!(forum = forum_slug, author = %new.author, "creating thread");

        let forum = self.get_forum(forum_slug).await?;
        let author = self
            .users
            .find_user(&new.author)
            .await?
            .ok_or_else(|| DomainError::OwnerNotFound(new.author.clone()))?;

        let slug = new.slug.filter(|slug| !slug.is_empty());
        if let Some(slug) = &slug {
            if let Some(existing) = self.find_by_slug(slug).await? {
                return Err(DomainError::ThreadConflict(Box::new(existing)));
            }
        }

        let thread = NewThread {
            title: new.title,
            author: author.nickname,
            forum: forum.slug,
            message: new.message,
            slug,
            created: Some(new.created.unwrap_or_else(Utc::now)),
        };
        match self.threads.insert_thread(&thread).await? {
            Persisted::Stored(created) => {
                info!(thread = created.id, forum = %created.forum, "thread created");
                Ok(created)
            }
            Persisted::Duplicate => {
                let slug = thread.slug.unwrap_or_default();
                warn!(slug = %slug, "thread insert lost a race");
                match self.find_by_slug(&slug).await? {
                    Some(winner) => Err(DomainError::ThreadConflict(Box::new(winner))),
                    None => Err(DomainError::StorageFailure(format!(
                        "thread {slug} reported as duplicate but not found on re-read"
                    ))),
                }
            }
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Thread>> {
        self.threads
            .find_thread(&ThreadLocator::Slug(slug.to_string()))
            .await
    }

    pub async fn list_threads(&self, slug: &str, query: ThreadListQuery) -> Result<Vec<Thread>> {
        let forum = self.get_forum(slug).await?;
        self.forums.list_forum_threads(&forum.slug, &query).await
    }

    pub async fn list_users(&self, slug: &str, query: ForumUserQuery) -> Result<Vec<User>> {
        let forum = self.get_forum(slug).await?;
        self.forums.list_forum_users(&forum.slug, &query).await
    }
}
