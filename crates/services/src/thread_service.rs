//! Thread use cases: batch post creation, traversal, voting and edits.

use std::collections::HashMap;
use std::sync::Arc;

use domains::insertion::distinct_authors;
use domains::{
    fold_key, DomainError, NewPost, Post, PostListQuery, PostRepository, Result, Thread,
    ThreadLocator, ThreadRepository, ThreadUpdate, UserRepository, Vote,
};
use tracing::{debug, info};

pub struct ThreadService {
    threads: Arc<dyn ThreadRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl ThreadService {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { threads, posts, users }
    }

    /// Resolves a `slug_or_id` route segment to a thread.
    pub async fn get_thread(&self, slug_or_id: &str) -> Result<Thread> {
        self.threads
            .find_thread(&ThreadLocator::parse(slug_or_id))
            .await?
            .ok_or_else(|| DomainError::ThreadNotFound(slug_or_id.to_string()))
    }

    /// Creates a batch of posts in one thread.
    ///
    /// Returns the posts in request order. The batch is all-or-nothing: an
    /// unknown author fails before anything is written, an invalid parent
    /// rolls the whole batch back inside the store.
    pub async fn create_posts(&self, slug_or_id: &str, mut posts: Vec<NewPost>) -> Result<Vec<Post>> {
        let thread = self.get_thread(slug_or_id).await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(thread = thread.id, count = posts.len(), "creating posts");

        let mut canonical = HashMap::new();
        for author in distinct_authors(posts.iter().map(|post| post.author.as_str())) {
            let user = self
                .users
                .find_user(author)
                .await?
                .ok_or_else(|| DomainError::OwnerNotFound(author.to_string()))?;
            canonical.insert(fold_key(author), user.nickname);
        }
        for post in &mut posts {
            if let Some(nickname) = canonical.get(&fold_key(&post.author)) {
                post.author = nickname.clone();
            }
        }

        let created = self.posts.create_posts(&thread, posts).await?;
        info!(thread = thread.id, count = created.len(), "posts created");
        Ok(created)
    }

    /// One page of the thread's posts in the requested order.
    pub async fn list_posts(&self, slug_or_id: &str, query: PostListQuery) -> Result<Vec<Post>> {
        let thread = self.get_thread(slug_or_id).await?;
        let posts = self.posts.list_posts(thread.id, &query).await?;
        debug!(
            thread = thread.id,
            sort = %query.sort,
            desc = query.desc,
            limit = query.limit,
            since = ?query.since,
            returned = posts.len(),
            "listed posts"
        );
        Ok(posts)
    }

    /// Records a vote and returns the thread with its updated tally.
    pub async fn vote(&self, slug_or_id: &str, vote: Vote) -> Result<Thread> {
        let voter = self
            .users
            .find_user(&vote.nickname)
            .await?
            .ok_or_else(|| DomainError::OwnerNotFound(vote.nickname.clone()))?;
        let thread = self.get_thread(slug_or_id).await?;

        let updated = self
            .threads
            .vote(thread.id, &voter.nickname, vote.voice)
            .await?
            .ok_or_else(|| DomainError::ThreadNotFound(slug_or_id.to_string()))?;
        debug!(thread = updated.id, voter = %voter.nickname, votes = updated.votes, "vote recorded");
        Ok(updated)
    }

    /// Edits title and/or message. An empty update returns the thread as is.
    pub async fn update_thread(&self, slug_or_id: &str, update: ThreadUpdate) -> Result<Thread> {
        let thread = self.get_thread(slug_or_id).await?;
        if update.is_empty() {
            return Ok(thread);
        }
        self.threads
            .update_thread(thread.id, &update)
            .await?
            .ok_or_else(|| DomainError::ThreadNotFound(slug_or_id.to_string()))
    }
}
