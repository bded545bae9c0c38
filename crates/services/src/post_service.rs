//! Single-post details and edits.

use std::sync::Arc;

use domains::{
    DomainError, ForumRepository, Post, PostDetails, PostRepository, PostUpdate, Related, Result,
    ThreadLocator, ThreadRepository, UserRepository,
};
use tracing::debug;

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    threads: Arc<dyn ThreadRepository>,
    forums: Arc<dyn ForumRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        threads: Arc<dyn ThreadRepository>,
        forums: Arc<dyn ForumRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            posts,
            threads,
            forums,
            users,
        }
    }

    pub async fn get_post(&self, id: i64) -> Result<Post> {
        self.posts
            .find_post(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// The post plus whichever related entities were asked for.
    pub async fn details(&self, id: i64, related: &[Related]) -> Result<PostDetails> {
        let post = self.get_post(id).await?;
        let mut details = PostDetails {
            post,
            author: None,
            thread: None,
            forum: None,
        };

        for item in related {
            match item {
                Related::User => {
                    let author = &details.post.author;
                    details.author = Some(
                        self.users
                            .find_user(author)
                            .await?
                            .ok_or_else(|| DomainError::UserNotFound(author.clone()))?,
                    );
                }
                Related::Thread => {
                    let thread_id = details.post.thread;
                    details.thread = Some(
                        self.threads
                            .find_thread(&ThreadLocator::Id(thread_id))
                            .await?
                            .ok_or_else(|| DomainError::ThreadNotFound(thread_id.to_string()))?,
                    );
                }
                Related::Forum => {
                    let slug = &details.post.forum;
                    details.forum = Some(
                        self.forums
                            .find_forum(slug)
                            .await?
                            .ok_or_else(|| DomainError::ForumNotFound(slug.clone()))?,
                    );
                }
            }
        }
        Ok(details)
    }

    /// Replaces the message. An empty or identical message leaves the post
    /// untouched, including its edited flag.
    pub async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Post> {
        let post = self.get_post(id).await?;
        if update.message.is_empty() || update.message == post.message {
            return Ok(post);
        }

        let updated = self
            .posts
            .update_post_message(id, &update.message)
            .await?
            .ok_or(DomainError::PostNotFound(id))?;
        debug!(post = id, "post edited");
        Ok(updated)
    }
}
