//! In-process store.
//!
//! Every port method takes the single state lock for its whole duration, so
//! multi-record mutations (thread creation, voting, post batches) are atomic
//! with respect to each other. Case-insensitive keys use [`fold_key`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use domains::insertion::{assign_paths, external_parents, stage, ParentLocation};
use domains::traversal::paginate;
use domains::{
    apply_vote, fold_key, page_cap, DomainError, Forum, ForumRepository, ForumUserQuery,
    MaintenanceRepository, NewForum, NewPost, NewThread, Persisted, Post, PostListQuery,
    PostRepository, Result, Status, Thread, ThreadListQuery, ThreadLocator, ThreadRepository,
    ThreadUpdate, User, UserRepository, UserUpdate,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct State {
    /// Keyed by folded nickname
    users: HashMap<String, User>,
    /// Folded email to folded nickname
    emails: HashMap<String, String>,
    /// Keyed by folded slug
    forums: HashMap<String, Forum>,
    /// Folded forum slug to the folded nicknames of its members
    members: HashMap<String, BTreeSet<String>>,
    threads: BTreeMap<i64, Thread>,
    thread_slugs: HashMap<String, i64>,
    posts: BTreeMap<i64, Post>,
    thread_posts: HashMap<i64, Vec<i64>>,
    /// (thread id, folded nickname) to voice
    votes: HashMap<(i64, String), i32>,
    last_thread_id: i64,
    last_post_id: i64,
}

impl State {
    fn join_forum<'a>(&mut self, forum: &str, nicknames: impl IntoIterator<Item = &'a str>) {
        let members = self.members.entry(fold_key(forum)).or_default();
        members.extend(nicknames.into_iter().map(fold_key));
    }

    fn forum_mut(&mut self, slug: &str) -> Result<&mut Forum> {
        self.forums
            .get_mut(&fold_key(slug))
            .ok_or_else(|| DomainError::ForumNotFound(slug.to_string()))
    }
}

/// Store kept entirely in memory. Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<Persisted<User>> {
        let mut state = self.state.write().await;
        let key = fold_key(&user.nickname);
        let email = fold_key(&user.email);
        if state.users.contains_key(&key) || state.emails.contains_key(&email) {
            return Ok(Persisted::Duplicate);
        }
        state.emails.insert(email, key.clone());
        state.users.insert(key, user.clone());
        Ok(Persisted::Stored(user.clone()))
    }

    async fn find_user(&self, nickname: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&fold_key(nickname)).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .emails
            .get(&fold_key(email))
            .and_then(|key| state.users.get(key))
            .cloned())
    }

    async fn update_user(&self, nickname: &str, update: &UserUpdate) -> Result<Option<Persisted<User>>> {
        let mut state = self.state.write().await;
        let key = fold_key(nickname);
        let Some(current_email) = state.users.get(&key).map(|user| fold_key(&user.email)) else {
            return Ok(None);
        };

        if let Some(email) = &update.email {
            let folded = fold_key(email);
            match state.emails.get(&folded).cloned() {
                Some(owner) if owner != key => return Ok(Some(Persisted::Duplicate)),
                _ => {
                    state.emails.remove(&current_email);
                    state.emails.insert(folded, key.clone());
                }
            }
        }

        let Some(user) = state.users.get_mut(&key) else {
            return Ok(None);
        };
        if let Some(fullname) = &update.fullname {
            user.fullname = fullname.clone();
        }
        if let Some(about) = &update.about {
            user.about = about.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        Ok(Some(Persisted::Stored(user.clone())))
    }
}

#[async_trait]
impl ForumRepository for MemoryStore {
    async fn insert_forum(&self, forum: &NewForum) -> Result<Persisted<Forum>> {
        let mut state = self.state.write().await;
        let key = fold_key(&forum.slug);
        if state.forums.contains_key(&key) {
            return Ok(Persisted::Duplicate);
        }
        let created = Forum {
            slug: forum.slug.clone(),
            title: forum.title.clone(),
            user: forum.user.clone(),
            posts: 0,
            threads: 0,
        };
        state.forums.insert(key, created.clone());
        Ok(Persisted::Stored(created))
    }

    async fn find_forum(&self, slug: &str) -> Result<Option<Forum>> {
        Ok(self.state.read().await.forums.get(&fold_key(slug)).cloned())
    }

    async fn list_forum_threads(&self, slug: &str, query: &ThreadListQuery) -> Result<Vec<Thread>> {
        let state = self.state.read().await;
        let key = fold_key(slug);
        let mut threads: Vec<Thread> = state
            .threads
            .values()
            .filter(|thread| fold_key(&thread.forum) == key)
            .filter(|thread| match query.since {
                Some(since) if query.desc => thread.created <= since,
                Some(since) => thread.created >= since,
                None => true,
            })
            .cloned()
            .collect();

        threads.sort_by_key(|thread| (thread.created, thread.id));
        if query.desc {
            threads.reverse();
        }
        if let Some(cap) = page_cap(query.limit) {
            threads.truncate(cap);
        }
        Ok(threads)
    }

    async fn list_forum_users(&self, slug: &str, query: &ForumUserQuery) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let Some(members) = state.members.get(&fold_key(slug)) else {
            return Ok(Vec::new());
        };
        let since = query.since.as_deref().map(fold_key);
        let after_cursor = |key: &&String| match &since {
            Some(since) if query.desc => key.as_str() < since.as_str(),
            Some(since) => key.as_str() > since.as_str(),
            None => true,
        };

        let keys: Box<dyn Iterator<Item = &String>> = if query.desc {
            Box::new(members.iter().rev())
        } else {
            Box::new(members.iter())
        };
        let cap = page_cap(query.limit).unwrap_or(usize::MAX);
        Ok(keys
            .filter(after_cursor)
            .filter_map(|key| state.users.get(key))
            .take(cap)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ThreadRepository for MemoryStore {
    async fn insert_thread(&self, thread: &NewThread) -> Result<Persisted<Thread>> {
        let mut state = self.state.write().await;
        let slug_key = thread.slug.as_deref().map(fold_key);
        if let Some(key) = &slug_key {
            if state.thread_slugs.contains_key(key) {
                return Ok(Persisted::Duplicate);
            }
        }

        let forum = state.forum_mut(&thread.forum)?;
        forum.threads += 1;
        let forum_slug = forum.slug.clone();

        state.last_thread_id += 1;
        let created = Thread {
            id: state.last_thread_id,
            title: thread.title.clone(),
            author: thread.author.clone(),
            forum: forum_slug,
            message: thread.message.clone(),
            votes: 0,
            slug: thread.slug.clone(),
            created: thread.created.unwrap_or_else(Utc::now),
        };
        if let Some(key) = slug_key {
            state.thread_slugs.insert(key, created.id);
        }
        state.join_forum(&created.forum, [created.author.as_str()]);
        state.threads.insert(created.id, created.clone());
        Ok(Persisted::Stored(created))
    }

    async fn find_thread(&self, locator: &ThreadLocator) -> Result<Option<Thread>> {
        let state = self.state.read().await;
        let id = match locator {
            ThreadLocator::Id(id) => Some(*id),
            ThreadLocator::Slug(slug) => state.thread_slugs.get(&fold_key(slug)).copied(),
        };
        Ok(id.and_then(|id| state.threads.get(&id)).cloned())
    }

    async fn update_thread(&self, id: i64, update: &ThreadUpdate) -> Result<Option<Thread>> {
        let mut state = self.state.write().await;
        let Some(thread) = state.threads.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            thread.title = title.clone();
        }
        if let Some(message) = &update.message {
            thread.message = message.clone();
        }
        Ok(Some(thread.clone()))
    }

    async fn vote(&self, thread_id: i64, nickname: &str, voice: i32) -> Result<Option<Thread>> {
        let mut state = self.state.write().await;
        let Some(tally) = state.threads.get(&thread_id).map(|thread| thread.votes) else {
            return Ok(None);
        };
        let key = (thread_id, fold_key(nickname));
        let votes = apply_vote(tally, state.votes.get(&key).copied(), voice)?;
        state.votes.insert(key, voice);
        Ok(state.threads.get_mut(&thread_id).map(|thread| {
            thread.votes = votes;
            thread.clone()
        }))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_posts(&self, thread: &Thread, posts: Vec<NewPost>) -> Result<Vec<Post>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let mut state = self.state.write().await;

        let first = state.last_post_id + 1;
        let ids: Vec<i64> = (first..first + posts.len() as i64).collect();
        let mut batch = stage(thread, &ids, posts, Utc::now());

        let committed: HashMap<i64, ParentLocation> = external_parents(&batch)
            .into_iter()
            .filter_map(|id| state.posts.get(&id))
            .filter(|parent| parent.thread == thread.id)
            .map(|parent| {
                let location = ParentLocation {
                    path: parent.path.clone(),
                    root_parent_id: parent.root_parent_id,
                };
                (parent.id, location)
            })
            .collect();
        // Nothing has been written yet, so a failure here leaves the store untouched.
        assign_paths(thread.id, &mut batch, &committed)?;

        state.forum_mut(&thread.forum)?.posts += batch.len() as i64;
        state.last_post_id += batch.len() as i64;
        state.join_forum(&thread.forum, batch.iter().map(|post| post.author.as_str()));
        let thread_posts = state.thread_posts.entry(thread.id).or_default();
        thread_posts.extend(batch.iter().map(|post| post.id));
        for post in &batch {
            state.posts.insert(post.id, post.clone());
        }
        debug!(thread = thread.id, first, count = batch.len(), "stored post batch");
        Ok(batch)
    }

    async fn list_posts(&self, thread_id: i64, query: &PostListQuery) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let posts: Vec<Post> = state
            .thread_posts
            .get(&thread_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.posts.get(id))
            .cloned()
            .collect();
        Ok(paginate(posts, query))
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn update_post_message(&self, id: i64, message: &str) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        Ok(state.posts.get_mut(&id).map(|post| {
            post.message = message.to_string();
            post.is_edited = true;
            post.clone()
        }))
    }
}

#[async_trait]
impl MaintenanceRepository for MemoryStore {
    async fn status(&self) -> Result<Status> {
        let state = self.state.read().await;
        Ok(Status {
            user: state.users.len() as i64,
            forum: state.forums.len() as i64,
            thread: state.threads.len() as i64,
            post: state.posts.len() as i64,
        })
    }

    async fn clear(&self) -> Result<()> {
        *self.state.write().await = State::default();
        Ok(())
    }
}
