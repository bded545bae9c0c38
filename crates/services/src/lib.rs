//! # services
//!
//! Use-case orchestration on top of the domain ports. Services validate
//! input, check that referenced entities exist, apply the resolve-by-re-read
//! conflict policy and leave every multi-record mutation to a single
//! repository call so the adapter can run it atomically.

pub mod forum_service;
pub mod maintenance_service;
pub mod post_service;
pub mod thread_service;
pub mod user_service;

use std::sync::Arc;

use domains::{
    ForumRepository, MaintenanceRepository, PostRepository, ThreadRepository, UserRepository,
};

pub use forum_service::ForumService;
pub use maintenance_service::MaintenanceService;
pub use post_service::PostService;
pub use thread_service::ThreadService;
pub use user_service::UserService;

/// Every service, wired to one store.
pub struct Services {
    pub users: UserService,
    pub forums: ForumService,
    pub threads: ThreadService,
    pub posts: PostService,
    pub maintenance: MaintenanceService,
}

impl Services {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + ForumRepository
            + ThreadRepository
            + PostRepository
            + MaintenanceRepository
            + 'static,
    {
        let users: Arc<dyn UserRepository> = store.clone();
        let forums: Arc<dyn ForumRepository> = store.clone();
        let threads: Arc<dyn ThreadRepository> = store.clone();
        let posts: Arc<dyn PostRepository> = store.clone();
        let maintenance: Arc<dyn MaintenanceRepository> = store;

        Self {
            users: UserService::new(users.clone()),
            forums: ForumService::new(forums.clone(), threads.clone(), users.clone()),
            threads: ThreadService::new(threads.clone(), posts.clone(), users.clone()),
            posts: PostService::new(posts, threads, forums, users),
            maintenance: MaintenanceService::new(maintenance),
        }
    }
}
