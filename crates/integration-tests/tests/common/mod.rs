//! Shared fixtures: a forum "rust" owned by alice, with bob and carol as
//! further users and one thread "ownership".

#![allow(dead_code)]

use std::sync::Arc;

use domains::{NewForum, NewPost, NewThread, Post, Thread, UserProfile};
use services::Services;
use storage_adapters::MemoryStore;

pub struct Fixture {
    pub services: Services,
    pub thread: Thread,
}

pub fn profile(nickname: &str) -> UserProfile {
    UserProfile {
        fullname: format!("{nickname} Tester"),
        about: String::new(),
        email: format!("{nickname}@example.org"),
    }
}

pub async fn seeded() -> Fixture {
    let services = Services::new(Arc::new(MemoryStore::new()));
    for nickname in ["alice", "bob", "carol"] {
        services
            .users
            .create_user(nickname, profile(nickname))
            .await
            .expect("create user");
    }
    services
        .forums
        .create_forum(NewForum {
            slug: "rust".into(),
            title: "Rust".into(),
            user: "alice".into(),
        })
        .await
        .expect("create forum");
    let thread = services
        .forums
        .create_thread(
            "rust",
            NewThread {
                title: "Ownership".into(),
                author: "alice".into(),
                forum: String::new(),
                message: "Who owns what?".into(),
                slug: Some("ownership".into()),
                created: None,
            },
        )
        .await
        .expect("create thread");
    Fixture { services, thread }
}

pub fn post(parent: i64, author: &str, message: &str) -> NewPost {
    NewPost {
        parent,
        author: author.into(),
        message: message.into(),
    }
}

pub fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|post| post.id).collect()
}
