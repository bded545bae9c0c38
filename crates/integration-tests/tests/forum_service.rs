//! Users, forums and threads: conflicts, counters and forum membership.

mod common;

use common::{post, profile, seeded};
use domains::{DomainError, ForumUserQuery, NewForum, NewThread, ThreadListQuery, UserUpdate};
use tokio_test::{assert_err, assert_ok};

fn new_thread(author: &str, slug: Option<&str>) -> NewThread {
    NewThread {
        title: "Lifetimes".into(),
        author: author.into(),
        forum: String::new(),
        message: "'a".into(),
        slug: slug.map(str::to_string),
        created: None,
    }
}

#[tokio::test]
async fn user_conflicts_report_every_owner() {
    let fixture = seeded().await;
    let users = &fixture.services.users;

    let err = assert_err!(users.create_user("ALICE", profile("dave")).await);
    assert!(matches!(&err, DomainError::UserConflict(found) if found.len() == 1 && found[0].nickname == "alice"));

    // Nickname of one user, email of another.
    let err = assert_err!(users.create_user("alice", profile("bob")).await);
    match err {
        DomainError::UserConflict(found) => {
            let names: Vec<_> = found.iter().map(|u| u.nickname.as_str()).collect();
            assert_eq!(names, vec!["alice", "bob"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = assert_err!(
        users
            .update_user(
                "carol",
                UserUpdate {
                    email: Some("BOB@example.org".into()),
                    ..UserUpdate::default()
                },
            )
            .await
    );
    assert!(matches!(err, DomainError::EmailTaken(_)));
}

#[tokio::test]
async fn forum_and_thread_conflicts_return_the_stored_entity() {
    let fixture = seeded().await;
    let forums = &fixture.services.forums;

    let err = assert_err!(
        forums
            .create_forum(NewForum {
                slug: "RUST".into(),
                title: "Other".into(),
                user: "bob".into(),
            })
            .await
    );
    assert!(matches!(err, DomainError::ForumConflict(forum) if forum.title == "Rust" && forum.user == "alice"));

    let err = assert_err!(forums.create_thread("rust", new_thread("bob", Some("OWNERSHIP"))).await);
    assert!(matches!(err, DomainError::ThreadConflict(thread) if thread.id == fixture.thread.id));

    let err = assert_err!(forums.create_thread("nope", new_thread("bob", None)).await);
    assert!(matches!(err, DomainError::ForumNotFound(_)));
    let err = assert_err!(forums.create_thread("rust", new_thread("ghost", None)).await);
    assert!(matches!(err, DomainError::OwnerNotFound(_)));
}

#[tokio::test]
async fn counters_follow_threads_and_posts() {
    let fixture = seeded().await;
    let services = &fixture.services;

    let thread = assert_ok!(services.forums.create_thread("Rust", new_thread("Bob", None)).await);
    assert_eq!(thread.forum, "rust");
    assert_eq!(thread.author, "bob");
    assert_eq!(thread.slug, None);

    assert_ok!(
        services
            .threads
            .create_posts(&thread.id.to_string(), vec![post(0, "carol", "a"), post(0, "alice", "b")])
            .await
    );

    let forum = assert_ok!(services.forums.get_forum("rust").await);
    assert_eq!(forum.threads, 2);
    assert_eq!(forum.posts, 2);

    let status = assert_ok!(services.maintenance.status().await);
    assert_eq!((status.user, status.forum, status.thread, status.post), (3, 1, 2, 2));

    assert_ok!(services.maintenance.clear().await);
    let status = assert_ok!(services.maintenance.status().await);
    assert_eq!((status.user, status.forum, status.thread, status.post), (0, 0, 0, 0));
}

#[tokio::test]
async fn forum_threads_page_by_creation_time() {
    let fixture = seeded().await;
    let forums = &fixture.services.forums;
    let base = fixture.thread.created;
    for offset in 1..=3 {
        let mut thread = new_thread("bob", None);
        thread.created = Some(base + chrono::Duration::minutes(offset));
        assert_ok!(forums.create_thread("rust", thread).await);
    }

    let listed = assert_ok!(
        forums
            .list_threads(
                "rust",
                ThreadListQuery {
                    limit: 2,
                    since: Some(base + chrono::Duration::minutes(2)),
                    desc: true,
                },
            )
            .await
    );
    let ids: Vec<_> = listed.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![3, 2]);

    let err = assert_err!(forums.list_threads("nope", ThreadListQuery::default()).await);
    assert!(matches!(err, DomainError::ForumNotFound(_)));
}

#[tokio::test]
async fn forum_users_are_authors_of_threads_or_posts() {
    let fixture = seeded().await;
    let services = &fixture.services;
    assert_ok!(services.users.create_user("Zed", profile("zed")).await);
    assert_ok!(
        services
            .threads
            .create_posts("ownership", vec![post(0, "zed", "hi"), post(0, "carol", "yo")])
            .await
    );

    let everyone = assert_ok!(services.forums.list_users("rust", ForumUserQuery::default()).await);
    let names: Vec<_> = everyone.iter().map(|u| u.nickname.as_str()).collect();
    assert_eq!(names, vec!["alice", "carol", "Zed"]);

    let after = assert_ok!(
        services
            .forums
            .list_users(
                "rust",
                ForumUserQuery {
                    limit: 1,
                    since: Some("ALICE".into()),
                    desc: false,
                },
            )
            .await
    );
    assert_eq!(after[0].nickname, "carol");

    let before = assert_ok!(
        services
            .forums
            .list_users(
                "rust",
                ForumUserQuery {
                    limit: 0,
                    since: Some("zed".into()),
                    desc: true,
                },
            )
            .await
    );
    let names: Vec<_> = before.iter().map(|u| u.nickname.as_str()).collect();
    assert_eq!(names, vec!["carol", "alice"]);
}
