//! Post batches and the three traversal orders, end to end through the
//! services over the in-memory store.

mod common;

use common::{ids, post, seeded};
use domains::{DomainError, PostListQuery, SortMode};
use tokio_test::{assert_err, assert_ok};

fn query(sort: SortMode, limit: u32, since: Option<i64>, desc: bool) -> PostListQuery {
    PostListQuery { sort, limit, since, desc }
}

/// Builds A(1) <- B(2) <- C(3) and a second root D(4), one post per batch.
async fn abcd(fixture: &common::Fixture) -> Vec<i64> {
    let threads = &fixture.services.threads;
    let mut created = Vec::new();
    for (parent, message) in [(0, "A"), (1, "B"), (2, "C"), (0, "D")] {
        let batch = assert_ok!(threads.create_posts("ownership", vec![post(parent, "bob", message)]).await);
        created.extend(ids(&batch));
    }
    created
}

#[tokio::test]
async fn orders_agree_on_the_small_tree() {
    let fixture = seeded().await;
    assert_eq!(abcd(&fixture).await, vec![1, 2, 3, 4]);
    let threads = &fixture.services.threads;

    for sort in [SortMode::Tree, SortMode::ParentTree, SortMode::Flat] {
        let page = assert_ok!(threads.list_posts("ownership", query(sort, 0, None, false)).await);
        assert_eq!(ids(&page), vec![1, 2, 3, 4], "{sort} ascending");
    }

    let tree_desc = assert_ok!(threads.list_posts("1", query(SortMode::Tree, 0, None, true)).await);
    assert_eq!(ids(&tree_desc), vec![4, 3, 2, 1]);

    let groups_desc = assert_ok!(threads.list_posts("1", query(SortMode::ParentTree, 0, None, true)).await);
    assert_eq!(ids(&groups_desc), vec![4, 1, 2, 3]);
}

#[tokio::test]
async fn batch_can_reply_to_its_own_posts() {
    let fixture = seeded().await;
    let threads = &fixture.services.threads;

    let batch = assert_ok!(
        threads
            .create_posts("ownership", vec![post(0, "alice", "question"), post(1, "BOB", "answer")])
            .await
    );
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[1].parent, batch[0].id);
    assert_eq!(batch[1].path.depth(), 2);
    assert_eq!(batch[1].root_parent_id, batch[0].id);
    assert_eq!(batch[1].author, "bob");
    assert!(batch.iter().all(|p| p.created == batch[0].created));
    assert!(batch.iter().all(|p| p.forum == "rust" && p.thread == fixture.thread.id));

    let forum = assert_ok!(fixture.services.forums.get_forum("rust").await);
    assert_eq!(forum.posts, 2);
}

#[tokio::test]
async fn failing_batch_leaves_nothing_behind() {
    let fixture = seeded().await;
    let threads = &fixture.services.threads;
    assert_ok!(threads.create_posts("ownership", vec![post(0, "alice", "first")]).await);

    let err = assert_err!(
        threads
            .create_posts("ownership", vec![post(1, "bob", "fine"), post(42, "bob", "orphan")])
            .await
    );
    assert!(matches!(err, DomainError::ParentNotInThread { parent: 42, .. }));

    let err = assert_err!(
        threads
            .create_posts("ownership", vec![post(1, "bob", "fine"), post(1, "ghost", "boo")])
            .await
    );
    assert!(matches!(err, DomainError::OwnerNotFound(name) if name == "ghost"));

    let all = assert_ok!(threads.list_posts("ownership", PostListQuery::default()).await);
    assert_eq!(ids(&all), vec![1]);
    let status = assert_ok!(fixture.services.maintenance.status().await);
    assert_eq!(status.post, 1);

    // The in-memory store only advances its id counter on success.
    let next = assert_ok!(threads.create_posts("ownership", vec![post(1, "carol", "late")]).await);
    assert_eq!(next[0].id, 2);
}

#[tokio::test]
async fn parent_from_another_thread_is_rejected() {
    let fixture = seeded().await;
    let services = &fixture.services;
    let other = assert_ok!(
        services
            .forums
            .create_thread(
                "rust",
                domains::NewThread {
                    title: "Borrowing".into(),
                    author: "bob".into(),
                    forum: String::new(),
                    message: "&mut".into(),
                    slug: None,
                    created: None,
                },
            )
            .await
    );
    let foreign = assert_ok!(services.threads.create_posts(&other.id.to_string(), vec![post(0, "bob", "x")]).await);

    let err = assert_err!(
        services
            .threads
            .create_posts("ownership", vec![post(foreign[0].id, "alice", "y")])
            .await
    );
    assert!(matches!(err, DomainError::ParentNotInThread { .. }));
}

#[tokio::test]
async fn cursor_pages_concatenate_to_the_full_listing() {
    let fixture = seeded().await;
    let threads = &fixture.services.threads;
    abcd(&fixture).await;
    assert_ok!(
        threads
            .create_posts("ownership", vec![post(2, "carol", "E"), post(4, "carol", "F"), post(0, "alice", "G")])
            .await
    );

    for sort in [SortMode::Flat, SortMode::Tree] {
        for desc in [false, true] {
            let full = ids(&assert_ok!(threads.list_posts("ownership", query(sort, 0, None, desc)).await));
            let mut walked = Vec::new();
            let mut since = None;
            loop {
                let page = assert_ok!(threads.list_posts("ownership", query(sort, 2, since, desc)).await);
                if page.is_empty() {
                    break;
                }
                since = page.last().map(|p| p.id);
                walked.extend(ids(&page));
            }
            assert_eq!(walked, full, "{sort} desc={desc}");
        }
    }

    let first = assert_ok!(threads.list_posts("ownership", query(SortMode::ParentTree, 1, None, false)).await);
    assert_eq!(ids(&first), vec![1, 2, 3, 5]);
    let second = assert_ok!(threads.list_posts("ownership", query(SortMode::ParentTree, 1, Some(3), false)).await);
    assert_eq!(ids(&second), vec![4, 6]);
    let third = assert_ok!(threads.list_posts("ownership", query(SortMode::ParentTree, 5, Some(6), false)).await);
    assert_eq!(ids(&third), vec![7]);
}

#[tokio::test]
async fn unknown_cursor_or_thread() {
    let fixture = seeded().await;
    let threads = &fixture.services.threads;
    abcd(&fixture).await;

    let page = assert_ok!(threads.list_posts("ownership", query(SortMode::Tree, 10, Some(999), false)).await);
    assert!(page.is_empty());

    let err = assert_err!(threads.list_posts("missing", PostListQuery::default()).await);
    assert!(matches!(err, DomainError::ThreadNotFound(_)));
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let fixture = seeded().await;
    let created = assert_ok!(fixture.services.threads.create_posts("ownership", Vec::new()).await);
    assert!(created.is_empty());

    let err = assert_err!(fixture.services.threads.create_posts("missing", Vec::new()).await);
    assert!(matches!(err, DomainError::ThreadNotFound(_)));
}
