use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use domains::insertion::{assign_paths, distinct_authors, external_parents, stage, ParentLocation};
use domains::{NewPost, Post, PostListQuery, PostPath, PostRepository, Result, SortMode, Thread};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::debug;

use super::{db_error, limit_param, map_rows, post_from_row, PgStore, POST_COLUMNS};

/// Rows per multi-row INSERT; keeps the bind count far below the protocol limit.
const INSERT_CHUNK: usize = 1000;

#[async_trait]
impl PostRepository for PgStore {
    async fn create_posts(&self, thread: &Thread, posts: Vec<NewPost>) -> Result<Vec<Post>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.pool.begin().await.map_err(db_error("begin post batch"))?;

        // Ids come from the sequence up front so paths can be built before
        // anything is written.
        let mut ids: Vec<i64> = sqlx::query_scalar(
            "SELECT nextval(pg_get_serial_sequence('posts', 'id')) FROM generate_series(1, $1)",
        )
        .bind(posts.len() as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("reserve post ids"))?;
        ids.sort_unstable();

        let mut batch = stage(thread, &ids, posts, Utc::now());

        let parents = external_parents(&batch);
        let mut committed = HashMap::with_capacity(parents.len());
        if !parents.is_empty() {
            let rows = sqlx::query(
                "SELECT id, path, root_parent_id FROM posts WHERE thread_id = $1 AND id = ANY($2)",
            )
            .bind(thread.id)
            .bind(&parents)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error("load parent posts"))?;
            for row in &rows {
                let id: i64 = row.try_get("id").map_err(db_error("decode parent"))?;
                let path: Vec<i64> = row.try_get("path").map_err(db_error("decode parent"))?;
                let root_parent_id: i64 =
                    row.try_get("root_parent_id").map_err(db_error("decode parent"))?;
                committed.insert(
                    id,
                    ParentLocation {
                        path: PostPath::from(path),
                        root_parent_id,
                    },
                );
            }
        }
        // Dropping `tx` on error rolls back; the reserved ids are simply skipped.
        assign_paths(thread.id, &mut batch, &committed)?;

        for chunk in batch.chunks(INSERT_CHUNK) {
            let mut insert = QueryBuilder::<Postgres>::new(
                "INSERT INTO posts (id, parent, author, message, is_edited, forum, thread_id, created, path, root_parent_id) ",
            );
            insert.push_values(chunk, |mut row, post| {
                row.push_bind(post.id)
                    .push_bind(post.parent)
                    .push_bind(&post.author)
                    .push_bind(&post.message)
                    .push_bind(post.is_edited)
                    .push_bind(&post.forum)
                    .push_bind(post.thread)
                    .push_bind(post.created)
                    .push_bind(post.path.ids().to_vec())
                    .push_bind(post.root_parent_id);
            });
            insert
                .build()
                .execute(&mut *tx)
                .await
                .map_err(db_error("insert posts"))?;
        }

        sqlx::query("UPDATE forums SET posts = posts + $2 WHERE slug = $1::citext")
            .bind(&thread.forum)
            .bind(batch.len() as i64)
            .execute(&mut *tx)
            .await
            .map_err(db_error("bump forum post count"))?;

        let authors: Vec<String> = distinct_authors(batch.iter().map(|post| post.author.as_str()))
            .into_iter()
            .map(str::to_string)
            .collect();
        sqlx::query(
            "INSERT INTO forum_users (forum_slug, user_nickname, sort_key)
             SELECT $1, author, lower(author) FROM UNNEST($2::text[]) AS author
             ON CONFLICT DO NOTHING",
        )
        .bind(&thread.forum)
        .bind(&authors)
        .execute(&mut *tx)
        .await
        .map_err(db_error("register forum members"))?;

        tx.commit().await.map_err(db_error("commit post batch"))?;
        debug!(thread = thread.id, count = batch.len(), "stored post batch");
        Ok(batch)
    }

    async fn list_posts(&self, thread_id: i64, query: &PostListQuery) -> Result<Vec<Post>> {
        let (before, order) = if query.desc {
            ("<", "DESC")
        } else {
            (">", "ASC")
        };
        // An unknown cursor makes the sub-select NULL, which yields an empty page.
        let sql = match query.sort {
            SortMode::Flat => format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE thread_id = $1
                   AND ($2::bigint IS NULL OR (created, id) {before}
                        (SELECT created, id FROM posts WHERE id = $2 AND thread_id = $1))
                 ORDER BY created {order}, id {order}
                 LIMIT $3"
            ),
            SortMode::Tree => format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE thread_id = $1
                   AND ($2::bigint IS NULL OR (path, id) {before}
                        (SELECT path, id FROM posts WHERE id = $2 AND thread_id = $1))
                 ORDER BY path {order}, id {order}
                 LIMIT $3"
            ),
            // The cap counts root posts; whole groups follow their root.
            SortMode::ParentTree => format!(
                "WITH roots AS (
                     SELECT id FROM posts
                     WHERE thread_id = $1 AND parent = 0
                       AND ($2::bigint IS NULL OR id {before}
                            (SELECT root_parent_id FROM posts WHERE id = $2 AND thread_id = $1))
                     ORDER BY id {order}
                     LIMIT $3
                 )
                 SELECT {POST_COLUMNS} FROM posts
                 WHERE root_parent_id IN (SELECT id FROM roots)
                 ORDER BY root_parent_id {order}, path, id"
            ),
        };

        let rows = sqlx::query(&sql)
            .bind(thread_id)
            .bind(query.cursor())
            .bind(limit_param(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list posts"))?;

        map_rows(&rows, post_from_row, "decode post")
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find post"))?;

        row.as_ref()
            .map(post_from_row)
            .transpose()
            .map_err(db_error("decode post"))
    }

    async fn update_post_message(&self, id: i64, message: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "UPDATE posts SET message = $2, is_edited = TRUE WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update post"))?;

        row.as_ref()
            .map(post_from_row)
            .transpose()
            .map_err(db_error("decode post"))
    }
}
