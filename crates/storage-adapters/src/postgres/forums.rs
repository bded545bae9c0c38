use async_trait::async_trait;
use domains::{
    Forum, ForumRepository, ForumUserQuery, NewForum, Persisted, Result, Thread, ThreadListQuery,
    User,
};

use super::{
    db_error, forum_from_row, is_unique_violation, limit_param, map_rows, thread_from_row,
    user_from_row, PgStore, FORUM_COLUMNS, THREAD_COLUMNS,
};

#[async_trait]
impl ForumRepository for PgStore {
    async fn insert_forum(&self, forum: &NewForum) -> Result<Persisted<Forum>> {
        let inserted = sqlx::query(&format!(
            "INSERT INTO forums (slug, title, user_nickname) VALUES ($1, $2, $3)
             RETURNING {FORUM_COLUMNS}"
        ))
        .bind(&forum.slug)
        .bind(&forum.title)
        .bind(&forum.user)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => forum_from_row(&row)
                .map(Persisted::Stored)
                .map_err(db_error("decode forum")),
            Err(err) if is_unique_violation(&err) => Ok(Persisted::Duplicate),
            Err(err) => Err(db_error("insert forum")(err)),
        }
    }

    async fn find_forum(&self, slug: &str) -> Result<Option<Forum>> {
        let row = sqlx::query(&format!(
            "SELECT {FORUM_COLUMNS} FROM forums WHERE slug = $1::citext"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find forum"))?;

        row.as_ref()
            .map(forum_from_row)
            .transpose()
            .map_err(db_error("decode forum"))
    }

    async fn list_forum_threads(&self, slug: &str, query: &ThreadListQuery) -> Result<Vec<Thread>> {
        let sql = if query.desc {
            format!(
                "SELECT {THREAD_COLUMNS} FROM threads
                 WHERE forum = $1::citext AND ($2::timestamptz IS NULL OR created <= $2)
                 ORDER BY created DESC, id DESC
                 LIMIT $3"
            )
        } else {
            format!(
                "SELECT {THREAD_COLUMNS} FROM threads
                 WHERE forum = $1::citext AND ($2::timestamptz IS NULL OR created >= $2)
                 ORDER BY created, id
                 LIMIT $3"
            )
        };
        let rows = sqlx::query(&sql)
            .bind(slug)
            .bind(query.since)
            .bind(limit_param(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list forum threads"))?;

        map_rows(&rows, thread_from_row, "decode thread")
    }

    async fn list_forum_users(&self, slug: &str, query: &ForumUserQuery) -> Result<Vec<User>> {
        let (cursor, order) = if query.desc {
            ("fu.sort_key < lower($2) COLLATE \"C\"", "DESC")
        } else {
            ("fu.sort_key > lower($2) COLLATE \"C\"", "ASC")
        };
        let sql = format!(
            "SELECT u.nickname, u.fullname, u.about, u.email
             FROM forum_users fu
             JOIN users u ON u.nickname = fu.user_nickname
             WHERE fu.forum_slug = $1::citext AND ($2::text IS NULL OR {cursor})
             ORDER BY fu.sort_key {order}
             LIMIT $3"
        );
        let rows = sqlx::query(&sql)
            .bind(slug)
            .bind(query.since.as_deref())
            .bind(limit_param(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list forum users"))?;

        map_rows(&rows, user_from_row, "decode user")
    }
}
