use async_trait::async_trait;
use domains::{
    apply_vote, DomainError, NewThread, Persisted, Result, Thread, ThreadLocator, ThreadRepository,
    ThreadUpdate,
};
use sqlx::Row;
use tracing::debug;

use super::{db_error, is_unique_violation, thread_from_row, PgStore, THREAD_COLUMNS};

#[async_trait]
impl ThreadRepository for PgStore {
    /// Thread row, forum counter and forum membership commit together.
    async fn insert_thread(&self, thread: &NewThread) -> Result<Persisted<Thread>> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin thread insert"))?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO threads (title, author, forum, message, slug, created)
             SELECT $1, $2, f.slug, $3, $4, COALESCE($5, now())
             FROM forums f WHERE f.slug = $6::citext
             RETURNING {THREAD_COLUMNS}"
        ))
        .bind(&thread.title)
        .bind(&thread.author)
        .bind(&thread.message)
        .bind(thread.slug.as_deref())
        .bind(thread.created)
        .bind(&thread.forum)
        .fetch_optional(&mut *tx)
        .await;

        let row = match inserted {
            Ok(Some(row)) => row,
            Ok(None) => return Err(DomainError::ForumNotFound(thread.forum.clone())),
            Err(err) if is_unique_violation(&err) => return Ok(Persisted::Duplicate),
            Err(err) => return Err(db_error("insert thread")(err)),
        };
        let created = thread_from_row(&row).map_err(db_error("decode thread"))?;

        sqlx::query("UPDATE forums SET threads = threads + 1 WHERE slug = $1::citext")
            .bind(&created.forum)
            .execute(&mut *tx)
            .await
            .map_err(db_error("bump forum thread count"))?;

        sqlx::query(
            "INSERT INTO forum_users (forum_slug, user_nickname, sort_key)
             VALUES ($1, $2, lower($2))
             ON CONFLICT DO NOTHING",
        )
        .bind(&created.forum)
        .bind(&created.author)
        .execute(&mut *tx)
        .await
        .map_err(db_error("register forum member"))?;

        tx.commit().await.map_err(db_error("commit thread insert"))?;
        Ok(Persisted::Stored(created))
    }

    async fn find_thread(&self, locator: &ThreadLocator) -> Result<Option<Thread>> {
        let query = match locator {
            ThreadLocator::Id(id) => {
                sqlx::query(&format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = $1"))
                    .bind(*id)
                    .fetch_optional(&self.pool)
                    .await
            }
            ThreadLocator::Slug(slug) => {
                sqlx::query(&format!(
                    "SELECT {THREAD_COLUMNS} FROM threads WHERE slug = $1::citext"
                ))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
            }
        };
        let row = query.map_err(db_error("find thread"))?;

        row.as_ref()
            .map(thread_from_row)
            .transpose()
            .map_err(db_error("decode thread"))
    }

    async fn update_thread(&self, id: i64, update: &ThreadUpdate) -> Result<Option<Thread>> {
        let row = sqlx::query(&format!(
            "UPDATE threads SET
                title   = COALESCE($2, title),
                message = COALESCE($3, message)
             WHERE id = $1
             RETURNING {THREAD_COLUMNS}"
        ))
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.message.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update thread"))?;

        row.as_ref()
            .map(thread_from_row)
            .transpose()
            .map_err(db_error("decode thread"))
    }

    /// Locks the thread row first so concurrent votes on one thread apply
    /// their tally updates one after another.
    async fn vote(&self, thread_id: i64, nickname: &str, voice: i32) -> Result<Option<Thread>> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin vote"))?;

        let locked = sqlx::query("SELECT votes FROM threads WHERE id = $1 FOR UPDATE")
            .bind(thread_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("lock thread"))?;
        let Some(locked) = locked else {
            return Ok(None);
        };
        let tally: i32 = locked.try_get("votes").map_err(db_error("decode tally"))?;

        let previous: Option<i32> = sqlx::query(
            "SELECT voice FROM votes WHERE thread_id = $1 AND user_nickname = $2::citext",
        )
        .bind(thread_id)
        .bind(nickname)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("read previous vote"))?
        .map(|row| row.try_get("voice"))
        .transpose()
        .map_err(db_error("decode vote"))?;
        let votes = apply_vote(tally, previous, voice)?;

        sqlx::query(
            "INSERT INTO votes (thread_id, user_nickname, voice) VALUES ($1, $2, $3)
             ON CONFLICT (thread_id, user_nickname) DO UPDATE SET voice = EXCLUDED.voice",
        )
        .bind(thread_id)
        .bind(nickname)
        .bind(voice)
        .execute(&mut *tx)
        .await
        .map_err(db_error("store vote"))?;

        let row = sqlx::query(&format!(
            "UPDATE threads SET votes = $2 WHERE id = $1 RETURNING {THREAD_COLUMNS}"
        ))
        .bind(thread_id)
        .bind(votes)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("apply vote"))?;
        let thread = thread_from_row(&row).map_err(db_error("decode thread"))?;

        tx.commit().await.map_err(db_error("commit vote"))?;
        debug!(thread = thread_id, votes, "vote applied");
        Ok(Some(thread))
    }
}
