use async_trait::async_trait;
use domains::{MaintenanceRepository, Result, Status};
use sqlx::Row;

use super::{db_error, PgStore};

#[async_trait]
impl MaintenanceRepository for PgStore {
    async fn status(&self) -> Result<Status> {
        let row = sqlx::query(
            "SELECT
                (SELECT count(*) FROM users)   AS users,
                (SELECT count(*) FROM forums)  AS forums,
                (SELECT count(*) FROM threads) AS threads,
                (SELECT count(*) FROM posts)   AS posts",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count rows"))?;

        let count = |column: &str| -> Result<i64> {
            row.try_get(column).map_err(db_error("decode status"))
        };
        Ok(Status {
            user: count("users")?,
            forum: count("forums")?,
            thread: count("threads")?,
            post: count("posts")?,
        })
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query(
            "TRUNCATE votes, forum_users, posts, threads, forums, users RESTART IDENTITY CASCADE",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error("clear tables"))?;
        Ok(())
    }
}
