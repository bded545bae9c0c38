//! # PostgreSQL store
//!
//! Maps the relational schema in `migrations/` to the domain models.
//! Every multi-record mutation runs inside one transaction; unique-key
//! violations surface as [`Persisted::Duplicate`](domains::Persisted) so the
//! services can resolve them by re-reading.
//!
//! Case-insensitive columns are `CITEXT`. Parameters compared against them
//! are cast with `::citext`, otherwise Postgres would pick the case-sensitive
//! `text = text` operator.

mod forums;
mod maintenance;
mod posts;
mod threads;
mod users;

use std::time::Duration;

use domains::{DomainError, Forum, Post, PostPath, Thread, User};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{error, info};

/// Store backed by a sqlx connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens a pool against `url`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Wraps a sqlx error as a storage failure, naming the attempted operation.
fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |err| {
        error!(error = %err, context, "postgres query failed");
        DomainError::storage(context, err)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

const USER_COLUMNS: &str = "nickname, fullname, about, email";
const FORUM_COLUMNS: &str = "slug, title, user_nickname, posts, threads";
const THREAD_COLUMNS: &str = "id, title, author, forum, message, votes, slug, created";
const POST_COLUMNS: &str =
    "id, parent, author, message, is_edited, forum, thread_id, created, path, root_parent_id";

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        nickname: row.try_get("nickname")?,
        fullname: row.try_get("fullname")?,
        about: row.try_get("about")?,
        email: row.try_get("email")?,
    })
}

fn forum_from_row(row: &PgRow) -> Result<Forum, sqlx::Error> {
    Ok(Forum {
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        user: row.try_get("user_nickname")?,
        posts: row.try_get("posts")?,
        threads: row.try_get("threads")?,
    })
}

fn thread_from_row(row: &PgRow) -> Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        forum: row.try_get("forum")?,
        message: row.try_get("message")?,
        votes: row.try_get("votes")?,
        slug: row.try_get("slug")?,
        created: row.try_get("created")?,
    })
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        parent: row.try_get("parent")?,
        author: row.try_get("author")?,
        message: row.try_get("message")?,
        is_edited: row.try_get("is_edited")?,
        forum: row.try_get("forum")?,
        thread: row.try_get("thread_id")?,
        created: row.try_get("created")?,
        path: PostPath::from(row.try_get::<Vec<i64>, _>("path")?),
        root_parent_id: row.try_get("root_parent_id")?,
    })
}

/// Maps every row, failing on the first column that does not decode.
fn map_rows<T>(
    rows: &[PgRow],
    map: fn(&PgRow) -> Result<T, sqlx::Error>,
    context: &'static str,
) -> domains::Result<Vec<T>> {
    rows.iter()
        .map(map)
        .collect::<Result<Vec<T>, _>>()
        .map_err(db_error(context))
}

/// Postgres treats `LIMIT NULL` as no limit; 0 is bound as NULL.
fn limit_param(limit: u32) -> Option<i64> {
    (limit > 0).then_some(i64::from(limit))
}
