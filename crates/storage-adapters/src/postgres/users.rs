use async_trait::async_trait;
use domains::{Persisted, Result, User, UserRepository, UserUpdate};

use super::{db_error, is_unique_violation, user_from_row, PgStore, USER_COLUMNS};

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> Result<Persisted<User>> {
        let inserted = sqlx::query(
            "INSERT INTO users (nickname, fullname, about, email) VALUES ($1, $2, $3, $4)",
        )
        .bind(&user.nickname)
        .bind(&user.fullname)
        .bind(&user.about)
        .bind(&user.email)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(Persisted::Stored(user.clone())),
            Err(err) if is_unique_violation(&err) => Ok(Persisted::Duplicate),
            Err(err) => Err(db_error("insert user")(err)),
        }
    }

    async fn find_user(&self, nickname: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE nickname = $1::citext"
        ))
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find user"))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(db_error("decode user"))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1::citext"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("find user by email"))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(db_error("decode user"))
    }

    async fn update_user(&self, nickname: &str, update: &UserUpdate) -> Result<Option<Persisted<User>>> {
        let updated = sqlx::query(&format!(
            "UPDATE users SET
                fullname = COALESCE($2, fullname),
                about    = COALESCE($3, about),
                email    = COALESCE($4, email)
             WHERE nickname = $1::citext
             RETURNING {USER_COLUMNS}"
        ))
        .bind(nickname)
        .bind(update.fullname.as_deref())
        .bind(update.about.as_deref())
        .bind(update.email.as_deref())
        .fetch_optional(&self.pool)
        .await;

        match updated {
            Ok(Some(row)) => user_from_row(&row)
                .map(|user| Some(Persisted::Stored(user)))
                .map_err(db_error("decode user")),
            Ok(None) => Ok(None),
            Err(err) if is_unique_violation(&err) => Ok(Some(Persisted::Duplicate)),
            Err(err) => Err(db_error("update user")(err)),
        }
    }
}
