//! User registration and profiles.

use std::sync::Arc;

use domains::{fold_key, DomainError, Persisted, Result, User, UserProfile, UserRepository, UserUpdate};
use tracing::{debug, info, warn};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Registers a user. A taken nickname and/or email fails with every
    /// conflicting user attached.
    pub async fn create_user(&self, nickname: &str, profile: UserProfile) -> Result<User> {
        debug!(nickname, "creating user");

        let conflicts = self.conflicting_users(nickname, &profile.email).await?;
        if !conflicts.is_empty() {
            warn!(nickname, count = conflicts.len(), "user already exists");
            return Err(DomainError::UserConflict(conflicts));
        }

        let user = User {
            nickname: nickname.to_string(),
            fullname: profile.fullname,
            about: profile.about,
            email: profile.email,
        };
        match self.users.insert_user(&user).await? {
            Persisted::Stored(created) => {
                info!(nickname = %created.nickname, "user created");
                Ok(created)
            }
            Persisted::Duplicate => {
                // Lost an insert race: report whoever won.
                let winners = self.conflicting_users(nickname, &user.email).await?;
                if winners.is_empty() {
                    return Err(DomainError::StorageFailure(format!(
                        "user {nickname} reported as duplicate but no conflicting row found"
                    )));
                }
                warn!(nickname, "user insert lost a race");
                Err(DomainError::UserConflict(winners))
            }
        }
    }

    async fn conflicting_users(&self, nickname: &str, email: &str) -> Result<Vec<User>> {
        let mut found = Vec::with_capacity(2);
        if let Some(user) = self.users.find_user(nickname).await? {
            found.push(user);
        }
        if let Some(user) = self.users.find_user_by_email(email).await? {
            let key = fold_key(&user.nickname);
            if !found.iter().any(|known| fold_key(&known.nickname) == key) {
                found.push(user);
            }
        }
        Ok(found)
    }

    pub async fn get_user(&self, nickname: &str) -> Result<User> {
        self.users
            .find_user(nickname)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(nickname.to_string()))
    }

    /// Updates the non-empty fields of a profile.
    pub async fn update_user(&self, nickname: &str, update: UserUpdate) -> Result<User> {
        let update = UserUpdate {
            fullname: update.fullname.filter(|v| !v.is_empty()),
            about: update.about.filter(|v| !v.is_empty()),
            email: update.email.filter(|v| !v.is_empty()),
        };
        let existing = self.get_user(nickname).await?;

        if let Some(email) = &update.email {
            if let Some(owner) = self.users.find_user_by_email(email).await? {
                if fold_key(&owner.nickname) != fold_key(&existing.nickname) {
                    return Err(DomainError::EmailTaken(email.clone()));
                }
            }
        }

        match self.users.update_user(&existing.nickname, &update).await? {
            Some(Persisted::Stored(user)) => {
                debug!(nickname = %user.nickname, "profile updated");
                Ok(user)
            }
            Some(Persisted::Duplicate) => Err(DomainError::EmailTaken(
                update.email.unwrap_or_default(),
            )),
            None => Err(DomainError::UserNotFound(nickname.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use domains::MockUserRepository;
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    fn user(nickname: &str, email: &str) -> User {
        User {
            nickname: nickname.into(),
            fullname: "Full Name".into(),
            about: String::new(),
            email: email.into(),
        }
    }

    fn profile(email: &str) -> UserProfile {
        UserProfile {
            fullname: "Full Name".into(),
            about: String::new(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn creates_fresh_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_user().returning(|_| Ok(None));
        repo.expect_find_user_by_email().returning(|_| Ok(None));
        repo.expect_insert_user()
            .times(1)
            .returning(|u| Ok(Persisted::Stored(u.clone())));

        let service = UserService::new(Arc::new(repo));
        let created = assert_ok!(service.create_user("alice", profile("a@x.org")).await);
        assert_eq!(created.nickname, "alice");
    }

    #[tokio::test]
    async fn reports_both_conflicting_users() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_user()
            .with(eq("alice"))
            .returning(|_| Ok(Some(user("Alice", "a@x.org"))));
        repo.expect_find_user_by_email()
            .with(eq("b@x.org"))
            .returning(|_| Ok(Some(user("bob", "b@x.org"))));
        repo.expect_insert_user().never();

        let service = UserService::new(Arc::new(repo));
        let err = assert_err!(service.create_user("alice", profile("b@x.org")).await);
        match err {
            DomainError::UserConflict(users) => {
                let names: Vec<_> = users.iter().map(|u| u.nickname.as_str()).collect();
                assert_eq!(names, vec!["Alice", "bob"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn same_user_by_nickname_and_email_is_reported_once() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_user()
            .returning(|_| Ok(Some(user("alice", "a@x.org"))));
        repo.expect_find_user_by_email()
            .returning(|_| Ok(Some(user("ALICE", "a@x.org"))));

        let service = UserService::new(Arc::new(repo));
        let err = assert_err!(service.create_user("alice", profile("a@x.org")).await);
        assert!(matches!(err, DomainError::UserConflict(users) if users.len() == 1));
    }

    #[tokio::test]
    async fn lost_insert_race_returns_winner() {
        let mut repo = MockUserRepository::new();
        let mut lookups = 0;
        repo.expect_find_user().returning(move |_| {
            lookups += 1;
            // Absent on the pre-check, present once the race is lost.
            Ok((lookups > 1).then(|| user("alice", "a@x.org")))
        });
        repo.expect_find_user_by_email().returning(|_| Ok(None));
        repo.expect_insert_user()
            .returning(|_| Ok(Persisted::Duplicate));

        let service = UserService::new(Arc::new(repo));
        let err = assert_err!(service.create_user("alice", profile("a@x.org")).await);
        assert!(matches!(err, DomainError::UserConflict(users) if users[0].nickname == "alice"));
    }

    #[tokio::test]
    async fn update_rejects_email_of_other_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_user()
            .returning(|_| Ok(Some(user("alice", "a@x.org"))));
        repo.expect_find_user_by_email()
            .returning(|_| Ok(Some(user("bob", "b@x.org"))));
        repo.expect_update_user().never();

        let service = UserService::new(Arc::new(repo));
        let update = UserUpdate {
            email: Some("b@x.org".into()),
            ..Default::default()
        };
        let err = assert_err!(service.update_user("alice", update).await);
        assert!(matches!(err, DomainError::EmailTaken(email) if email == "b@x.org"));
    }

    #[tokio::test]
    async fn update_ignores_empty_fields() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_user()
            .returning(|_| Ok(Some(user("alice", "a@x.org"))));
        repo.expect_update_user()
            .withf(|nickname, update| {
                nickname == "alice" && update.fullname.is_none() && update.about.as_deref() == Some("hi")
            })
            .returning(|_, _| Ok(Some(Persisted::Stored(user("alice", "a@x.org")))));

        let service = UserService::new(Arc::new(repo));
        let update = UserUpdate {
            fullname: Some(String::new()),
            about: Some("hi".into()),
            email: None,
        };
        assert_ok!(service.update_user("alice", update).await);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_user().returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repo));
        let err = assert_err!(service.get_user("ghost").await);
        assert!(matches!(err, DomainError::UserNotFound(name) if name == "ghost"));
    }
}
