//! Handle database requests.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::user::{NewUser, User};

/// Persistence of users and their access tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A taken email is a validation error on `email`.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Find a user by its normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Save `name` and `password` of an existing user.
    async fn update(&self, user: &User) -> Result<()>;

    /// Link a token to a user.
    async fn insert_token(&self, token: &str, user_id: i64) -> Result<()>;

    /// Find the user owning `token`.
    async fn find_by_token(&self, token: &str) -> Result<Option<User>>;
}

/// Error returned when an email is already registered.
pub fn email_taken() -> ServerError {
    ServerError::field(
        "email",
        "unique",
        "User with this email already exists.",
    )
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool<Postgres>,
}

impl PgUserStore {
    /// Create a new [`PgUserStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, name, password, is_active, is_staff, is_superuser, created_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let query = format!(
            r#"INSERT INTO users (email, name, password, is_staff, is_superuser)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {USER_COLUMNS}"#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                let unique = err
                    .as_database_error()
                    .is_some_and(|e| e.is_unique_violation());
                if unique { email_taken() } else { err.into() }
            })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(r#"UPDATE users SET name = $1, password = $2 WHERE id = $3"#)
            .bind(&user.name)
            .bind(&user.password)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_token(&self, token: &str, user_id: i64) -> Result<()> {
        sqlx::query(r#"INSERT INTO tokens (token, user_id) VALUES ($1, $2)"#)
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            r#"SELECT u.id, u.email, u.name, u.password, u.is_active,
                    u.is_staff, u.is_superuser, u.created_at
                FROM tokens t
                INNER JOIN users u ON u.id = t.user_id
                WHERE t.token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "Waqas".into(),
            password: "$argon2id$fake".into(),
            is_staff: false,
            is_superuser: false,
        }
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
    async fn test_insert_and_find(pool: Pool<Postgres>) {
        let store = PgUserStore::new(pool);

        let user = store.insert(new_user("whafeez21@gmail.com")).await.unwrap();
        assert!(user.is_active);
        assert!(!user.is_staff);

        let found = store.find_by_email("whafeez21@gmail.com").await.unwrap();
        assert_eq!(found, Some(user.clone()));
        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
    async fn test_duplicate_email(pool: Pool<Postgres>) {
        let store = PgUserStore::new(pool);

        store.insert(new_user("dup@example.com")).await.unwrap();
        let err = store.insert(new_user("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
    async fn test_tokens(pool: Pool<Postgres>) {
        let store = PgUserStore::new(pool);

        let user = store.insert(new_user("token@example.com")).await.unwrap();
        store.insert_token("abc", user.id).await.unwrap();

        assert_eq!(store.find_by_token("abc").await.unwrap(), Some(user));
        assert_eq!(store.find_by_token("xyz").await.unwrap(), None);
    }
}
