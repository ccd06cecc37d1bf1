pub use crate::auth::repo_types::User;
use crate::error::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

impl User {
    /// Find a user by email. Emails are stored lowercase, so callers must
    /// normalize before lookup.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with an already-hashed password. A unique-index
    /// violation on the email column surfaces as `DuplicateEmail`.
    pub async fn create(db: &PgPool, email: &str, password_hash: &str) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match e.as_database_error().and_then(|d| d.code()) {
            Some(code) if code == UNIQUE_VIOLATION => ApiError::DuplicateEmail,
            _ => ApiError::Internal(e.into()),
        })?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$AAAAAAAAAAAAAAAAAAAAAA";

    #[sqlx::test(migrations = "./migrations")]
    async fn create_then_find_round_trip(pool: PgPool) {
        let created = User::create(&pool, "a@x.com", HASH).await.expect("create");

        let by_email = User::find_by_email(&pool, "a@x.com")
            .await
            .expect("find_by_email")
            .expect("user present");
        assert_eq!(by_email.id, created.id);

        let by_id = User::find_by_id(&pool, created.id)
            .await
            .expect("find_by_id")
            .expect("user present");
        assert_eq!(by_id.email, "a@x.com");

        assert!(User::find_by_id(&pool, Uuid::new_v4())
            .await
            .expect("find_by_id")
            .is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn second_insert_of_same_email_is_duplicate(pool: PgPool) {
        User::create(&pool, "dup@x.com", HASH).await.expect("first insert");
        // Handlers lowercase before hitting the store, so a caller sending
        // "DUP@X.COM" lands on the same row
        let normalized = "DUP@X.COM".trim().to_lowercase();
        let err = User::create(&pool, &normalized, HASH).await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));
    }
}
