use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Persisted user/profile record. Created only via registration; there are
/// no update or delete paths.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub dog_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub birthdate: Date,
    pub description: String,
    pub image_path: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub struct NewUser<'a> {
    pub dog_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub birthdate: Date,
    pub description: &'a str,
    pub image_path: &'a str,
}

impl User {
    /// Exact-match lookup by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, dog_name, email, password_hash, birthdate, description,
                   image_path, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Insert a new record. A unique-violation error here means the
    /// check-then-insert race was lost; callers map it to a conflict.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (dog_name, email, password_hash, birthdate, description, image_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, dog_name, email, password_hash, birthdate, description,
                      image_path, created_at, updated_at
            "#,
        )
        .bind(new.dog_name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.birthdate)
        .bind(new.description)
        .bind(new.image_path)
        .fetch_one(db)
        .await
    }
}
