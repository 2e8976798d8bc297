//! Avatar repository.

use sqlx::PgPool;
use uuid::Uuid;

use rescore_models::Avatar;

use crate::error::DbResult;

const COLUMNS: &str = "id, storage_key, content_type, created_at";

#[derive(Clone)]
pub struct AvatarRepository {
    pool: PgPool,
}

impl AvatarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        id: Uuid,
        storage_key: &str,
        content_type: &str,
    ) -> DbResult<Avatar> {
        let avatar = sqlx::query_as::<_, Avatar>(&format!(
            "INSERT INTO avatars (id, storage_key, content_type)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(storage_key)
        .bind(content_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(avatar)
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Option<Avatar>> {
        let avatar =
            sqlx::query_as::<_, Avatar>(&format!("SELECT {COLUMNS} FROM avatars WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(avatar)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Avatar>> {
        let avatars = sqlx::query_as::<_, Avatar>(&format!(
            "SELECT {COLUMNS} FROM avatars ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(avatars)
    }

    pub async fn delete_row(&self, id: Uuid) -> DbResult<Option<Avatar>> {
        let avatar = sqlx::query_as::<_, Avatar>(&format!(
            "DELETE FROM avatars WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(avatar)
    }
}
