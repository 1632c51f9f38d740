//! Last-location persistence

use async_trait::async_trait;
use shared::LocationQuery;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::pipeline::LocationStore;

/// Stores each user's most recently analysed location
#[derive(Clone)]
pub struct PgLocationStore {
    db: PgPool,
}

impl PgLocationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<LocationQuery>> {
        let location = sqlx::query_scalar::<_, String>(
            "SELECT location FROM last_locations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        // A row that no longer validates is treated as absent
        Ok(location.and_then(|raw| LocationQuery::parse(&raw).ok()))
    }

    async fn save(&self, user_id: Uuid, location: &LocationQuery) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO last_locations (user_id, location, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET location = EXCLUDED.location, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(location.as_str())
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
