use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::PgStore, error::StoreError, favorites::repo_types::Favorite};

/// Per-user bookmarks. `(user_id, recipe_id)` is unique and a duplicate is
/// reported as [`StoreError::Conflict`].
#[async_trait]
pub trait FavoriteRepo: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        notes: Option<String>,
    ) -> Result<Favorite, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Favorite>, StoreError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Favorite>, StoreError>;
    async fn update_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<Favorite>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const FAVORITE_COLUMNS: &str = "id, user_id, recipe_id, notes, created_at";

#[async_trait]
impl FavoriteRepo for PgStore {
    async fn create(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
        notes: Option<String>,
    ) -> Result<Favorite, StoreError> {
        let fav = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            INSERT INTO favorites (id, user_id, recipe_id, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING {FAVORITE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(recipe_id)
        .bind(notes)
        .fetch_one(self.pool())
        .await?;
        Ok(fav)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Favorite>, StoreError> {
        let fav = sqlx::query_as::<_, Favorite>(&format!(
            "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(fav)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Favorite>, StoreError> {
        let favs = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            SELECT {FAVORITE_COLUMNS}
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(favs)
    }

    async fn update_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<Favorite>, StoreError> {
        let fav = sqlx::query_as::<_, Favorite>(&format!(
            "UPDATE favorites SET notes = $2 WHERE id = $1 RETURNING {FAVORITE_COLUMNS}"
        ))
        .bind(id)
        .bind(notes)
        .fetch_optional(self.pool())
        .await?;
        Ok(fav)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
