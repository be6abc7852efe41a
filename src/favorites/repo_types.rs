use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::recipes::repo_types::Recipe;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A favorite together with the recipe it points at, if that still exists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FavoriteWithRecipe {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub recipe: Option<Recipe>,
}
