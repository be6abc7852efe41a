use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Exact, case-sensitive match on the stored spelling.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IngredientEntry {
    Plain(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantity: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

impl IngredientEntry {
    pub fn name(&self) -> &str {
        match self {
            IngredientEntry::Plain(text) => text,
            IngredientEntry::Detailed { name, .. } => name,
        }
    }
}

/// Raw `recipes` row.
#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Json<Vec<IngredientEntry>>,
    pub instructions: Vec<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    /// From the joined `users` row; `None` once the owner is deleted.
    pub owner_username: Option<String>,
}

/// Who posted a recipe, shown with every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecipeOwner {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<IngredientEntry>,
    pub instructions: Vec<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    /// Owner; set once at creation.
    pub user_id: Option<Uuid>,
    /// `null` for unowned recipes and for owners that no longer exist.
    pub owner: Option<RecipeOwner>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            ingredients: r.ingredients.0,
            instructions: r.instructions,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            cooking_time: r.cooking_time,
            servings: r.servings,
            difficulty: Difficulty::parse(&r.difficulty).unwrap_or_default(),
            tags: r.tags,
            image_url: r.image_url,
            user_id: r.user_id,
            owner: r
                .user_id
                .zip(r.owner_username)
                .map(|(id, username)| RecipeOwner { id, username }),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Validated recipe content, everything except identity and ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<IngredientEntry>,
    pub instructions: Vec<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub cooking_time: i32,
    pub servings: i32,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredient_entries_accept_both_shapes() {
        let entries: Vec<IngredientEntry> = serde_json::from_str(
            r#"["Water", {"name": "Salt", "quantity": "1", "unit": "tsp"}, {"name": "Pepper"}]"#,
        )
        .unwrap();
        assert_eq!(entries[0], IngredientEntry::Plain("Water".into()));
        assert_eq!(entries[1].name(), "Salt");
        assert_eq!(
            entries[2],
            IngredientEntry::Detailed {
                name: "Pepper".into(),
                quantity: None,
                unit: None
            }
        );
        let back = serde_json::to_string(&entries[2]).unwrap();
        assert_eq!(back, r#"{"name":"Pepper"}"#);
    }

    fn row(user_id: Option<Uuid>, owner_username: Option<&str>) -> RecipeRow {
        let now = OffsetDateTime::now_utc();
        RecipeRow {
            id: Uuid::new_v4(),
            title: "Soup".into(),
            description: String::new(),
            ingredients: Json(vec![IngredientEntry::Plain("Water".into())]),
            instructions: vec!["Boil".into()],
            prep_time: None,
            cook_time: None,
            cooking_time: 10,
            servings: 4,
            difficulty: "Hard".into(),
            tags: vec![],
            image_url: None,
            user_id,
            created_at: now,
            updated_at: now,
            owner_username: owner_username.map(str::to_string),
        }
    }

    #[test]
    fn owner_summary_needs_a_live_user() {
        let id = Uuid::new_v4();
        let recipe = Recipe::from(row(Some(id), Some("alice")));
        assert_eq!(
            recipe.owner,
            Some(RecipeOwner {
                id,
                username: "alice".into()
            })
        );
        assert_eq!(recipe.difficulty, Difficulty::Hard);
        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["owner"]["username"], "alice");

        let orphan = Recipe::from(row(Some(id), None));
        assert_eq!(orphan.user_id, Some(id));
        assert!(orphan.owner.is_none());
        assert!(serde_json::to_value(&orphan).unwrap()["owner"].is_null());
    }

    #[test]
    fn difficulty_parsing_is_exact() {
        assert_eq!(Difficulty::parse("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("hard"), None);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }
}
