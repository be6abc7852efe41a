use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Protein,
    Vegetable,
    Fruit,
    Grain,
    Dairy,
    Spice,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Protein,
        Category::Vegetable,
        Category::Fruit,
        Category::Grain,
        Category::Dairy,
        Category::Spice,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Protein => "Protein",
            Category::Vegetable => "Vegetable",
            Category::Fruit => "Fruit",
            Category::Grain => "Grain",
            Category::Dairy => "Dairy",
            Category::Spice => "Spice",
            Category::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Raw `ingredients` row.
#[derive(Debug, FromRow)]
pub struct IngredientRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub common_uses: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NutritionalInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub nutritional_info: NutritionalInfo,
    pub common_uses: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<IngredientRow> for Ingredient {
    fn from(r: IngredientRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            // The column CHECK keeps this in range.
            category: Category::parse(&r.category).unwrap_or(Category::Other),
            nutritional_info: NutritionalInfo {
                calories: r.calories,
                protein: r.protein,
                carbs: r.carbs,
                fat: r.fat,
            },
            common_uses: r.common_uses,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Validated catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientDraft {
    pub name: String,
    pub category: Category,
    pub nutritional_info: NutritionalInfo,
    pub common_uses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientFilter {
    pub category: Option<Category>,
    /// Case-insensitive name substring.
    pub search: Option<String>,
}

impl IngredientFilter {
    pub fn matches(&self, ingredient: &Ingredient) -> bool {
        if self.category.is_some_and(|c| c != ingredient.category) {
            return false;
        }
        match &self.search {
            Some(s) => ingredient.name.to_lowercase().contains(&s.to_lowercase()),
            None => true,
        }
    }
}
