use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    validation::{char_len, parse_id, Loose, Violations},
};

const MAX_NOTES: usize = 500;
const NOTES_RULE: &str = "Notes cannot exceed 500 characters";

/// Body of `POST /favorites`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteInput {
    #[schema(value_type = Option<String>)]
    pub recipe_id: Option<Loose<String>>,
    #[schema(value_type = Option<String>)]
    pub notes: Option<Loose<String>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ValidFavorite {
    pub recipe_id: Uuid,
    pub notes: Option<String>,
}

fn clean_notes(v: &mut Violations, notes: Option<Loose<String>>) -> Option<String> {
    let notes = v
        .typed(notes, "Notes must be text")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(n) = &notes {
        v.check(char_len(n) <= MAX_NOTES, NOTES_RULE);
    }
    notes
}

impl FavoriteInput {
    pub fn validate(self) -> Result<ValidFavorite, AppError> {
        let mut v = Violations::new();
        let recipe_id = self
            .recipe_id
            .and_then(Loose::typed)
            .and_then(|raw| parse_id(&raw));
        v.check(recipe_id.is_some(), "Invalid recipe ID");
        let notes = clean_notes(&mut v, self.notes);
        v.finish(())?;
        Ok(ValidFavorite {
            recipe_id: recipe_id.unwrap_or_default(),
            notes,
        })
    }
}

/// Body of `PUT /favorites/:id`. Only the notes can change.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FavoriteNotesInput {
    #[schema(value_type = Option<String>)]
    pub notes: Option<Loose<String>>,
}

impl FavoriteNotesInput {
    pub fn validate(self) -> Result<Option<String>, AppError> {
        let mut v = Violations::new();
        let notes = clean_notes(&mut v, self.notes);
        v.finish(notes)
    }
}
