//! Who may do what to which record.
//!
//! Callers look the record up first and answer `NotFound` themselves; the
//! policy only ever sees resources that exist.

use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Update,
    Delete,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Operation::Read => "access",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Ownership facts about an existing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// `owner` is `None` only for legacy rows created without one.
    Recipe { owner: Option<Uuid> },
    Ingredient,
    Favorite { owner: Uuid },
    /// A user profile is owned by itself.
    User { id: Uuid },
}

impl Resource {
    fn noun(self) -> &'static str {
        match self {
            Resource::Recipe { .. } => "recipe",
            Resource::Ingredient => "ingredient",
            Resource::Favorite { .. } => "favorite",
            Resource::User { .. } => "user",
        }
    }
}

pub fn can_access(
    caller: Option<Uuid>,
    resource: Resource,
    operation: Operation,
) -> Result<(), AppError> {
    let owner = match (resource, operation) {
        (Resource::Recipe { .. } | Resource::Ingredient | Resource::User { .. }, Operation::Read) => {
            return Ok(())
        }
        (Resource::Favorite { owner }, _) => Some(owner),
        // Unowned recipes skip the ownership check. Known gap, kept on purpose.
        (Resource::Recipe { owner }, _) => owner,
        (Resource::User { id }, _) => Some(id),
        (Resource::Ingredient, _) => None,
    };

    let Some(caller) = caller else {
        return Err(AppError::unauthorized("Authentication required"));
    };

    match owner {
        Some(owner) if owner != caller => Err(AppError::Forbidden(format!(
            "Not authorized to {} this {}",
            operation.verb(),
            resource.noun()
        ))),
        _ => Ok(()),
    }
}
