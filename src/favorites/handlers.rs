use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    dto::MessageResponse,
    error::AppError,
    favorites::{
        dto::{FavoriteInput, FavoriteNotesInput},
        repo_types::{Favorite, FavoriteWithRecipe},
    },
    policy::{can_access, Operation, Resource},
    state::AppState,
    validation::{path_id, ApiJson},
};

pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route(
            "/favorites/:id",
            get(get_favorite).put(update_favorite).delete(remove_favorite),
        )
}

async fn owned_favorite(
    state: &AppState,
    caller: Uuid,
    raw_id: &str,
    operation: Operation,
) -> Result<Favorite, AppError> {
    let id = path_id(raw_id)?;
    let favorite = state
        .favorites
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Favorite not found"))?;
    can_access(
        Some(caller),
        Resource::Favorite {
            owner: favorite.user_id,
        },
        operation,
    )?;
    Ok(favorite)
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    tag = "favorites",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's favorites, newest first", body = [FavoriteWithRecipe]),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<FavoriteWithRecipe>>, AppError> {
    let favorites = state.favorites.list_by_user(user.id).await?;
    let ids: Vec<Uuid> = favorites.iter().map(|f| f.recipe_id).collect();
    let mut recipes: HashMap<Uuid, _> = state
        .recipes
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let items = favorites
        .into_iter()
        .map(|favorite| FavoriteWithRecipe {
            recipe: recipes.remove(&favorite.recipe_id),
            favorite,
        })
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/favorites/{id}",
    tag = "favorites",
    params(("id" = uuid::Uuid, Path, description = "Favorite id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Favorite with its recipe", body = FavoriteWithRecipe),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Favorite not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FavoriteWithRecipe>, AppError> {
    let favorite = owned_favorite(&state, user.id, &id, Operation::Read).await?;
    let recipe = state.recipes.find_by_id(favorite.recipe_id).await?;
    Ok(Json(FavoriteWithRecipe { favorite, recipe }))
}

#[utoipa::path(
    post,
    path = "/api/favorites",
    tag = "favorites",
    request_body = FavoriteInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Favorite added", body = Favorite),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 404, description = "Recipe not found", body = crate::error::ErrorBody),
        (status = 409, description = "Recipe already in favorites", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user, payload))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<FavoriteInput>,
) -> Result<(StatusCode, Json<Favorite>), AppError> {
    let valid = payload.validate()?;
    if state.recipes.find_by_id(valid.recipe_id).await?.is_none() {
        return Err(AppError::not_found("Recipe not found"));
    }

    let favorite = state
        .favorites
        .create(user.id, valid.recipe_id, valid.notes)
        .await?;
    info!(favorite_id = %favorite.id, user_id = %user.id, recipe_id = %favorite.recipe_id, "favorite added");
    Ok((StatusCode::CREATED, Json(favorite)))
}

#[utoipa::path(
    put,
    path = "/api/favorites/{id}",
    tag = "favorites",
    params(("id" = uuid::Uuid, Path, description = "Favorite id")),
    request_body = FavoriteNotesInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Notes updated", body = Favorite),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Favorite not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user, payload))]
pub async fn update_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<FavoriteNotesInput>,
) -> Result<Json<Favorite>, AppError> {
    let notes = payload.validate()?;
    let existing = owned_favorite(&state, user.id, &id, Operation::Update).await?;

    let favorite = state
        .favorites
        .update_notes(existing.id, notes)
        .await?
        .ok_or_else(|| AppError::not_found("Favorite not found"))?;
    info!(favorite_id = %favorite.id, user_id = %user.id, "favorite updated");
    Ok(Json(favorite))
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{id}",
    tag = "favorites",
    params(("id" = uuid::Uuid, Path, description = "Favorite id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Favorite removed", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "Favorite not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, user))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = owned_favorite(&state, user.id, &id, Operation::Delete).await?;
    if !state.favorites.delete(existing.id).await? {
        return Err(AppError::not_found("Favorite not found"));
    }
    info!(favorite_id = %existing.id, user_id = %user.id, "favorite removed");
    Ok(Json(MessageResponse::new("Favorite removed successfully")))
}
