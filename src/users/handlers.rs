use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{extractors::AuthUser, password::hash_password},
    dto::MessageResponse,
    error::AppError,
    policy::{can_access, Operation, Resource},
    state::AppState,
    users::{
        dto::{PublicUser, UpdateUserRequest},
        repo_types::UserUpdate,
    },
    validation::{path_id, ApiJson},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Directory reads are public unless `USERS_REQUIRE_AUTH` is set.
fn directory_access(state: &AppState, caller: Result<AuthUser, AppError>) -> Result<(), AppError> {
    match caller {
        Err(e) if state.config.users_require_auth => {
            warn!("unauthenticated user directory read");
            Err(e)
        }
        _ => Ok(()),
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = [PublicUser]),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, caller))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: Result<AuthUser, AppError>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    directory_access(&state, caller)?;
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User", body = PublicUser),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, caller))]
pub async fn get_user(
    State(state): State<AppState>,
    caller: Result<AuthUser, AppError>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, AppError> {
    directory_access(&state, caller)?;
    let id = path_id(&id)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    can_access(None, Resource::User { id: user.id }, Operation::Read)?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile updated", body = PublicUser),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let id = path_id(&id)?;
    let changes = payload.validate()?;
    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    can_access(Some(caller.id), Resource::User { id: target.id }, Operation::Update)?;

    let password_hash = match changes.password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    let user = state
        .users
        .update(
            id,
            UserUpdate {
                username: changes.username,
                email: changes.email,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 403, description = "Not the owner", body = crate::error::ErrorBody),
        (status = 404, description = "User not found", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = path_id(&id)?;
    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    can_access(Some(caller.id), Resource::User { id: target.id }, Operation::Delete)?;

    if !state.users.delete(id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
