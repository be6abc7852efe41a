use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod jwt;
pub mod oauth;
pub mod password;
pub mod session;

/// Google routes are only mounted when a provider is configured.
pub fn router(with_google: bool) -> Router<AppState> {
    let router = handlers::auth_routes();
    if with_google {
        router.merge(handlers::google_routes())
    } else {
        router
    }
}
