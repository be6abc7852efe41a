use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::{
    auth::{jwt::TokenService, oauth::ExternalProfile, session::random_token},
    error::AppError,
    state::AppState,
    users::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
};

/// A presented credential, tagged by the strategy that produced it.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Raw token from `Authorization: Bearer <token>`.
    Bearer(String),
    /// Profile returned by an OAuth provider at the end of a handshake.
    External(ExternalProfile),
}

/// Resolves a [`Credential`] to a local user.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserRepo>,
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.tokens.clone(), state.users.clone())
    }
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserRepo>) -> Self {
        Self { tokens, users }
    }

    pub async fn resolve(&self, credential: Credential) -> Result<User, AppError> {
        match credential {
            Credential::Bearer(token) => self.resolve_bearer(&token).await,
            Credential::External(profile) => self.resolve_external(profile).await,
        }
    }

    async fn resolve_bearer(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            AppError::from(e)
        })?;
        self.users.find_by_id(claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            AppError::unauthorized("User not found")
        })
    }

    /// Subject match first, then email match (linking), then create.
    async fn resolve_external(&self, profile: ExternalProfile) -> Result<User, AppError> {
        if let Some(user) = self.users.find_by_external_id(&profile.subject).await? {
            return Ok(user);
        }

        let email = profile
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::unauthorized("External profile has no email"))?;

        if let Some(user) = self.users.find_by_email(&email).await? {
            if user.google_id.as_deref() == Some(profile.subject.as_str()) {
                return Ok(user);
            }
            let linked = self
                .users
                .link_external_identity(user.id, &profile.subject)
                .await?
                .ok_or_else(|| AppError::not_found("User not found"))?;
            info!(user_id = %linked.id, "external identity linked");
            return Ok(linked);
        }

        let username = derive_username(profile.display_name.as_deref(), &email);
        let user = self
            .users
            .create(NewUser {
                username,
                email,
                password_hash: None,
                google_id: Some(profile.subject),
            })
            .await?;
        info!(user_id = %user.id, "user created from external identity");
        Ok(user)
    }
}

/// Username for an OAuth-created account: the sanitised display name (or
/// email local part) plus a random suffix, within the 3..=30 length rule.
fn derive_username(display_name: Option<&str>, email: &str) -> String {
    let source = display_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default());
    let mut base: String = source
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .take(20)
        .collect();
    if base.chars().count() < 3 {
        base = "user".into();
    }
    format!("{}_{}", base, random_token(6).to_lowercase())
}
