use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use reqwest::Url;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, OAuthCallbackQuery, RegisterRequest},
        extractors::AuthUser,
        gate::{AuthGate, Credential},
        password::{hash_password, verify_password},
        session::OAuthSession,
    },
    error::AppError,
    state::AppState,
    users::{dto::PublicUser, repo_types::NewUser},
    validation::{ApiJson, ApiQuery},
};

const OAUTH_COOKIE: &str = "mealmatch_oauth";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

pub fn google_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let valid = payload.validate()?;
    let password_hash = hash_password(&valid.password)?;

    let user = state
        .users
        .create(NewUser {
            username: valid.username,
            email: valid.email,
            password_hash: Some(password_hash),
            google_id: None,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "registration rejected by store");
            AppError::from(e)
        })?;

    let token = state.tokens.issue(user.id, state.tokens.default_ttl())?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".into(),
            token,
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (email, password) = payload.validate()?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::unauthorized("Invalid credentials"));
    };
    if !verify_password(user.password_hash.as_deref(), &password)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let token = state.tokens.issue(user.id, state.tokens.default_ttl())?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = PublicUser),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(user))]
pub async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

/// 302 with a `Location` header.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/google",
    tag = "auth",
    responses(
        (status = 302, description = "Redirect to Google"),
        (status = 404, description = "Google sign-in is not configured", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, jar))]
pub async fn google_start(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Response), AppError> {
    let provider = state
        .identity_provider
        .clone()
        .ok_or_else(|| AppError::not_found("Google sign-in is not configured"))?;

    let ttl = Duration::from_secs(state.config.oauth_session_ttl_seconds);
    let session = OAuthSession::new(ttl);
    let url = provider.authorize_url(&session.state)?;
    let session_id = state.sessions.save(session).await;

    let cookie = Cookie::build((OAUTH_COOKIE, session_id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.production)
        .path("/")
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build();
    Ok((jar.add(cookie), found(url.as_str())))
}

enum CallbackFailure {
    /// Ends the handshake with a redirect to the login page.
    Handshake(String),
    Fatal(AppError),
}

impl From<AppError> for CallbackFailure {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Unauthorized(reason) => CallbackFailure::Handshake(reason),
            other => CallbackFailure::Fatal(other),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    tag = "auth",
    params(OAuthCallbackQuery),
    responses(
        (status = 302, description = "Redirect to the frontend with a token or an error"),
        (status = 500, description = "Store failure", body = crate::error::ErrorBody)
    )
)]
#[instrument(skip(state, jar, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ApiQuery(query): ApiQuery<OAuthCallbackQuery>,
) -> Result<(SignedCookieJar, Response), AppError> {
    let session_id = jar.get(OAUTH_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build(OAUTH_COOKIE).path("/"));
    let frontend = &state.config.frontend_url;

    match complete_google_login(&state, session_id, query).await {
        Ok(token) => {
            let target = Url::parse_with_params(
                &format!("{frontend}/oauth-callback"),
                &[("token", token.as_str())],
            )
            .map_err(|e| AppError::Internal(e.into()))?;
            Ok((jar, found(target.as_str())))
        }
        Err(CallbackFailure::Handshake(reason)) => {
            warn!(%reason, "google sign-in failed");
            Ok((jar, found(&format!("{frontend}/login?error=oauth_failed"))))
        }
        Err(CallbackFailure::Fatal(e)) => {
            error!(error = %e, "google sign-in aborted");
            Err(e)
        }
    }
}

async fn complete_google_login(
    state: &AppState,
    session_id: Option<String>,
    query: OAuthCallbackQuery,
) -> Result<String, CallbackFailure> {
    let handshake = |reason: &str| CallbackFailure::Handshake(reason.to_string());

    let session_id = session_id.ok_or_else(|| handshake("missing session cookie"))?;
    let session = state.sessions.load(&session_id).await;
    state.sessions.remove(&session_id).await;
    let session = session.ok_or_else(|| handshake("unknown or expired session"))?;

    if let Some(err) = query.error {
        return Err(CallbackFailure::Handshake(format!("provider returned {err}")));
    }
    if query.state.as_deref() != Some(session.state.as_str()) {
        return Err(handshake("state mismatch"));
    }
    let code = query.code.ok_or_else(|| handshake("missing code"))?;

    let provider = state
        .identity_provider
        .clone()
        .ok_or_else(|| handshake("provider not configured"))?;
    let profile = provider
        .exchange(&code)
        .await
        .map_err(|e| CallbackFailure::Handshake(format!("code exchange failed: {e:#}")))?;

    let gate = AuthGate::new(state.tokens.clone(), state.users.clone());
    let user = gate.resolve(Credential::External(profile)).await?;
    let token = state
        .tokens
        .issue(user.id, state.tokens.default_ttl())
        .map_err(|e| CallbackFailure::Fatal(e.into()))?;

    info!(user_id = %user.id, "google sign-in completed");
    Ok(token)
}
