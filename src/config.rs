use anyhow::Context;
use serde::Deserialize;

/// One year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;
/// One day.
pub const MAX_OAUTH_SESSION_TTL_SECONDS: u64 = 60 * 60 * 24;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Google OAuth client settings. Present only when all three are configured.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Absolute callback URL registered with Google, e.g.
    /// `http://localhost:3000/api/auth/google/callback`.
    pub callback_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub session_secret: String,
    pub oauth_session_ttl_seconds: u64,
    pub google: Option<GoogleConfig>,
    pub frontend_url: String,
    pub users_require_auth: bool,
    pub production: bool,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;

        let jwt = JwtConfig {
            secret: secret.clone(),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mealmatch".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "mealmatch-users".into()),
            ttl_minutes: parsed_var("JWT_TTL_MINUTES").unwrap_or(60 * 24),
        };

        let session_secret = std::env::var("SESSION_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(secret);

        let google = match (
            non_empty_var("GOOGLE_CLIENT_ID"),
            non_empty_var("GOOGLE_CLIENT_SECRET"),
            non_empty_var("GOOGLE_CALLBACK_URL"),
        ) {
            (Some(client_id), Some(client_secret), Some(callback_url)) => Some(GoogleConfig {
                client_id,
                client_secret,
                callback_url,
            }),
            _ => None,
        };

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let config = Self {
            database_url,
            jwt,
            session_secret,
            oauth_session_ttl_seconds: parsed_var("OAUTH_SESSION_TTL_SECONDS").unwrap_or(600),
            google,
            frontend_url,
            users_require_auth: parsed_var("USERS_REQUIRE_AUTH").unwrap_or(true),
            production: std::env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed_var("APP_PORT").unwrap_or(3000),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make token or session expiry overflow.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.jwt.secret.trim().is_empty(),
            "JWT_SECRET must not be empty"
        );
        anyhow::ensure!(
            (1..=MAX_JWT_TTL_MINUTES).contains(&self.jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}"
        );
        anyhow::ensure!(
            (1..=MAX_OAUTH_SESSION_TTL_SECONDS).contains(&self.oauth_session_ttl_seconds),
            "OAUTH_SESSION_TTL_SECONDS must be between 1 and {MAX_OAUTH_SESSION_TTL_SECONDS}"
        );
        Ok(())
    }
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
