use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";

/// Identity asserted by an external provider after a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    /// Provider subject id.
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// An OAuth authorization-code provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to, carrying `state`.
    fn authorize_url(&self, state: &str) -> anyhow::Result<Url>;
    /// Trades the callback `code` for the caller's profile.
    async fn exchange(&self, code: &str) -> anyhow::Result<ExternalProfile>;
}

pub struct GoogleProvider {
    cfg: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(cfg: GoogleConfig) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

impl UserInfo {
    /// An unverified address is dropped, so it can never link or create an account.
    fn into_profile(self) -> ExternalProfile {
        ExternalProfile {
            subject: self.sub,
            email: self.email.filter(|_| self.email_verified),
            display_name: self.name,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> anyhow::Result<Url> {
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.cfg.client_id.as_str()),
                ("redirect_uri", self.cfg.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", GOOGLE_SCOPES),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    async fn exchange(&self, code: &str) -> anyhow::Result<ExternalProfile> {
        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.cfg.client_id.as_str()),
                ("client_secret", self.cfg.client_secret.as_str()),
                ("redirect_uri", self.cfg.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("google token request")?
            .error_for_status()
            .context("google token exchange")?
            .json()
            .await
            .context("decode google token response")?;

        let info: UserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("google userinfo request")?
            .error_for_status()
            .context("google userinfo")?
            .json()
            .await
            .context("decode google userinfo")?;

        debug!(
            subject = %info.sub,
            email_verified = info.email_verified,
            "google profile fetched"
        );
        Ok(info.into_profile())
    }
}
