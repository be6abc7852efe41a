use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, Rng};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

/// Server-side half of an OAuth redirect handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSession {
    /// Random value echoed back by the provider in the callback.
    pub state: String,
    pub expires_at: OffsetDateTime,
}

impl OAuthSession {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: random_token(32),
            expires_at: OffsetDateTime::now_utc() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }
}

/// Correlates the redirect-out and callback-in requests of an OAuth login.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores the session and returns its id.
    async fn save(&self, session: OAuthSession) -> String;
    /// Returns the session if it exists and has not expired.
    async fn load(&self, id: &str) -> Option<OAuthSession>;
    async fn remove(&self, id: &str);
}

/// Process-local session store; expired entries are purged on every write.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, OAuthSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: OAuthSession) -> String {
        let id = random_token(48);
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        if sessions.len() < before {
            debug!(purged = before - sessions.len(), "expired oauth sessions purged");
        }
        sessions.insert(id.clone(), session);
        id
    }

    async fn load(&self, id: &str) -> Option<OAuthSession> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(id) {
            Some(s) if s.is_expired() => {
                sessions.remove(id);
                None
            }
            Some(s) => Some(s.clone()),
            None => None,
        }
    }

    async fn remove(&self, id: &str) {
        self.sessions.lock().await.remove(id);
    }
}

pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
