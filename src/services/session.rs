// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in user sessions and their delegated credentials.
//!
//! Sessions live in memory only: a restart signs everyone out, and an
//! entry is dropped once its lifetime (the session cookie's) has passed.
//! Each credential moves between two states, valid (`now < expires_at`)
//! and expired. Every read of an expired credential triggers one
//! refresh-token grant; a failed grant marks the credential with
//! `RefreshAccessTokenError` instead of returning an error, and callers
//! must check the marker before using the token. The marker stays until
//! a later grant succeeds.

use crate::error::AppError;
use crate::models::Credential;
use crate::services::IdentityClient;
use crate::time_utils::now_millis;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Session lifetime (8 hours), shared with the session cookie.
pub const SESSION_TTL_SECS: i64 = 8 * 60 * 60;

/// Signed-in user with their delegated credential.
#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    pub name: String,
    pub credential: Credential,
}

/// Store entry: the session plus bookkeeping.
#[derive(Debug, Clone)]
pub struct StoredSession {
    session: Session,
    /// Epoch ms after which the session is gone
    expires_at: i64,
    /// Bumped on every refresh attempt, so waiters can tell one happened
    refresh_attempts: u64,
}

/// Shared session map type.
pub type SessionStore = Arc<DashMap<String, StoredSession>>;

/// Shared refresh locks type.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Session registry that keeps delegated credentials fresh.
#[derive(Clone)]
pub struct SessionManager {
    identity: IdentityClient,
    sessions: SessionStore,
    /// Per-session mutex to serialize token refresh operations.
    refresh_locks: RefreshLocks,
    ttl_ms: i64,
}

impl SessionManager {
    pub fn new(identity: IdentityClient) -> Self {
        Self::with_ttl(identity, SESSION_TTL_SECS * 1000)
    }

    pub fn with_ttl(identity: IdentityClient, ttl_ms: i64) -> Self {
        Self {
            identity,
            sessions: Arc::new(DashMap::new()),
            refresh_locks: Arc::new(DashMap::new()),
            ttl_ms,
        }
    }

    /// Register a new session and return its random ID.
    ///
    /// Expired sessions are swept out first.
    pub fn create(&self, session: Session) -> Result<String, AppError> {
        let rng = SystemRandom::new();
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

        let now = now_millis();
        self.sweep_expired(now);

        let session_id = hex::encode(bytes);
        tracing::info!(email = %session.email, "Session created");
        self.sessions.insert(
            session_id.clone(),
            StoredSession {
                session,
                expires_at: now + self.ttl_ms,
                refresh_attempts: 0,
            },
        );
        Ok(session_id)
    }

    /// Remove a session (sign-out).
    pub fn remove(&self, session_id: &str) {
        if let Some((_, stored)) = self.sessions.remove(session_id) {
            tracing::info!(email = %stored.session.email, "Session removed");
        }
        self.refresh_locks.remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn sweep_expired(&self, now_ms: i64) {
        let before = self.sessions.len();
        self.sessions.retain(|_, stored| stored.expires_at > now_ms);

        let sessions = &self.sessions;
        self.refresh_locks.retain(|id, _| sessions.contains_key(id));

        let swept = before.saturating_sub(self.sessions.len());
        if swept > 0 {
            tracing::info!(swept, "Expired sessions removed");
        }
    }

    /// Live entry for `session_id`; an expired one is removed instead.
    fn live(&self, session_id: &str, now_ms: i64) -> Option<(Session, u64)> {
        let (session, attempts, expires_at) = self
            .sessions
            .get(session_id)
            .map(|e| (e.session.clone(), e.refresh_attempts, e.expires_at))?;

        if expires_at <= now_ms {
            tracing::info!(email = %session.email, "Session expired");
            self.remove(session_id);
            return None;
        }
        Some((session, attempts))
    }

    /// Look up a session, refreshing its credential first if it has expired.
    ///
    /// Returns `None` for unknown or expired sessions. The returned
    /// credential may carry the refresh error marker.
    pub async fn current(&self, session_id: &str) -> Option<Session> {
        let (session, attempts) = self.live(session_id, now_millis())?;
        if !session.credential.is_expired_at(now_millis()) {
            return Some(session);
        }

        let lock = self
            .refresh_locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another request may have refreshed (or tried) while we were waiting.
        let (mut session, attempts_now) = self.live(session_id, now_millis())?;
        if attempts_now != attempts || !session.credential.is_expired_at(now_millis()) {
            return Some(session);
        }

        session.credential = refresh_if_expired(&self.identity, session.credential).await;

        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.session.credential = session.credential.clone();
            entry.refresh_attempts += 1;
        }

        Some(session)
    }
}

/// Apply the expiry state machine to one credential.
///
/// Valid credentials are returned unchanged without any network call.
/// Expired ones get exactly one refresh-token grant, even if an earlier
/// grant failed; on failure the credential comes back with the error
/// marker set and its old token fields.
pub async fn refresh_if_expired(identity: &IdentityClient, credential: Credential) -> Credential {
    if !credential.is_expired_at(now_millis()) {
        return credential;
    }

    let Some(refresh_token) = credential.refresh_token.clone() else {
        tracing::warn!("Access token expired and no refresh token is available");
        return credential.with_refresh_error();
    };

    tracing::info!(
        retry = credential.has_refresh_error(),
        "Access token expired, refreshing"
    );

    match identity.refresh_token(&refresh_token).await {
        Ok(response) => {
            tracing::info!("Access token refreshed");
            response.into_credential(now_millis(), Some(refresh_token))
        }
        Err(e) => {
            tracing::error!(error = %e, "Error refreshing access token");
            credential.with_refresh_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn manager(ttl_ms: i64) -> SessionManager {
        let identity = IdentityClient::new(reqwest::Client::new(), &Config::test_default());
        SessionManager::with_ttl(identity, ttl_ms)
    }

    fn session(email: &str) -> Session {
        Session {
            email: email.to_string(),
            name: "Test".to_string(),
            credential: Credential::new(
                "at".to_string(),
                Some("rt".to_string()),
                now_millis() + 3_600_000,
            ),
        }
    }

    #[tokio::test]
    async fn test_live_session_is_returned() {
        let sessions = manager(60_000);
        let id = sessions.create(session("ada@example.com")).unwrap();

        let found = sessions.current(&id).await.expect("live session");
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_removed() {
        let sessions = manager(0);
        let id = sessions.create(session("ada@example.com")).unwrap();

        assert!(sessions.current(&id).await.is_none());
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_create_sweeps_expired_sessions() {
        let sessions = manager(0);
        let old = sessions.create(session("old@example.com")).unwrap();
        sessions.refresh_locks.insert(old.clone(), Arc::new(Mutex::new(())));

        sessions.create(session("new@example.com")).unwrap();

        assert_eq!(sessions.len(), 1);
        assert!(!sessions.sessions.contains_key(&old));
        assert!(sessions.refresh_locks.is_empty());
    }

    #[test]
    fn test_remove_drops_session() {
        let sessions = manager(60_000);
        let id = sessions.create(session("ada@example.com")).unwrap();

        sessions.remove(&id);
        assert!(sessions.is_empty());
    }
}
