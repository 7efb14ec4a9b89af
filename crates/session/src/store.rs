use crate::state::{SessionConfig, SessionState};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Key-value session store abstraction.
///
/// Mutations for one user id are applied atomically relative to each other;
/// different user ids never block one another. The in-process map below is
/// the single-instance backing; a multi-instance deployment can supply an
/// external store behind the same contract.
pub trait SessionStore: Send + Sync {
    /// Get-or-create, then apply `mutation` under the per-key lock.
    fn with_session<R>(&self, user_id: &str, mutation: impl FnOnce(&mut SessionState) -> R) -> R;

    /// Evict sessions idle longer than the configured TTL. Returns the
    /// number evicted.
    fn sweep(&self, now: Instant) -> usize;
}

impl<T: SessionStore> SessionStore for Arc<T> {
    fn with_session<R>(&self, user_id: &str, mutation: impl FnOnce(&mut SessionState) -> R) -> R {
        (**self).with_session(user_id, mutation)
    }

    fn sweep(&self, now: Instant) -> usize {
        (**self).sweep(now)
    }
}

/// In-process session store: a map of per-user `Arc<Mutex<SessionState>>`.
///
/// The outer `RwLock` only guards map membership; per-session work happens
/// under the inner mutex, so two users never contend. The sweep takes the
/// same inner locks, which keeps it from racing an in-flight update.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
    config: SessionConfig,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn entry(&self, user_id: &str) -> Arc<Mutex<SessionState>> {
        if let Some(existing) = self.sessions.read().get(user_id) {
            return Arc::clone(existing);
        }
        let mut sessions = self.sessions.write();
        // Re-check: another task may have created it between the locks.
        Arc::clone(
            sessions
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(SessionState::new(Instant::now())))),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn with_session<R>(&self, user_id: &str, mutation: impl FnOnce(&mut SessionState) -> R) -> R {
        let entry = self.entry(user_id);
        let mut state = entry.lock();
        mutation(&mut state)
    }

    fn sweep(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|user_id, entry| {
            let state = entry.lock();
            let keep = state.idle_since(now) < self.config.idle_ttl;
            if !keep {
                log::debug!("Evicting idle session for user {user_id}");
            }
            keep
        });
        before - sessions.len()
    }
}
