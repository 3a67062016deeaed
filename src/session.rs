//! # Session Store Module
//!
//! Per-user transient state: the backend credential and at most one
//! in-progress dialog. Nothing here survives a process restart.

use std::collections::HashMap;
use std::sync::Mutex;

use teloxide::types::UserId;

use crate::dialogue::PendingDialog;

/// Everything the bot remembers about one user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Opaque bearer token issued by the backend
    pub credential: Option<String>,
    /// Dialog in progress, with the fields collected so far
    pub pending: Option<PendingDialog>,
}

/// Storage of sessions keyed by Telegram user id
///
/// Each update for a user reads the session, changes it and writes it
/// back. Two concurrent updates for the same user race and the last
/// write wins.
pub trait SessionStore: Send + Sync {
    /// Session for `user`, or an empty one if none was stored
    fn get(&self, user: UserId) -> Session;

    fn set(&self, user: UserId, session: Session);

    /// Forget everything about `user`
    fn clear(&self, user: UserId);

    fn credential(&self, user: UserId) -> Option<String> {
        self.get(user).credential
    }

    fn store_credential(&self, user: UserId, credential: String) {
        let mut session = self.get(user);
        session.credential = Some(credential);
        self.set(user, session);
    }

    /// Drop the credential, returning it if there was one
    fn forget_credential(&self, user: UserId) -> Option<String> {
        let mut session = self.get(user);
        let credential = session.credential.take();
        self.set(user, session);
        credential
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, Session>> {
        // A panic while holding the lock cannot leave a session half-written.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user: UserId) -> Session {
        self.lock().get(&user).cloned().unwrap_or_default()
    }

    fn set(&self, user: UserId, session: Session) {
        let mut sessions = self.lock();
        if session == Session::default() {
            sessions.remove(&user);
        } else {
            sessions.insert(user, session);
        }
    }

    fn clear(&self, user: UserId) {
        self.lock().remove(&user);
    }
}
