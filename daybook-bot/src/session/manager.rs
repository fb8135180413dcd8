//! In-memory session registry keyed by chat user id.
//!
//! Sessions are created lazily and live for the process lifetime; a restart
//! puts every user back on the idle menu for logical today.

use dashmap::DashMap;

use super::state::SessionState;
use crate::notes::DateId;

pub struct SessionManager {
    sessions: DashMap<u64, SessionState>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Run `f` against the user's session, creating it for `today` if needed.
    /// All session mutation goes through here.
    pub fn update<R, F: FnOnce(&mut SessionState) -> R>(&self, user_id: u64, today: DateId, f: F) -> R {
        let mut entry = self.sessions.entry(user_id).or_insert_with(|| {
            log::info!("[SESSION] New session for user {} (active date {})", user_id, today);
            SessionState::new(user_id, today)
        });
        f(entry.value_mut())
    }

    /// Clone of the user's session, creating it for `today` if needed
    pub fn get(&self, user_id: u64, today: DateId) -> SessionState {
        self.update(user_id, today, |s| s.clone())
    }

    /// Clone of an existing session, without creating one
    pub fn peek(&self, user_id: u64) -> Option<SessionState> {
        self.sessions.get(&user_id).map(|e| e.clone())
    }

    pub fn reset(&self, user_id: u64) {
        if let Some(mut entry) = self.sessions.get_mut(&user_id) {
            entry.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
