use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use tokio::sync::RwLock;

use dockbook_core::domain::session::Session;

/// Sessions keyed by sender identity. Created lazily on first contact and
/// expired lazily: a session checked out after sitting idle past the
/// timeout comes back reset to `Idle`. Keys are disjoint per sender so the
/// lock is only ever contended briefly.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn checkout(
        &self,
        sender: &str,
        now: NaiveDateTime,
        idle_timeout: Duration,
    ) -> Session {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(sender.to_string()).or_insert_with(|| Session::new(now));
        if session.is_expired(now, idle_timeout) {
            session.reset();
        }
        session.clone()
    }

    pub async fn commit(&self, sender: &str, mut session: Session, now: NaiveDateTime) {
        session.touch(now);
        let mut sessions = self.sessions.write().await;
        sessions.insert(sender.to_string(), session);
    }

    pub async fn reset(&self, sender: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(sender) {
            session.reset();
        }
    }

    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| s.stage != dockbook_core::domain::session::Stage::Idle).count()
    }
}
