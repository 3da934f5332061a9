//! Session store - progress and results keyed by session id
//!
//! The store is owned by whoever runs fact checks and injected where it is
//! needed; there is no global instance. It is:
//! - bounded: beyond `max_sessions`, the least recently touched session is evicted
//! - TTL-evicting: sessions idle longer than the TTL are swept, and reads
//!   treat them as absent even before a sweep runs

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::{ConsolidatedResult, ProgressSink, ProgressUpdate};

/// Updates retained per session; older ones are dropped first
pub const MAX_UPDATES_PER_SESSION: usize = 256;

/// Everything recorded for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
    pub updates: Vec<ProgressUpdate>,
    pub result: Option<ConsolidatedResult>,
}

impl SessionRecord {
    fn new(session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.to_string(),
            created_at: now,
            touched_at: now,
            updates: Vec::new(),
            result: None,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.touched_at > ttl
    }
}

/// Bounded, TTL-evicting session store
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    max_sessions: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            ttl,
        }
    }

    /// Record a progress update at the current time
    pub fn record_update(&self, update: ProgressUpdate) {
        self.record_update_at(update, Utc::now());
    }

    /// Record a progress update as of `now`. Updates without a session are ignored.
    pub fn record_update_at(&self, update: ProgressUpdate, now: DateTime<Utc>) {
        let Some(session_id) = update.session_id.clone() else {
            return;
        };
        self.with_session(&session_id, now, |record| {
            if record.updates.len() >= MAX_UPDATES_PER_SESSION {
                record.updates.remove(0);
            }
            record.updates.push(update);
        });
    }

    pub fn record_result(&self, session_id: &str, result: ConsolidatedResult) {
        self.record_result_at(session_id, result, Utc::now());
    }

    pub fn record_result_at(&self, session_id: &str, result: ConsolidatedResult, now: DateTime<Utc>) {
        self.with_session(session_id, now, |record| record.result = Some(result));
    }

    /// Snapshot of a session, if present and not expired
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.get_at(session_id, Utc::now())
    }

    pub fn get_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<SessionRecord> {
        self.sessions
            .lock()
            .get(session_id)
            .filter(|r| !r.is_expired(now, self.ttl))
            .cloned()
    }

    /// Remove a session outright
    pub fn remove(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.lock().remove(session_id)
    }

    /// Drop expired sessions, returning how many were removed
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, r| !r.is_expired(now, self.ttl));
        let removed = before - sessions.len();
        if removed > 0 {
            debug!("Swept {} expired sessions", removed);
        }
        removed
    }

    /// Number of stored sessions, expired ones included until swept
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn with_session<F>(&self, session_id: &str, now: DateTime<Utc>, apply: F)
    where
        F: FnOnce(&mut SessionRecord),
    {
        let mut sessions = self.sessions.lock();

        let stale = sessions
            .get(session_id)
            .is_some_and(|r| r.is_expired(now, self.ttl));
        if stale {
            sessions.remove(session_id);
        }

        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .min_by(|a, b| {
                    a.touched_at
                        .cmp(&b.touched_at)
                        .then_with(|| a.session_id.cmp(&b.session_id))
                })
                .map(|r| r.session_id.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting session {}", oldest);
                sessions.remove(&oldest);
            }
        }

        let record = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord::new(session_id, now));
        record.touched_at = now;
        apply(record);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(512, Duration::minutes(30))
    }
}

impl ProgressSink for SessionStore {
    fn emit(&self, update: ProgressUpdate) {
        let at = update.created_at;
        self.record_update_at(update, at);
    }
}
