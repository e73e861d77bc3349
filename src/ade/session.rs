// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::element_cache::SessionElementCache;
use super::errors::{AdeError, AdeResult};
use super::search::SearchListManager;
use log::{debug, error, info};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// State kept for one editor browser session.
#[derive(Debug)]
pub struct EditorSession {
    id: String,
    user: String,
    pub elements: SessionElementCache,
    pub search: SearchListManager,
}

impl EditorSession {
    fn new(user: &str) -> Self {
        Self {
            id: generate_session_id(),
            user: user.to_string(),
            elements: SessionElementCache::new(),
            search: SearchListManager::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

#[derive(Debug)]
struct SessionRecord {
    session: Arc<EditorSession>,
    last_seen: Instant,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<String, SessionRecord>,
    session_order: VecDeque<String>,
}

impl RegistryState {
    fn cleanup_expired(&mut self, now: Instant, idle: Duration) {
        self.sessions
            .retain(|_, record| now.duration_since(record.last_seen) < idle);
        self.session_order
            .retain(|id| self.sessions.contains_key(id));
    }

    fn prune_overflow(&mut self, max_sessions: usize) {
        while self.sessions.len() > max_sessions {
            if let Some(oldest) = self.session_order.pop_front() {
                self.sessions.remove(&oldest);
            } else {
                break;
            }
        }
    }

    fn remove(&mut self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        self.session_order.retain(|id| id != session_id);
        removed
    }
}

/// Editor sessions keyed by cookie value, expired after an idle period.
#[derive(Debug)]
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    idle: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(idle: Duration, max_sessions: usize) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            idle,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Returns the session for `session_id`, or a fresh one when the id is
    /// unknown, expired, or owned by another user. The flag is true when a
    /// new session was created.
    pub fn session_for(
        &self,
        session_id: Option<&str>,
        user: &str,
    ) -> AdeResult<(Arc<EditorSession>, bool)> {
        let now = Instant::now();
        let mut state = self.state.lock().map_err(|_| {
            error!("🚨 CRITICAL: SessionRegistry lock poisoned in session_for");
            AdeError::internal("Session registry unavailable")
        })?;
        state.cleanup_expired(now, self.idle);

        if let Some(session_id) = session_id {
            let reusable = match state.sessions.get_mut(session_id) {
                Some(record) if record.session.user == user => {
                    record.last_seen = now;
                    Some(Arc::clone(&record.session))
                }
                Some(_) => None,
                None => None,
            };
            if let Some(session) = reusable {
                return Ok((session, false));
            }
            if state.remove(session_id) {
                info!("Discarded editor session of a different user");
            }
        }

        let session = Arc::new(EditorSession::new(user));
        debug!("Created editor session for {}", user);
        state.sessions.insert(
            session.id.clone(),
            SessionRecord {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        state.session_order.push_back(session.id.clone());
        state.prune_overflow(self.max_sessions);
        Ok((session, true))
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.sessions.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn generate_session_id() -> String {
    format!("ade_{}", Uuid::new_v4().simple())
}
