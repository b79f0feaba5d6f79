//! The single source of truth for supervised sessions.
//!
//! The roster lives behind one mutex. Lifecycle commands read what they need,
//! drop the lock, talk to the multiplexer, then re-lock to apply the result,
//! so a slow tmux call never blocks the poll loop.

use chrono::Local;
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::history::{resolve_directory, PathHistory};
use crate::session::{generate_unique_name, is_valid_name, Naming, Session, SessionId};
use crate::tmux::{Multiplexer, SessionStatus, StatusClassifier};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no session {0}")]
    UnknownSession(SessionId),
    #[error("a session named '{0}' already exists")]
    NameTaken(String),
    #[error("session names cannot contain '.' or ':' ('{0}')")]
    InvalidName(String),
}

/// Input collected by the new-session dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRequest {
    /// Blank picks a random name
    pub name: Option<String>,
    /// Blank means home
    pub directory: String,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub session: Session,
    /// Whether an attached client was switched to the new session
    pub switched: bool,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub removed: Session,
    /// Session that received focus before the removal
    pub refocused: Option<Session>,
}

#[derive(Default)]
struct Roster {
    sessions: Vec<Session>,
    next_id: u64,
}

impl Roster {
    fn allocate_id(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId::new(self.next_id)
    }

    fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    fn names(&self) -> HashSet<String> {
        self.sessions.iter().map(|s| s.name.clone()).collect()
    }

    fn name_taken(&self, name: &str, except: Option<SessionId>) -> bool {
        self.sessions
            .iter()
            .any(|s| s.name == name && Some(s.id) != except)
    }

    /// Mark `id` as the only focused session
    fn focus_only(&mut self, id: SessionId) {
        for session in &mut self.sessions {
            session.is_focused = session.id == id;
        }
    }

    /// Stable sort by urgency, then most recently focused first
    fn sort(&mut self) {
        self.sessions
            .sort_by_key(|s| (s.status.priority(), Reverse(s.last_focused_at)));
    }
}

pub struct Registry {
    roster: Mutex<Roster>,
    gateway: Arc<dyn Multiplexer>,
    history: PathHistory,
    naming: Naming,
    launch_command: String,
}

impl Registry {
    pub fn new(
        gateway: Arc<dyn Multiplexer>,
        history: PathHistory,
        naming: Naming,
        launch_command: impl Into<String>,
    ) -> Self {
        Self {
            roster: Mutex::new(Roster::default()),
            gateway,
            history,
            naming,
            launch_command: launch_command.into(),
        }
    }

    /// Adopt backend sessions that follow the naming convention.
    ///
    /// Returns how many sessions were added. Backend state is untouched.
    pub async fn discover_existing(&self) -> usize {
        let handles = self.gateway.list_sessions().await;

        let mut roster = self.roster.lock();
        let mut added = 0;
        for handle in handles {
            let Some(name) = self.naming.name_from_handle(&handle) else {
                continue;
            };
            if roster.sessions.iter().any(|s| s.handle == handle) {
                continue;
            }
            let id = roster.allocate_id();
            roster
                .sessions
                .push(Session::new(id, name, Default::default(), &self.naming));
            added += 1;
        }
        tracing::info!("discovered {} existing sessions", added);
        added
    }

    /// Start a new supervised session and point attached clients at it
    pub async fn create(&self, request: CreateRequest) -> Result<CreateOutcome, RegistryError> {
        let requested = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let name = {
            let roster = self.roster.lock();
            match requested {
                Some(name) if roster.name_taken(&name, None) => {
                    return Err(RegistryError::NameTaken(name))
                }
                Some(name) if !is_valid_name(&name) => {
                    return Err(RegistryError::InvalidName(name))
                }
                Some(name) => name,
                None => generate_unique_name(&mut rand::thread_rng(), &roster.names()),
            }
        };

        let directory = resolve_directory(&request.directory);
        if let Err(e) = self.history.save(&directory.to_string_lossy()) {
            tracing::warn!("could not record directory: {:#}", e);
        }

        let handle = self.naming.handle_for(&name);
        tracing::info!("creating session {} in {}", handle, directory.display());
        self.gateway.create_session(&handle, &directory, &name).await;
        self.gateway.send_text(&handle, &self.launch_command).await;

        let session = {
            let mut roster = self.roster.lock();
            let id = roster.allocate_id();
            let mut session = Session::new(id, &name, directory, &self.naming);
            session.is_focused = true;
            for other in &mut roster.sessions {
                other.is_focused = false;
            }
            roster.sessions.push(session.clone());
            session
        };

        let switched = self.gateway.switch_focus(&session.handle).await;
        Ok(CreateOutcome { session, switched })
    }

    /// Rename a session and its backend counterpart.
    ///
    /// Returns `Ok(false)` without touching the backend when `new_name` is
    /// blank or already the current name. The in-memory rename is kept even
    /// if tmux reports a failure.
    pub async fn rename(&self, id: SessionId, new_name: &str) -> Result<bool, RegistryError> {
        let new_name = new_name.trim();
        let old_handle = {
            let roster = self.roster.lock();
            let session = roster.get(id).ok_or(RegistryError::UnknownSession(id))?;
            if new_name.is_empty() || new_name == session.name {
                return Ok(false);
            }
            if !is_valid_name(new_name) {
                return Err(RegistryError::InvalidName(new_name.to_string()));
            }
            if roster.name_taken(new_name, Some(id)) {
                return Err(RegistryError::NameTaken(new_name.to_string()));
            }
            session.handle.clone()
        };

        let new_handle = self.naming.handle_for(new_name);
        if !self.gateway.rename_session(&old_handle, &new_handle).await {
            tracing::warn!(
                "backend rename {} -> {} failed, keeping new name",
                old_handle,
                new_handle
            );
        }

        let mut roster = self.roster.lock();
        let session = roster
            .get_mut(id)
            .ok_or(RegistryError::UnknownSession(id))?;
        session.name = new_name.to_string();
        session.handle = new_handle;
        Ok(true)
    }

    /// Switch attached clients to the session.
    ///
    /// On success it becomes the only focused session and a `Ready` session
    /// is demoted to `Read`. `false` means no client is attached.
    pub async fn focus(&self, id: SessionId) -> bool {
        let Some(handle) = self.roster.lock().get(id).map(|s| s.handle.clone()) else {
            return false;
        };

        if !self.gateway.switch_focus(&handle).await {
            return false;
        }

        let mut roster = self.roster.lock();
        roster.focus_only(id);
        if let Some(session) = roster.get_mut(id) {
            session.last_focused_at = Local::now();
            if session.status == SessionStatus::Ready {
                session.status = SessionStatus::Read;
            }
        }
        true
    }

    /// Remove a session from the backend and the registry.
    ///
    /// When other sessions exist, clients are first moved to one of them so
    /// they are not detached by the kill.
    pub async fn delete(&self, id: SessionId) -> Option<DeleteOutcome> {
        let (removed, target) = {
            let mut roster = self.roster.lock();
            roster.sort();
            let index = roster.sessions.iter().position(|s| s.id == id)?;
            let target = match roster.sessions.len() {
                1 => None,
                _ => Some(roster.sessions[if index == 0 { 1 } else { 0 }].clone()),
            };
            (roster.sessions[index].clone(), target)
        };

        let mut refocused = None;
        if let Some(target) = target {
            if self.gateway.switch_focus(&target.handle).await {
                self.roster.lock().focus_only(target.id);
                refocused = Some(target);
            }
        }

        tracing::info!("deleting session {}", removed.handle);
        self.gateway.delete_session(&removed.handle).await;
        self.roster.lock().sessions.retain(|s| s.id != id);

        Some(DeleteOutcome { removed, refocused })
    }

    /// Feed a fresh sample through the classifier. Returns whether the
    /// session's status changed.
    pub fn apply_poll_result(&self, id: SessionId, sample: &str) -> bool {
        let mut roster = self.roster.lock();
        let Some(session) = roster.get_mut(id) else {
            return false;
        };

        let (next, changed) =
            StatusClassifier::classify(sample, &session.last_sample, session.status);
        if sample != session.last_sample {
            session.last_sample = sample.to_string();
        }
        if changed {
            tracing::debug!("{}: {:?} -> {:?}", session.name, session.status, next);
            session.status = next;
        }
        changed
    }

    /// `(id, name, handle)` of every session, for the poller
    pub fn poll_targets(&self) -> Vec<(SessionId, String, String)> {
        self.roster
            .lock()
            .sessions
            .iter()
            .map(|s| (s.id, s.name.clone(), s.handle.clone()))
            .collect()
    }

    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.roster.lock().get(id).cloned()
    }

    /// Snapshot ordered most urgent first, most recently focused first within a status
    pub fn sorted_view(&self) -> Vec<Session> {
        let mut roster = self.roster.lock();
        roster.sort();
        roster.sessions.clone()
    }
}
