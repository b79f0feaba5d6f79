//! In-memory multiplexer used by registry and poller tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::{Multiplexer, PaneMap};

#[derive(Default)]
struct FakeState {
    sessions: Vec<String>,
    clients: HashSet<String>,
    panes: PaneMap,
    captures: HashMap<String, Vec<String>>,
    calls: Vec<String>,
    focused: Option<String>,
}

/// Records every call and serves canned pane content
#[derive(Default)]
pub struct FakeMultiplexer {
    state: Mutex<FakeState>,
}

impl FakeMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake with one attached client
    pub fn attached() -> Self {
        let fake = Self::new();
        fake.state.lock().clients.insert("/dev/pts/1".to_string());
        fake
    }

    pub fn with_sessions(self, handles: &[&str]) -> Self {
        self.state.lock().sessions = handles.iter().map(|h| h.to_string()).collect();
        self
    }

    /// Map `handle` to pane `pane_id` showing `lines`
    pub fn set_pane(&self, handle: &str, pane_id: &str, lines: &[&str]) {
        let mut state = self.state.lock();
        state.panes.insert(handle.to_string(), pane_id.to_string());
        state
            .captures
            .insert(pane_id.to_string(), lines.iter().map(|l| l.to_string()).collect());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn focused(&self) -> Option<String> {
        self.state.lock().focused.clone()
    }

    pub fn live_sessions(&self) -> Vec<String> {
        self.state.lock().sessions.clone()
    }
}

#[async_trait]
impl Multiplexer for FakeMultiplexer {
    async fn list_sessions(&self) -> Vec<String> {
        self.state.lock().sessions.clone()
    }

    async fn create_session(&self, handle: &str, directory: &Path, label: &str) {
        let mut state = self.state.lock();
        state.sessions.push(handle.to_string());
        state
            .calls
            .push(format!("create {} {} {}", handle, directory.display(), label));
    }

    async fn send_text(&self, handle: &str, text: &str) {
        self.state.lock().calls.push(format!("send {} {}", handle, text));
    }

    async fn list_clients(&self) -> HashSet<String> {
        self.state.lock().clients.clone()
    }

    async fn switch_client(&self, _client: &str, handle: &str) {
        let mut state = self.state.lock();
        state.focused = Some(handle.to_string());
        state.calls.push(format!("switch {}", handle));
    }

    async fn rename_session(&self, old_handle: &str, new_handle: &str) -> bool {
        let mut state = self.state.lock();
        state
            .calls
            .push(format!("rename {} {}", old_handle, new_handle));
        match state.sessions.iter_mut().find(|s| *s == old_handle) {
            Some(session) => {
                *session = new_handle.to_string();
                true
            }
            None => false,
        }
    }

    async fn delete_session(&self, handle: &str) -> bool {
        let mut state = self.state.lock();
        state.calls.push(format!("kill {}", handle));
        let before = state.sessions.len();
        state.sessions.retain(|s| s != handle);
        state.sessions.len() != before
    }

    async fn poll_pane_map(&self) -> PaneMap {
        self.state.lock().panes.clone()
    }

    async fn capture_pane(&self, pane_id: &str) -> Vec<String> {
        self.state
            .lock()
            .captures
            .get(pane_id)
            .cloned()
            .unwrap_or_default()
    }
}
