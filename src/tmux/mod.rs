mod client;
#[cfg(test)]
pub mod fake;
mod heuristics;

pub use client::TmuxClient;
pub use heuristics::{SessionStatus, StatusClassifier};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Maps a backend session handle to the id of its first pane
pub type PaneMap = HashMap<String, String>;

/// Everything the supervisor needs from a terminal multiplexer.
///
/// Every call is best-effort: failures are logged by the implementation and
/// come back as an empty result or `false`, never as an error.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Handles of all live backend sessions
    async fn list_sessions(&self) -> Vec<String>;

    /// Create a detached session rooted at `directory` labelled `label`
    async fn create_session(&self, handle: &str, directory: &Path, label: &str);

    /// Type `text` into the session followed by Enter
    async fn send_text(&self, handle: &str, text: &str);

    /// Attached interactive clients
    async fn list_clients(&self) -> HashSet<String>;

    /// Point one client at a session
    async fn switch_client(&self, client: &str, handle: &str);

    async fn rename_session(&self, old_handle: &str, new_handle: &str) -> bool;

    async fn delete_session(&self, handle: &str) -> bool;

    /// First pane of every live session
    async fn poll_pane_map(&self) -> PaneMap;

    /// Visible lines of a pane, empty on failure
    async fn capture_pane(&self, pane_id: &str) -> Vec<String>;

    /// Redirect every attached client to `handle`.
    ///
    /// Returns `false` when no client is attached, meaning there is no live
    /// terminal to switch.
    async fn switch_focus(&self, handle: &str) -> bool {
        let clients = self.list_clients().await;
        if clients.is_empty() {
            return false;
        }
        for client in &clients {
            self.switch_client(client, handle).await;
        }
        true
    }
}
