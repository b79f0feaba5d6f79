use crossterm::event::KeyEvent;

use crate::registry::CreateRequest;
use crate::session::SessionId;

/// Actions that can be dispatched through the application
#[derive(Debug, Clone)]
pub enum Action {
    /// A key was pressed
    KeyPress(KeyEvent),
    /// The poller changed at least one session's status
    SessionsChanged,
    /// Create a new session
    CreateSession(CreateRequest),
    /// Rename a session
    RenameSession { id: SessionId, new_name: String },
    /// Point attached clients at a session
    FocusSession(SessionId),
    /// Delete a session
    DeleteSession(SessionId),
}
