use anyhow::Result;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::actions::Action;
use crate::history::PathHistory;
use crate::registry::CreateRequest;
use crate::session::{format_elapsed, Session, SessionId};
use crate::tmux::SessionStatus;

/// Theme colors
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub working: Color,
    pub waiting: Color,
    pub ready: Color,
    pub read: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(92, 184, 92), // cactus green
            dim: Color::Rgb(100, 100, 100),
            working: Color::Yellow,
            waiting: Color::Red,
            ready: Color::Green,
            read: Color::White,
        }
    }
}

impl Theme {
    fn status_color(&self, status: SessionStatus) -> Color {
        match status {
            SessionStatus::Working => self.working,
            SessionStatus::Waiting => self.waiting,
            SessionStatus::Ready => self.ready,
            SessionStatus::Read => self.read,
        }
    }
}

/// Which field of the new-session dialog has the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateField {
    Name,
    Directory,
}

/// Input mode for the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Creating,
    PickingPath,
    Renaming,
    Confirming,
}

pub const DEFAULT_HINT: &str = "In another terminal: tmux attach -t <session-name>";

/// Presentation state: renders registry snapshots and turns keys into actions
pub struct App {
    /// Latest sorted snapshot from the registry
    pub sessions: Vec<Session>,
    /// Currently selected session index
    pub list_state: ListState,
    /// Transient message from the last command
    pub status_message: Option<String>,
    pub theme: Theme,
    pub input_mode: InputMode,
    pub create_field: CreateField,
    pub name_input: String,
    pub directory_input: String,
    /// Rename dialog buffer
    pub input_buffer: String,
    /// Session the open rename/delete dialog acts on, fixed when it opens
    pub dialog_target: Option<SessionId>,
    /// Directories offered by the picker
    pub paths: Vec<String>,
    pub path_state: ListState,
    history: PathHistory,
    /// Pending action queue
    pub pending_actions: Vec<Action>,
}

impl App {
    pub fn new(history: PathHistory) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            sessions: Vec::new(),
            list_state,
            status_message: None,
            theme: Theme::default(),
            input_mode: InputMode::Normal,
            create_field: CreateField::Name,
            name_input: String::new(),
            directory_input: String::new(),
            input_buffer: String::new(),
            dialog_target: None,
            paths: Vec::new(),
            path_state: ListState::default(),
            history,
            pending_actions: Vec::new(),
        }
    }

    /// Get the currently selected session
    pub fn selected_session(&self) -> Option<&Session> {
        self.list_state
            .selected()
            .and_then(|i| self.sessions.get(i))
    }

    /// Session targeted by the open dialog, looked up in the current snapshot
    pub fn dialog_session(&self) -> Option<&Session> {
        self.dialog_target
            .and_then(|id| self.sessions.iter().find(|s| s.id == id))
    }

    /// Take pending actions (drains the queue)
    pub fn take_pending_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }

    /// Replace the snapshot, keeping the cursor position when possible
    pub fn set_sessions(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
        match self.list_state.selected() {
            Some(i) if i >= self.sessions.len() && !self.sessions.is_empty() => {
                self.list_state.select(Some(self.sessions.len() - 1));
            }
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    /// Handle an action and return whether to quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::KeyPress(key) => self.handle_key(key),
            _ => Ok(false),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        match self.input_mode {
            InputMode::Normal => return Ok(self.handle_normal_key(key)),
            InputMode::Creating => self.handle_creating_key(key),
            InputMode::PickingPath => self.handle_picking_key(key),
            InputMode::Renaming => self.handle_renaming_key(key),
            InputMode::Confirming => self.handle_confirming_key(key),
        }
        Ok(false)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => self.next_session(),
            KeyCode::Char('k') | KeyCode::Up => self.previous_session(),
            KeyCode::Char('s') | KeyCode::Enter => {
                if let Some(session) = self.selected_session() {
                    self.pending_actions.push(Action::FocusSession(session.id));
                }
            }
            KeyCode::Char('n') => {
                self.input_mode = InputMode::Creating;
                self.create_field = CreateField::Name;
                self.name_input.clear();
                self.directory_input.clear();
                self.paths = self.history.load();
            }
            KeyCode::Char('e') => {
                if let Some((id, name)) = self.selected_session().map(|s| (s.id, s.name.clone())) {
                    self.dialog_target = Some(id);
                    self.input_buffer = name;
                    self.input_mode = InputMode::Renaming;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_session().map(|s| s.id) {
                    self.dialog_target = Some(id);
                    self.input_mode = InputMode::Confirming;
                }
            }
            _ => {}
        }
        false
    }

    fn handle_creating_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Tab | KeyCode::BackTab => {
                self.create_field = match self.create_field {
                    CreateField::Name => CreateField::Directory,
                    CreateField::Directory => CreateField::Name,
                };
            }
            KeyCode::Enter => match self.create_field {
                CreateField::Name => self.create_field = CreateField::Directory,
                CreateField::Directory => {
                    let directory = self.directory_input.clone();
                    self.submit_create(directory);
                }
            },
            KeyCode::Char('@')
                if self.create_field == CreateField::Directory && !self.paths.is_empty() =>
            {
                self.path_state.select(Some(0));
                self.input_mode = InputMode::PickingPath;
            }
            KeyCode::Char(c) => self.active_input().push(c),
            KeyCode::Backspace => {
                self.active_input().pop();
            }
            _ => {}
        }
    }

    fn handle_picking_key(&mut self, key: KeyEvent) {
        let selected = self.path_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Creating,
            KeyCode::Char('j') | KeyCode::Down => {
                self.path_state
                    .select(Some(wrap_next(selected, self.paths.len())));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.path_state
                    .select(Some(wrap_previous(selected, self.paths.len())));
            }
            KeyCode::Enter => {
                if let Some(path) = self.paths.get(selected).cloned() {
                    self.submit_create(path);
                }
            }
            KeyCode::Char('d') => {
                if selected >= self.paths.len() {
                    return;
                }
                let path = self.paths.remove(selected);
                if let Err(e) = self.history.delete(&path) {
                    tracing::warn!("could not forget {}: {:#}", path, e);
                }
                if self.paths.is_empty() {
                    self.input_mode = InputMode::Creating;
                } else if selected >= self.paths.len() {
                    self.path_state.select(Some(self.paths.len() - 1));
                }
            }
            _ => {}
        }
    }

    fn handle_renaming_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let new_name = self.input_buffer.trim().to_string();
                if let Some(id) = self.dialog_target.take() {
                    if !new_name.is_empty() {
                        self.pending_actions
                            .push(Action::RenameSession { id, new_name });
                    }
                }
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                self.dialog_target = None;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Char(c) => self.input_buffer.push(c),
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            _ => {}
        }
    }

    fn handle_confirming_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = self.dialog_target.take() {
                    self.pending_actions.push(Action::DeleteSession(id));
                }
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.dialog_target = None;
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn active_input(&mut self) -> &mut String {
        match self.create_field {
            CreateField::Name => &mut self.name_input,
            CreateField::Directory => &mut self.directory_input,
        }
    }

    fn submit_create(&mut self, directory: String) {
        let name = self.name_input.trim();
        self.pending_actions.push(Action::CreateSession(CreateRequest {
            name: (!name.is_empty()).then(|| name.to_string()),
            directory,
        }));
        self.input_mode = InputMode::Normal;
    }

    fn next_session(&mut self) {
        if self.sessions.is_empty() {
            return;
        }
        let i = self
            .list_state
            .selected()
            .map_or(0, |i| wrap_next(i, self.sessions.len()));
        self.list_state.select(Some(i));
    }

    fn previous_session(&mut self) {
        if self.sessions.is_empty() {
            return;
        }
        let i = self
            .list_state
            .selected()
            .map_or(0, |i| wrap_previous(i, self.sessions.len()));
        self.list_state.select(Some(i));
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Session list
                Constraint::Length(3), // Hint/keys
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_session_list(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);

        // Render modal dialogs on top
        match self.input_mode {
            InputMode::Creating => self.render_create_dialog(frame),
            InputMode::PickingPath => self.render_path_picker(frame),
            InputMode::Renaming => self.render_rename_dialog(frame),
            InputMode::Confirming => self.render_confirm_dialog(frame),
            InputMode::Normal => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                " 🌵 Cactus ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "│ claude-code session manager",
                Style::default()
                    .fg(self.theme.dim)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(title, area);
    }

    fn render_session_list(&mut self, frame: &mut Frame, area: Rect) {
        let now = Local::now();
        // Borders and highlight symbol
        let width = area.width.saturating_sub(4) as usize;

        let items: Vec<ListItem> = if self.sessions.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "  No sessions. Press 'n' to create one.",
                Style::default().fg(self.theme.dim),
            )))]
        } else {
            self.sessions
                .iter()
                .map(|session| {
                    let marker = if session.is_focused { "* " } else { "  " };
                    let age = if session.is_focused {
                        "-".to_string()
                    } else {
                        format_elapsed(session.last_focused_at, now)
                    };
                    let used = marker.chars().count()
                        + 2
                        + session.name.chars().count()
                        + age.chars().count();
                    let padding = width.saturating_sub(used).max(1);

                    ListItem::new(Line::from(vec![
                        Span::styled(marker, Style::default().fg(self.theme.accent)),
                        Span::styled(
                            "● ",
                            Style::default().fg(self.theme.status_color(session.status)),
                        ),
                        Span::styled(session.name.as_str(), Style::default().fg(self.theme.fg)),
                        Span::raw(" ".repeat(padding)),
                        Span::styled(age, Style::default().fg(self.theme.dim)),
                    ]))
                })
                .collect()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Sessions ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.dim)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(50, 50, 50))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("→ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let hint = self.status_message.as_deref().unwrap_or(DEFAULT_HINT);
        let keys = " n: New │ e: Rename │ s: Switch │ d: Delete │ j/k: Navigate │ q: Quit";

        let footer = Paragraph::new(vec![
            Line::from(Span::styled(
                format!(" {}", hint),
                Style::default().fg(self.theme.fg),
            )),
            Line::from(Span::styled(keys, Style::default().fg(self.theme.dim))),
        ])
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(footer, area);
    }

    fn render_create_dialog(&self, frame: &mut Frame) {
        let area = centered_rect(50, 40, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" + New Session ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let field = |label: &str, value: &str, placeholder: &str, active: bool| {
            let cursor = if active { "_" } else { "" };
            let value_span = if value.is_empty() && !active {
                Span::styled(placeholder.to_string(), Style::default().fg(self.theme.dim))
            } else {
                Span::styled(
                    format!("{}{}", value, cursor),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
            };
            vec![
                Line::from(Span::styled(
                    label.to_string(),
                    Style::default().fg(self.theme.dim),
                )),
                Line::from(vec![Span::raw("▶ "), value_span]),
                Line::from(""),
            ]
        };

        let directory_placeholder = if self.paths.is_empty() {
            "~/code/my-project"
        } else {
            "~/code/my-project (or @)"
        };

        let mut text = vec![Line::from("")];
        text.extend(field(
            "name",
            &self.name_input,
            "leave blank for random",
            self.create_field == CreateField::Name,
        ));
        text.extend(field(
            "directory",
            &self.directory_input,
            directory_placeholder,
            self.create_field == CreateField::Directory,
        ));
        text.push(Line::from(Span::styled(
            "Enter: next/create │ Tab: switch field │ Esc: cancel",
            Style::default().fg(self.theme.dim),
        )));

        frame.render_widget(Paragraph::new(text), inner);
    }

    fn render_path_picker(&mut self, frame: &mut Frame) {
        let area = centered_rect(60, 40, frame.area());
        frame.render_widget(Clear, area);

        let items: Vec<ListItem> = self
            .paths
            .iter()
            .map(|p| ListItem::new(Span::styled(p.as_str(), Style::default().fg(self.theme.fg))))
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(" Recent directories ")
                    .title_bottom(" press d to remove a path ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.accent)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.path_state);
    }

    fn render_rename_dialog(&self, frame: &mut Frame) {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Rename Session ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "new name:",
                Style::default().fg(self.theme.fg),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("▶ {}_", self.input_buffer),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter to rename, Esc to cancel",
                Style::default().fg(self.theme.dim),
            )),
        ];

        frame.render_widget(Paragraph::new(text), inner);
    }

    fn render_confirm_dialog(&self, frame: &mut Frame) {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Confirm Delete ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.waiting));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (session_name, directory) = self
            .dialog_session()
            .map(|s| {
                let directory = if s.working_directory.as_os_str().is_empty() {
                    "discovered at startup".to_string()
                } else {
                    s.working_directory.display().to_string()
                };
                (s.name.as_str(), directory)
            })
            .unwrap_or(("unknown", String::new()));

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Kill session '{}'?", session_name),
                Style::default().fg(self.theme.fg),
            )),
            Line::from(Span::styled(directory, Style::default().fg(self.theme.dim))),
            Line::from(""),
            Line::from(Span::styled(
                "Press 'y' to confirm, 'n' or Esc to cancel",
                Style::default().fg(self.theme.dim),
            )),
        ];

        frame.render_widget(Paragraph::new(text), inner);
    }
}

fn wrap_next(i: usize, len: usize) -> usize {
    if len == 0 || i + 1 >= len {
        0
    } else {
        i + 1
    }
}

fn wrap_previous(i: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else if i == 0 {
        len - 1
    } else {
        i - 1
    }
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Naming, SessionId};
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> Action {
        Action::KeyPress(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn test_app(dir: &tempfile::TempDir, names: &[&str]) -> App {
        let mut app = App::new(PathHistory::new(dir.path().join("paths.txt")));
        let naming = Naming::default();
        app.set_sessions(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    Session::new(SessionId::new(i as u64 + 1), name, Default::default(), &naming)
                })
                .collect(),
        );
        app
    }

    #[test]
    fn test_navigation_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir, &["a", "b", "c"]);
        app.handle_action(key(KeyCode::Up)).unwrap();
        assert_eq!(app.list_state.selected(), Some(2));
        app.handle_action(key(KeyCode::Char('j'))).unwrap();
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn test_quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir, &[]);
        assert!(app.handle_action(key(KeyCode::Char('q'))).unwrap());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(ctrl_c.kind, KeyEventKind::Press);
        assert!(app.handle_action(Action::KeyPress(ctrl_c)).unwrap());
    }

    #[test]
    fn test_create_dialog_submits_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir, &[]);
        app.handle_action(key(KeyCode::Char('n'))).unwrap();
        type_text(&mut app, "api");
        app.handle_action(key(KeyCode::Enter)).unwrap();
        type_text(&mut app, "~/code/api");
        app.handle_action(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.input_mode, InputMode::Normal);
        match app.take_pending_actions().as_slice() {
            [Action::CreateSession(request)] => {
                assert_eq!(request.name.as_deref(), Some("api"));
                assert_eq!(request.directory, "~/code/api");
            }
            other => panic!("unexpected actions {:?}", other),
        }
    }

    #[test]
    fn test_path_picker() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir, &[]);
        app.history.save("/srv/one").unwrap();
        app.history.save("/srv/two").unwrap();

        app.handle_action(key(KeyCode::Char('n'))).unwrap();
        app.handle_action(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "@");
        assert_eq!(app.input_mode, InputMode::PickingPath);
        assert!(app.directory_input.is_empty());

        // Forget "/srv/two", then pick the remaining one
        app.handle_action(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.history.load(), vec!["/srv/one".to_string()]);
        app.handle_action(key(KeyCode::Enter)).unwrap();

        match app.take_pending_actions().as_slice() {
            [Action::CreateSession(request)] => {
                assert_eq!(request.name, None);
                assert_eq!(request.directory, "/srv/one");
            }
            other => panic!("unexpected actions {:?}", other),
        }
    }

    #[test]
    fn test_rename_and_delete_target_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir, &["a", "b"]);
        app.handle_action(key(KeyCode::Down)).unwrap();

        app.handle_action(key(KeyCode::Char('e'))).unwrap();
        assert_eq!(app.input_buffer, "b");
        app.handle_action(key(KeyCode::Backspace)).unwrap();
        type_text(&mut app, "beta");
        app.handle_action(key(KeyCode::Enter)).unwrap();

        app.handle_action(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.input_mode, InputMode::Confirming);
        app.handle_action(key(KeyCode::Char('y'))).unwrap();

        let actions = app.take_pending_actions();
        assert!(matches!(
            &actions[0],
            Action::RenameSession { id, new_name } if *id == SessionId::new(2) && new_name == "beta"
        ));
        assert!(matches!(actions[1], Action::DeleteSession(id) if id == SessionId::new(2)));
    }

    #[test]
    fn test_dialog_target_survives_resort() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir, &["a", "b"]);
        app.handle_action(key(KeyCode::Down)).unwrap();

        // A poll re-sorts the list while the rename dialog is open
        app.handle_action(key(KeyCode::Char('e'))).unwrap();
        let mut reversed = app.sessions.clone();
        reversed.reverse();
        app.set_sessions(reversed);
        assert_eq!(app.selected_session().map(|s| s.name.as_str()), Some("a"));
        app.handle_action(key(KeyCode::Backspace)).unwrap();
        type_text(&mut app, "beta");
        app.handle_action(key(KeyCode::Enter)).unwrap();

        // Same for the delete confirmation, now targeting "a" at index 1
        app.handle_action(key(KeyCode::Char('d'))).unwrap();
        let mut reversed = app.sessions.clone();
        reversed.reverse();
        app.set_sessions(reversed);
        assert_eq!(app.dialog_session().map(|s| s.name.as_str()), Some("a"));
        app.handle_action(key(KeyCode::Char('y'))).unwrap();

        let actions = app.take_pending_actions();
        assert!(matches!(
            &actions[0],
            Action::RenameSession { id, new_name } if *id == SessionId::new(2) && new_name == "beta"
        ));
        assert!(matches!(actions[1], Action::DeleteSession(id) if id == SessionId::new(1)));
        assert_eq!(app.dialog_target, None);
    }

    #[test]
    fn test_selection_clamped_on_shrink() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir, &["a", "b", "c"]);
        app.list_state.select(Some(2));
        let remaining = app.sessions[..1].to_vec();
        app.set_sessions(remaining);
        assert_eq!(app.list_state.selected(), Some(0));
    }
}
