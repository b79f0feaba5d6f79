use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;

use super::{Multiplexer, PaneMap};

/// Failure of a single tmux invocation
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute tmux {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tmux {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Client for interacting with tmux via CLI
pub struct TmuxClient {
    /// Path to tmux binary
    tmux_path: String,
}

impl TmuxClient {
    pub fn new() -> Self {
        Self::with_path("tmux")
    }

    pub fn with_path(tmux_path: impl Into<String>) -> Self {
        Self {
            tmux_path: tmux_path.into(),
        }
    }

    /// Run tmux with `args`, treating a non-zero exit as failure
    async fn run(&self, args: &[&str]) -> Result<Output, CommandError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        let output = Command::new(&self.tmux_path)
            .args(args)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CommandError::Failed { command, stderr });
        }

        Ok(output)
    }

    /// Run a command whose output nobody needs, logging failures
    async fn run_logged(&self, args: &[&str]) -> bool {
        match self.run(args).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }

    /// Run a command and return its stdout, empty on failure
    async fn run_stdout(&self, args: &[&str]) -> Option<String> {
        match self.run(args).await {
            Ok(output) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            Err(e) => {
                tracing::debug!("{}", e);
                None
            }
        }
    }

    /// Get the command to attach to a session (for external execution)
    pub fn attach_command(&self, handle: &str) -> String {
        format!("{} attach -t {}", self.tmux_path, handle)
    }
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Multiplexer for TmuxClient {
    async fn list_sessions(&self) -> Vec<String> {
        // "no server running" lands here too
        self.run_stdout(&["list-sessions", "-F", "#{session_name}"])
            .await
            .map(|stdout| parse_lines(&stdout))
            .unwrap_or_default()
    }

    async fn create_session(&self, handle: &str, directory: &Path, label: &str) {
        let directory = directory.to_string_lossy().into_owned();
        if !self
            .run_logged(&["new-session", "-d", "-s", handle, "-c", directory.as_str()])
            .await
        {
            return;
        }

        let status_left = format!(" {} | ", label);
        self.run_logged(&["set-option", "-t", handle, "mouse", "on"])
            .await;
        self.run_logged(&["set-option", "-t", handle, "status-left", status_left.as_str()])
            .await;
        self.run_logged(&["set-option", "-t", handle, "status-right", ""])
            .await;
    }

    async fn send_text(&self, handle: &str, text: &str) {
        self.run_logged(&["send-keys", "-t", handle, text, "Enter"])
            .await;
    }

    async fn list_clients(&self) -> HashSet<String> {
        self.run_stdout(&["list-clients", "-F", "#{client_tty}"])
            .await
            .map(|stdout| parse_lines(&stdout).into_iter().collect())
            .unwrap_or_default()
    }

    async fn switch_client(&self, client: &str, handle: &str) {
        self.run_logged(&["switch-client", "-c", client, "-t", handle])
            .await;
    }

    async fn rename_session(&self, old_handle: &str, new_handle: &str) -> bool {
        self.run_logged(&["rename-session", "-t", old_handle, new_handle])
            .await
    }

    async fn delete_session(&self, handle: &str) -> bool {
        self.run_logged(&["kill-session", "-t", handle]).await
    }

    async fn poll_pane_map(&self) -> PaneMap {
        self.run_stdout(&["list-panes", "-a", "-F", "#{session_name} #{pane_id}"])
            .await
            .map(|stdout| parse_pane_map(&stdout))
            .unwrap_or_default()
    }

    async fn capture_pane(&self, pane_id: &str) -> Vec<String> {
        self.run_stdout(&["capture-pane", "-p", "-t", pane_id])
            .await
            .map(|stdout| stdout.split('\n').map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Non-empty lines of a tmux listing
fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `#{session_name} #{pane_id}` lines, keeping the first pane per session
fn parse_pane_map(stdout: &str) -> PaneMap {
    let mut panes = PaneMap::new();
    for line in stdout.lines() {
        if let Some((session, pane)) = line.split_once(' ') {
            panes
                .entry(session.to_string())
                .or_insert_with(|| pane.to_string());
        }
    }
    panes
}
