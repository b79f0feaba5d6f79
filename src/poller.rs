use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::actions::Action;
use crate::registry::Registry;
use crate::tmux::Multiplexer;

/// Samples every session's pane on a fixed period and feeds the registry
pub struct PollSupervisor {
    registry: Arc<Registry>,
    gateway: Arc<dyn Multiplexer>,
    interval: Duration,
    capture_lines: usize,
    /// Where raw captures are dumped, when enabled
    export_dir: Option<PathBuf>,
}

impl PollSupervisor {
    pub fn new(
        registry: Arc<Registry>,
        gateway: Arc<dyn Multiplexer>,
        interval: Duration,
        capture_lines: usize,
    ) -> Self {
        Self {
            registry,
            gateway,
            interval,
            capture_lines,
            export_dir: None,
        }
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = Some(dir);
        self
    }

    /// Poll forever, asking for a redraw after ticks that changed something
    pub async fn run(self, tx: UnboundedSender<Action>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.tick_and_notify(&tx).await {
                tracing::debug!("main loop gone, stopping poller");
                break;
            }
        }
    }

    /// One tick plus at most one `SessionsChanged`. Returns `false` once the
    /// receiver has been dropped.
    pub async fn tick_and_notify(&self, tx: &UnboundedSender<Action>) -> bool {
        if self.tick().await {
            return tx.send(Action::SessionsChanged).is_ok();
        }
        !tx.is_closed()
    }

    /// Sample every mapped session once. Returns whether any status changed.
    pub async fn tick(&self) -> bool {
        let panes = self.gateway.poll_pane_map().await;
        let mut changed = false;

        for (id, name, handle) in self.registry.poll_targets() {
            let Some(pane_id) = panes.get(&handle) else {
                continue;
            };

            let lines = self.gateway.capture_pane(pane_id).await;
            if lines.is_empty() {
                continue;
            }

            if let Some(dir) = &self.export_dir {
                let path = dir.join(format!("{}_output.txt", name));
                if let Err(e) = tokio::fs::write(&path, lines.join("\n")).await {
                    tracing::debug!("could not export {}: {}", path.display(), e);
                }
            }

            let sample = last_lines(&lines, self.capture_lines);
            changed |= self.registry.apply_poll_result(id, &sample);
        }

        changed
    }
}

/// The trailing `n` lines joined with newlines
fn last_lines(lines: &[String], n: usize) -> String {
    lines[lines.len().saturating_sub(n)..].join("\n")
}
