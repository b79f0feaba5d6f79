use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mod actions;
mod app;
mod config;
mod history;
mod poller;
mod registry;
mod session;
mod tmux;

use actions::Action;
use app::App;
use config::Config;
use history::PathHistory;
use poller::PollSupervisor;
use registry::Registry;
use tmux::{Multiplexer, TmuxClient};

fn init_logging(data_dir: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("cactus.log"))
        .context("Failed to open log file")?;

    // The terminal belongs to the TUI, so logs go to a file
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let data_dir = config::data_dir();
    init_logging(&data_dir)?;
    let config = Config::load(&data_dir.join("config.toml"))?;
    tracing::info!("starting with {:?}", config);

    let tmux_client = Arc::new(TmuxClient::with_path(config.tmux_path.clone()));
    let gateway: Arc<dyn Multiplexer> = tmux_client.clone();
    let history = PathHistory::new(data_dir.join("paths.txt"));
    let registry = Arc::new(Registry::new(
        gateway.clone(),
        history.clone(),
        config.naming(),
        config.launch_command.clone(),
    ));
    registry.discover_existing().await;

    // Create event channel
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    // Initialize terminal
    let mut terminal = ratatui::init();

    // Spawn input handler
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
        if input_tx.is_closed() {
            break;
        }
        if event::poll(Duration::from_millis(100)).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Press && input_tx.send(Action::KeyPress(key)).is_err()
                {
                    break;
                }
            }
        }
    });

    // Spawn status poller
    let mut supervisor = PollSupervisor::new(
        registry.clone(),
        gateway,
        config.poll_interval(),
        config.capture_lines,
    );
    if config.export_captured {
        supervisor = supervisor.with_export_dir(data_dir.clone());
    }
    tokio::spawn(supervisor.run(tx.clone()));

    // Create app state
    let mut app = App::new(history);
    app.set_sessions(registry.sorted_view());

    // Main event loop
    let result = loop {
        // Render
        if let Err(e) = terminal.draw(|f| app.render(f)) {
            break Err(anyhow::Error::new(e).context("Failed to draw"));
        }

        // Process any pending lifecycle commands
        let pending = app.take_pending_actions();
        let had_pending = !pending.is_empty();
        for pending_action in pending {
            match pending_action {
                Action::CreateSession(request) => match registry.create(request).await {
                    Ok(outcome) => {
                        let handle = &outcome.session.handle;
                        app.status_message = Some(if outcome.switched {
                            format!("Switched to: {}", handle)
                        } else {
                            format!("Attach: {}", tmux_client.attach_command(handle))
                        });
                    }
                    Err(e) => app.status_message = Some(e.to_string()),
                },
                Action::RenameSession { id, new_name } => {
                    match registry.rename(id, &new_name).await {
                        Ok(true) => app.status_message = Some(format!("Renamed to: {}", new_name)),
                        Ok(false) => {}
                        Err(e) => app.status_message = Some(e.to_string()),
                    }
                }
                Action::FocusSession(id) => {
                    let Some(session) = registry.get(id) else {
                        continue;
                    };
                    app.status_message = Some(if registry.focus(id).await {
                        format!("Switched to: {}", session.handle)
                    } else {
                        format!(
                            "No attached terminal! Run: {}",
                            tmux_client.attach_command(&session.handle)
                        )
                    });
                }
                Action::DeleteSession(id) => {
                    if let Some(outcome) = registry.delete(id).await {
                        app.status_message = Some(match outcome.refocused {
                            Some(target) => format!("Switched to: {}", target.handle),
                            None => format!("Deleted: {}", outcome.removed.name),
                        });
                    }
                }
                _ => {}
            }
        }
        if had_pending {
            app.set_sessions(registry.sorted_view());
            continue;
        }

        // Handle events from channel
        let Some(action) = rx.recv().await else {
            break Ok(());
        };
        match action {
            Action::SessionsChanged => app.set_sessions(registry.sorted_view()),
            action => match app.handle_action(action) {
                Ok(true) => break Ok(()),
                Ok(false) => {}
                Err(e) => break Err(e),
            },
        }
    };

    // Restore terminal
    ratatui::restore();
    tracing::info!("exiting");
    result
}
