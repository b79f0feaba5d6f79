use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::tmux::SessionStatus;

const ADJECTIVES: [&str; 16] = [
    "swift", "bright", "quiet", "bold", "cool", "calm", "wild", "deep", "keen", "wise", "pure",
    "warm", "fresh", "smooth", "sharp", "clear",
];

const NOUNS: [&str; 16] = [
    "fox", "hawk", "wolf", "bear", "lynx", "eagle", "raven", "otter", "spark", "wave", "node",
    "pixel", "cloud", "forge", "vertex", "prism",
];

/// Registry-assigned identifier, stable across renames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Characters tmux rewrites to `_` in session names
pub const RESERVED_NAME_CHARS: [char; 2] = ['.', ':'];

/// Whether tmux would keep `name` as given
pub fn is_valid_name(name: &str) -> bool {
    !name.contains(RESERVED_NAME_CHARS)
}

/// Derives backend handles from display names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    prefix: String,
}

impl Naming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn handle_for(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Display name of a backend session following the convention
    pub fn name_from_handle<'a>(&self, handle: &'a str) -> Option<&'a str> {
        handle
            .strip_prefix(self.prefix.as_str())
            .filter(|name| !name.is_empty())
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self::new("claude-")
    }
}

/// One supervised unit of work
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    /// Empty for sessions discovered already running
    pub working_directory: PathBuf,
    pub handle: String,
    /// Last sampled pane window, only used for change detection
    pub last_sample: String,
    pub status: SessionStatus,
    pub is_focused: bool,
    pub last_focused_at: DateTime<Local>,
}

impl Session {
    pub fn new(id: SessionId, name: &str, working_directory: PathBuf, naming: &Naming) -> Self {
        Self {
            id,
            name: name.to_string(),
            working_directory,
            handle: naming.handle_for(name),
            last_sample: String::new(),
            status: SessionStatus::default(),
            is_focused: false,
            last_focused_at: Local::now(),
        }
    }
}

/// Random `adjective-noun` name such as `swift-fox`
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("swift");
    let noun = NOUNS.choose(rng).copied().unwrap_or("fox");
    format!("{}-{}", adjective, noun)
}

/// Random name not present in `taken`.
///
/// Redraws on collision; once the draw budget is spent a numeric suffix is
/// appended so this terminates even when every combination is in use.
pub fn generate_unique_name<R: Rng + ?Sized>(rng: &mut R, taken: &HashSet<String>) -> String {
    let budget = ADJECTIVES.len() * NOUNS.len() * 4;
    for _ in 0..budget {
        let name = generate_name(rng);
        if !taken.contains(&name) {
            return name;
        }
    }

    let base = generate_name(rng);
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|name| !taken.contains(name))
        .unwrap_or(base)
}

/// Compact age of a timestamp: `now`, `5m`, `3h`, `2d`, `1w`
pub fn format_elapsed(since: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - since).num_seconds().max(0);
    match secs {
        s if s < 60 => "now".to_string(),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s if s < 604_800 => format!("{}d", s / 86_400),
        s => format!("{}w", s / 604_800),
    }
}
