use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Previously used working directories, most recent first, one per line
#[derive(Debug, Clone)]
pub struct PathHistory {
    file: PathBuf,
}

impl PathHistory {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// Stored paths; a missing or unreadable file is an empty history
    pub fn load(&self) -> Vec<String> {
        match fs::read_to_string(&self.file) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Insert `path` at the front unless an entry resolves to the same directory
    pub fn save(&self, path: &str) -> Result<()> {
        let mut existing = self.load();
        let resolved = resolve_directory(path);
        if existing.iter().any(|p| resolve_directory(p) == resolved) {
            return Ok(());
        }

        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        existing.insert(0, path.to_string());
        self.write(&existing)
    }

    /// Remove `path`; the file goes away with its last entry
    pub fn delete(&self, path: &str) -> Result<()> {
        let mut existing = self.load();
        let Some(index) = existing.iter().position(|p| p == path) else {
            return Ok(());
        };
        existing.remove(index);

        if existing.is_empty() {
            match fs::remove_file(&self.file) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => {
                    Err(e).with_context(|| format!("Failed to remove {}", self.file.display()))
                }
            }
        } else {
            self.write(&existing)
        }
    }

    fn write(&self, paths: &[String]) -> Result<()> {
        let mut content = paths.join("\n");
        content.push('\n');
        fs::write(&self.file, content)
            .with_context(|| format!("Failed to write {}", self.file.display()))
    }
}

/// Absolute form of a user-typed directory.
///
/// Blank means home, a leading `~` is expanded, relative paths are joined to
/// the current directory and existing paths are canonicalized.
pub fn resolve_directory(raw: &str) -> PathBuf {
    let raw = raw.trim();
    let home = dirs::home_dir().unwrap_or_default();

    let expanded = if raw.is_empty() || raw == "~" {
        home
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(raw)
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir().unwrap_or_default().join(expanded)
    };

    absolute.canonicalize().unwrap_or(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_in(dir: &tempfile::TempDir) -> PathHistory {
        PathHistory::new(dir.path().join("nested").join("paths.txt"))
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(history_in(&dir).load().is_empty());
    }

    #[test]
    fn test_save_most_recent_first_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let history = history_in(&dir);
        let a = dir.path().to_string_lossy().to_string();
        let b = std::env::temp_dir().to_string_lossy().to_string();

        history.save(&a).unwrap();
        history.save(&b).unwrap();
        // Same directory spelled differently
        history.save(&format!("{}/.", a)).unwrap();

        assert_eq!(history.load(), vec![b, a]);
    }

    #[test]
    fn test_delete_removes_file_with_last_entry() {
        let dir = tempfile::tempdir().unwrap();
        let history = history_in(&dir);
        history.save("/srv/one").unwrap();
        history.save("/srv/two").unwrap();

        history.delete("/srv/one").unwrap();
        assert_eq!(history.load(), vec!["/srv/two".to_string()]);

        history.delete("/srv/missing").unwrap();
        history.delete("/srv/two").unwrap();
        assert!(!dir.path().join("nested").join("paths.txt").exists());
    }

    #[test]
    fn test_resolve_directory() {
        let home = dirs::home_dir().unwrap_or_default();
        let home = home.canonicalize().unwrap_or(home);
        assert_eq!(resolve_directory(""), home);
        assert_eq!(resolve_directory("~"), home);
        assert_eq!(
            resolve_directory("/definitely/not/here"),
            PathBuf::from("/definitely/not/here")
        );
        assert!(resolve_directory("relative/dir").is_absolute());
    }
}
