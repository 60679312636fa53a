//! Per-user state directory resolution.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the completion endpoint.
pub const BASE_URL_ENV: &str = "BANTER_BASE_URL";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Filesystem locations for persistent state.
#[derive(Debug, Clone)]
pub struct StatePaths {
    /// `~/.banter`, created on first use.
    pub state_dir: PathBuf,
    /// The conversation database inside the state directory.
    pub db_path: PathBuf,
}

impl StatePaths {
    /// Resolve the state directory under the user's home and create it if
    /// absent.
    pub fn resolve() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Self::under(home)
    }

    fn under(home: PathBuf) -> Result<Self> {
        let state_dir = home.join(".banter");
        fs::create_dir_all(&state_dir)
            .with_context(|| format!("creating state directory {}", state_dir.display()))?;
        let db_path = state_dir.join("chats.db");
        Ok(Self { state_dir, db_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolves_and_creates_state_dir() {
        let tmp = TempDir::new().unwrap();
        let paths = StatePaths::under(tmp.path().to_path_buf()).unwrap();
        assert!(paths.state_dir.is_dir());
        assert!(paths.db_path.ends_with(".banter/chats.db"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        StatePaths::under(tmp.path().to_path_buf()).unwrap();
        let again = StatePaths::under(tmp.path().to_path_buf()).unwrap();
        assert!(again.state_dir.is_dir());
    }
}
