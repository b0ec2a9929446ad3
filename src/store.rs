use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

/// Persisted wallet → last-seen transaction id map.
///
/// The backing file is rewritten whole after every change. A missing or
/// corrupt file resets to an empty map on load, which costs one baseline
/// cycle per wallet and nothing else.
#[derive(Debug)]
pub struct CursorStore {
    path: PathBuf,
    cursors: HashMap<String, String>,
}

impl CursorStore {
    /// Load the store from `path`, falling back to empty on any problem.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cursors = match std::fs::read_to_string(&path) {
            Ok(contents) => parse_cursors(&contents).unwrap_or_else(|e| {
                warn!(
                    "Cursor store {} is corrupt ({e}), starting from empty",
                    path.display()
                );
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, cursors }
    }

    pub fn get(&self, wallet: &str) -> Option<&str> {
        self.cursors.get(wallet).map(String::as_str)
    }

    /// Record a new cursor for `wallet` and rewrite the backing file.
    pub fn set(&mut self, wallet: &str, tx_id: &str) -> Result<()> {
        self.cursors
            .insert(wallet.to_string(), tx_id.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.cursors)
            .context("failed to serialize cursor store")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

fn parse_cursors(contents: &str) -> serde_json::Result<HashMap<String, String>> {
    serde_json::from_str(contents)
}
