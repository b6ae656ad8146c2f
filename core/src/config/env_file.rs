//! Minimal `.env` file reader
//!
//! Values are never written into the process environment; callers merge the
//! parsed entries with `std::env` themselves.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// Parsed `KEY=VALUE` entries from an env file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: BTreeMap<String, String>,
}

impl EnvFile {
    /// Parse env file contents
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let key = key.trim();
            if key.is_empty() {
                continue;
            }

            entries.insert(key.to_string(), unquote(value.trim()).to_string());
        }

        Self { entries }
    }

    /// Load an env file; a missing file yields no entries
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Env file {} not found, skipping", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let env = Self::parse(&content);
        tracing::debug!("Loaded {} entries from {}", env.len(), path.display());
        Ok(env)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
