//! JSON File Store
//!
//! One pretty-printed JSON object per calendar day, address -> symbol,
//! written to `introduced_tokens_{YYYY_MM_DD}.json` under the output
//! directory. Each save writes a temporary file next to the record and
//! renames it over the old one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tempfile::NamedTempFile;

use crate::domain::{day_key, TokenMap};
use crate::ports::{StoreError, TokenStore};

/// Default output directory for daily token files
pub const DEFAULT_OUTPUT_DIR: &str = "files/screener";

const FILE_PREFIX: &str = "introduced_tokens_";

/// File name of the record for a day
pub fn day_file_name(day: NaiveDate) -> String {
    format!("{}{}.json", FILE_PREFIX, day_key(day))
}

/// Token store backed by daily JSON files
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    output_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the record for a day
    pub fn day_path(&self, day: NaiveDate) -> PathBuf {
        self.output_dir.join(day_file_name(day))
    }
}

impl TokenStore for JsonFileStore {
    fn load_all(&self, day: NaiveDate) -> Result<TokenMap, StoreError> {
        let path = self.day_path(day);
        if !path.exists() {
            return Ok(TokenMap::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| StoreError::ReadError(e.to_string()))?;

        if content.trim().is_empty() {
            return Ok(TokenMap::new());
        }

        let tokens: TokenMap = serde_json::from_str(&content)
            .map_err(|e| StoreError::DeserializationError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Loaded {} tokens from {}", tokens.len(), path.display());
        Ok(tokens)
    }

    fn save_all(&self, day: NaiveDate, tokens: &TokenMap) -> Result<(), StoreError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| StoreError::DirectoryError(e.to_string()))?;

        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let path = self.day_path(day);
        let mut tmp = NamedTempFile::new_in(&self.output_dir)
            .map_err(|e| StoreError::WriteError(e.to_string()))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::WriteError(e.to_string()))?;
        tmp.persist(&path)
            .map_err(|e| StoreError::WriteError(format!("{}: {}", path.display(), e.error)))?;

        tracing::debug!("Saved {} tokens to {}", tokens.len(), path.display());
        Ok(())
    }

    fn quarantine(&self, day: NaiveDate) -> Result<String, StoreError> {
        let path = self.day_path(day);
        let target = self.output_dir.join(format!(
            "{}.corrupt-{}",
            day_file_name(day),
            Local::now().format("%Y%m%dT%H%M%S%.3f")
        ));

        fs::rename(&path, &target).map_err(|e| {
            StoreError::WriteError(format!("moving {} aside: {}", path.display(), e))
        })?;

        tracing::warn!("Moved unreadable {} to {}", path.display(), target.display());
        Ok(target.display().to_string())
    }
}
