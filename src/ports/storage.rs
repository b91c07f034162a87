use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::TokenMap;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Failed to serialize token map: {0}")]
    SerializationError(String),

    #[error("Failed to deserialize token map: {0}")]
    DeserializationError(String),

    #[error("Failed to write token file: {0}")]
    WriteError(String),

    #[error("Failed to read token file: {0}")]
    ReadError(String),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),
}

/// Key-value persistence for the daily token record
///
/// Whole-map load and save; backends only need to address a record by day.
pub trait TokenStore: Send + Sync {
    /// Load the record for a day, empty when none exists
    fn load_all(&self, day: NaiveDate) -> Result<TokenMap, StoreError>;

    /// Replace the record for a day
    fn save_all(&self, day: NaiveDate, tokens: &TokenMap) -> Result<(), StoreError>;

    /// Move an unreadable record out of the way so the day can start over
    ///
    /// Returns where the old record was kept.
    fn quarantine(&self, day: NaiveDate) -> Result<String, StoreError>;
}
