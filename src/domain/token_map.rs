//! Token Map
//!
//! The daily identifier -> symbol record and the helpers that shape its
//! contents: symbol sanitizing and the calendar day a record belongs to.

use std::collections::BTreeMap;

use chrono::{FixedOffset, Local, NaiveDate, Utc};

/// Identifier -> display symbol, append-only within a calendar day
pub type TokenMap = BTreeMap<String, String>;

/// Symbol recorded when the API response carries none
pub const BAD_SYMBOL: &str = "BAD_SYMBOL";

/// Characters that are unsafe in file names
const UNSAFE_SYMBOL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace file-system unsafe characters in a symbol with `_`
pub fn sanitize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if UNSAFE_SYMBOL_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Format a day the way daily files are keyed: `YYYY_MM_DD`
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y_%m_%d").to_string()
}

/// Source of the current calendar day
///
/// Daily files roll over at local midnight, or at midnight of a fixed UTC
/// offset when one is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayClock {
    #[default]
    Local,
    Offset(FixedOffset),
}

impl DayClock {
    /// Build a clock from an optional offset in minutes east of UTC
    ///
    /// Returns `None` when the offset is out of range.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Option<Self> {
        match minutes {
            None => Some(DayClock::Local),
            Some(m) => m
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .map(DayClock::Offset),
        }
    }

    /// Current calendar day according to this clock
    pub fn today(&self) -> NaiveDate {
        match self {
            DayClock::Local => Local::now().date_naive(),
            DayClock::Offset(offset) => Utc::now().with_timezone(offset).date_naive(),
        }
    }
}
