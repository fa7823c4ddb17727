use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{parse_timestamp, strip_emoji};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Added,
    Removed,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Added => write!(f, "added"),
            Action::Removed => write!(f, "removed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub action: Action,
    pub item: String,
    /// Category without its emoji
    pub category: String,
    pub quantity: u32,
    pub storage_unit: String,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub is_example: bool,
    #[serde(default = "unknown_user")]
    pub username: String,
}

fn unknown_user() -> String {
    "Okänd".to_string()
}

impl HistoryEntry {
    pub fn time(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Criteria for narrowing the history. Empty filter keeps everything.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub days: Option<i64>,
    pub category: Option<String>,
    pub action: Option<Action>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &HistoryEntry, now: NaiveDateTime) -> bool {
        if let Some(days) = self.days {
            // A window reaching past the calendar's start has no cutoff.
            let cutoff = Duration::try_days(days).and_then(|d| now.checked_sub_signed(d));
            match (entry.time(), cutoff) {
                (Some(ts), Some(cutoff)) if ts > cutoff => {}
                (Some(_), None) => {}
                _ => return false,
            }
        }
        if let Some(category) = &self.category {
            if entry.category != strip_emoji(category) && entry.category != *category {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, history: &'a [HistoryEntry], now: NaiveDateTime) -> Vec<&'a HistoryEntry> {
        history.iter().filter(|e| self.matches(e, now)).collect()
    }
}
