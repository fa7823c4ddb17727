use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::InventoryError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage unit types, each prefixed with its emoji
pub const STORAGE_TYPES: &[&str] = &[
    "🧊 Kylskåp",
    "❄️ Frys",
    "🏪 Skafferi",
    "🗄️ Skåp",
    "📦 Övrigt",
];

/// Food categories, each prefixed with its emoji
pub const FOOD_CATEGORIES: &[&str] = &[
    "🥬 Frukt & Grönt",
    "🥩 Kött & Fisk",
    "🥛 Mejeri",
    "🥤 Drycker",
    "🧂 Kryddor & Såser",
    "🍱 Matrester",
    "🍿 Snacks",
    "🍝 Spannmål & Pasta",
    "🧊 Frysta varor",
    "📦 Övrigt",
];

pub const DEFAULT_CATEGORY: &str = "📦 Övrigt";
pub const FALLBACK_EMOJI: &str = "📦";

/// Storage units keyed by name.
pub type StorageUnits = BTreeMap<String, StorageUnit>;

/// Dismissed expiry warnings: reminder key -> timestamp of dismissal.
pub type Reminders = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUnit {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub contents: BTreeMap<String, StoredItem>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_example: bool,
}

impl StorageUnit {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            contents: BTreeMap::new(),
            is_example: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    pub quantity: u32,
    pub category: String,
    pub date_added: String,
    pub expiration_date: String,
}

impl StoredItem {
    pub fn expiration(&self) -> Result<NaiveDate, InventoryError> {
        parse_date(&self.expiration_date)
    }
}

/// Remove the leading emoji token: "🥛 Mejeri" -> "Mejeri".
///
/// Blank input comes back unchanged; a single token yields an empty string.
pub fn strip_emoji(text: &str) -> String {
    let mut tokens = text.split_whitespace();
    if tokens.next().is_none() {
        return text.to_string();
    }
    tokens.collect::<Vec<_>>().join(" ")
}

/// Emoji of the catalog category matching `category`, ignoring its emoji.
pub fn category_emoji(category: &str) -> &'static str {
    let wanted = strip_emoji(category);
    FOOD_CATEGORIES
        .iter()
        .find(|c| strip_emoji(c) == wanted)
        .and_then(|c| c.split_whitespace().next())
        .unwrap_or(FALLBACK_EMOJI)
}

/// Match user input against a catalog by full label or by label without
/// emoji, case-insensitively.
pub fn resolve_label(input: &str, catalog: &[&'static str]) -> Option<&'static str> {
    let needle = input.trim().to_lowercase();
    catalog.iter().copied().find(|label| {
        label.to_lowercase() == needle || strip_emoji(label).to_lowercase() == needle
    })
}

pub fn reminder_key(unit: &str, item: &str) -> String {
    format!("{unit}_{item}")
}

pub fn parse_date(s: &str) -> Result<NaiveDate, InventoryError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| InventoryError::InvalidDate(s.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_emoji() {
        assert_eq!(strip_emoji("🥛 Mejeri"), "Mejeri");
        assert_eq!(strip_emoji("🧂 Kryddor & Såser"), "Kryddor & Såser");
        assert_eq!(strip_emoji("  🥩   Kött   & Fisk "), "Kött & Fisk");
    }

    #[test]
    fn test_strip_emoji_edge_cases() {
        assert_eq!(strip_emoji(""), "");
        assert_eq!(strip_emoji("   "), "   ");
        assert_eq!(strip_emoji("Mejeri"), "");
    }

    #[test]
    fn test_category_emoji() {
        assert_eq!(category_emoji("🥛 Mejeri"), "🥛");
        // Original sample data stores cheese with a non-catalog emoji
        assert_eq!(category_emoji("🧀 Mejeri"), "🥛");
        assert_eq!(category_emoji("🍕 Pizza"), FALLBACK_EMOJI);
    }

    #[test]
    fn test_resolve_label() {
        assert_eq!(resolve_label("mejeri", FOOD_CATEGORIES), Some("🥛 Mejeri"));
        assert_eq!(resolve_label("🥛 Mejeri", FOOD_CATEGORIES), Some("🥛 Mejeri"));
        assert_eq!(resolve_label("FRYS", STORAGE_TYPES), Some("❄️ Frys"));
        assert_eq!(resolve_label("garage", STORAGE_TYPES), None);
    }

    #[test]
    fn test_unit_serialization_shape() {
        let mut unit = StorageUnit::new("🧊 Kylskåp");
        unit.contents.insert(
            "Mjölk".to_string(),
            StoredItem {
                quantity: 1,
                category: "🥛 Mejeri".to_string(),
                date_added: "2024-03-20".to_string(),
                expiration_date: "2024-03-27".to_string(),
            },
        );
        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["type"], "🧊 Kylskåp");
        assert_eq!(json["contents"]["Mjölk"]["quantity"], 1);
        assert!(json.get("is_example").is_none());
    }

    #[test]
    fn test_unit_without_contents_deserializes() {
        let unit: StorageUnit = serde_json::from_str(r#"{"type": "❄️ Frys"}"#).unwrap();
        assert!(unit.contents.is_empty());
        assert!(!unit.is_example);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-27").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 27).unwrap()
        );
        assert!(matches!(
            parse_date("27/03/2024"),
            Err(InventoryError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_reminder_key() {
        assert_eq!(reminder_key("Kökskylskåp", "Mjölk"), "Kökskylskåp_Mjölk");
    }
}
