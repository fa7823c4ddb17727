use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{format_date, reminder_key, Reminders, StorageUnits};

/// An item that has expired or is about to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryNotice {
    pub item: String,
    pub unit: String,
    /// Days since expiry for expired items, days left otherwise
    pub days: i64,
    pub exp_date: String,
    pub category: String,
    pub quantity: u32,
    /// Reminder key, present on expiring-soon notices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpiryReport {
    pub expired: Vec<ExpiryNotice>,
    pub expiring: Vec<ExpiryNotice>,
}

impl ExpiryReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.expiring.is_empty()
    }
}

/// Sort stored items into expired and expiring within `window` days.
///
/// Expiring items whose warning was dismissed are left out; expired items
/// are always reported. Items with an unreadable date are skipped.
pub fn check_expiring_items(
    units: &StorageUnits,
    reminders: &Reminders,
    today: NaiveDate,
    window: i64,
) -> ExpiryReport {
    let mut report = ExpiryReport::default();

    for (unit_name, unit) in units {
        for (item_name, details) in &unit.contents {
            let expiration = match details.expiration() {
                Ok(date) => date,
                Err(_) => {
                    log::warn!(
                        "Invalid date format for {} in {}: {:?}",
                        item_name,
                        unit_name,
                        details.expiration_date
                    );
                    continue;
                }
            };
            let days_remaining = (expiration - today).num_days();

            if days_remaining < 0 {
                report.expired.push(ExpiryNotice {
                    item: item_name.clone(),
                    unit: unit_name.clone(),
                    days: days_remaining.abs(),
                    exp_date: format_date(expiration),
                    category: details.category.clone(),
                    quantity: details.quantity,
                    key: None,
                });
            } else if days_remaining <= window {
                let key = reminder_key(unit_name, item_name);
                if reminders.contains_key(&key) {
                    continue;
                }
                report.expiring.push(ExpiryNotice {
                    item: item_name.clone(),
                    unit: unit_name.clone(),
                    days: days_remaining,
                    exp_date: format_date(expiration),
                    category: details.category.clone(),
                    quantity: details.quantity,
                    key: Some(key),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StorageUnit, StoredItem};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    fn item(expiration: &str) -> StoredItem {
        StoredItem {
            quantity: 1,
            category: "🥛 Mejeri".to_string(),
            date_added: "2024-03-01".to_string(),
            expiration_date: expiration.to_string(),
        }
    }

    fn units() -> StorageUnits {
        let mut unit = StorageUnit::new("🧊 Kylskåp");
        unit.contents.insert("Mjölk".into(), item("2024-03-18"));
        unit.contents.insert("Ost".into(), item("2024-03-20"));
        unit.contents.insert("Smör".into(), item("2024-03-27"));
        unit.contents.insert("Sylt".into(), item("2024-03-28"));
        unit.contents.insert("Grädde".into(), item("20/03/2024"));
        let mut units = StorageUnits::new();
        units.insert("Kyl".to_string(), unit);
        units
    }

    #[test]
    fn test_expired_and_expiring_split() {
        let report = check_expiring_items(&units(), &Reminders::new(), today(), 7);

        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.expired[0].item, "Mjölk");
        assert_eq!(report.expired[0].days, 2);
        assert!(report.expired[0].key.is_none());

        let expiring: Vec<_> = report.expiring.iter().map(|n| (n.item.as_str(), n.days)).collect();
        assert_eq!(expiring, vec![("Ost", 0), ("Smör", 7)]);
        assert_eq!(report.expiring[0].key.as_deref(), Some("Kyl_Ost"));
    }

    #[test]
    fn test_dismissed_reminder_hides_expiring_only() {
        let mut reminders = Reminders::new();
        reminders.insert("Kyl_Ost".to_string(), "2024-03-20 08:00:00".to_string());
        reminders.insert("Kyl_Mjölk".to_string(), "2024-03-20 08:00:00".to_string());

        let report = check_expiring_items(&units(), &reminders, today(), 7);
        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.expiring.len(), 1);
        assert_eq!(report.expiring[0].item, "Smör");
    }

    #[test]
    fn test_window_is_configurable() {
        let report = check_expiring_items(&units(), &Reminders::new(), today(), 8);
        assert_eq!(report.expiring.len(), 3);
    }

    #[test]
    fn test_empty_units() {
        let report = check_expiring_items(&StorageUnits::new(), &Reminders::new(), today(), 7);
        assert!(report.is_empty());
    }
}
