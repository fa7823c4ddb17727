use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::Preferences;
use crate::expiry::{check_expiring_items, ExpiryNotice};
use crate::history::{Action, HistoryEntry};
use crate::model::{format_timestamp, Reminders, StorageUnits};

const SIGNATURE: &str = "Med vänliga hälsningar,\nDin Matförvaringsapp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StatusReport,
    ItemAdded,
    ItemRemoved,
    UserCreated,
    UserDeleted,
    PasswordChanged,
    Test,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChange {
    Created,
    Deleted,
    PasswordChanged,
}

/// Low-stock line: any stored item at or below the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LowStock {
    item: String,
    unit: String,
    quantity: u32,
    exp_date: String,
}

/// The scheduled status report, or `None` when the preferences leave
/// nothing to say.
pub fn status_report(
    units: &StorageUnits,
    reminders: &Reminders,
    prefs: &Preferences,
    recipient: Option<&str>,
    now: NaiveDateTime,
) -> Option<Notification> {
    let today: NaiveDate = now.date();
    let report = check_expiring_items(units, reminders, today, prefs.expiring_soon_days);

    let expired: &[ExpiryNotice] = if prefs.notify_expired { &report.expired } else { &[] };
    let expiring: &[ExpiryNotice] = if prefs.notify_expiring_soon { &report.expiring } else { &[] };
    let low_stock: Vec<LowStock> = if prefs.notify_low_quantity {
        units
            .iter()
            .flat_map(|(unit_name, unit)| {
                unit.contents.iter().map(move |(item, details)| (unit_name, item, details))
            })
            .filter(|(_, _, details)| details.quantity <= prefs.low_quantity_threshold)
            .map(|(unit, item, details)| LowStock {
                item: item.clone(),
                unit: unit.clone(),
                quantity: details.quantity,
                exp_date: details.expiration_date.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    if expired.is_empty() && expiring.is_empty() && low_stock.is_empty() {
        return None;
    }

    let mut body = String::from("Matförvaring - Statusrapport\n");
    if !expired.is_empty() {
        body.push_str("\n🚨 Utgångna varor:\n");
        for n in expired {
            body.push_str(&format!(
                "- {}\n    Utgången sedan: {} dagar\n    Finns i: {}\n    Utgångsdatum: {}\n    Antal: {}\n",
                n.item, n.days, n.unit, n.exp_date, n.quantity
            ));
        }
    }
    if !expiring.is_empty() {
        body.push_str("\n⚠️ Varor som snart går ut:\n");
        for n in expiring {
            body.push_str(&format!(
                "- {}\n    Går ut om: {} dagar\n    Finns i: {}\n    Utgångsdatum: {}\n    Antal: {}\n",
                n.item, n.days, n.unit, n.exp_date, n.quantity
            ));
        }
    }
    if !low_stock.is_empty() {
        body.push_str(&format!(
            "\n📉 Varor med lågt antal (högst {}):\n",
            prefs.low_quantity_threshold
        ));
        for l in &low_stock {
            body.push_str(&format!(
                "- {}\n    Antal: {}\n    Finns i: {}\n    Utgångsdatum: {}\n",
                l.item, l.quantity, l.unit, l.exp_date
            ));
        }
    }
    body.push('\n');
    body.push_str(SIGNATURE);

    Some(Notification {
        kind: NotificationKind::StatusReport,
        subject: "Matförvaring - Status".to_string(),
        body,
        recipient: recipient.map(String::from),
        timestamp: format_timestamp(now),
    })
}

pub fn item_notice(entry: &HistoryEntry, recipient: Option<&str>) -> Notification {
    let (kind, emoji, text) = match entry.action {
        Action::Added => (NotificationKind::ItemAdded, "➕", "tillagd"),
        Action::Removed => (NotificationKind::ItemRemoved, "➖", "borttagen"),
    };
    let expiration = entry
        .expiration_date
        .as_deref()
        .unwrap_or("Inget angivet");
    let body = format!(
        "{emoji} Vara {text}\n\
         Vara: {}\n\
         Kategori: {}\n\
         Antal: {}\n\
         Förvaringsplats: {}\n\
         Utgångsdatum: {}\n\
         Användare: {}\n\
         Tidpunkt: {}\n\n{SIGNATURE}",
        entry.item,
        entry.category,
        entry.quantity,
        entry.storage_unit,
        expiration,
        entry.username,
        entry.timestamp,
    );
    Notification {
        kind,
        subject: format!("Matförvaring - Vara {}", entry.action),
        body,
        recipient: recipient.map(String::from),
        timestamp: entry.timestamp.clone(),
    }
}

pub fn user_notice(
    change: UserChange,
    username: &str,
    performed_by: Option<&str>,
    recipient: Option<&str>,
    now: NaiveDateTime,
) -> Notification {
    let (kind, title, mut details) = match change {
        UserChange::Created => (
            NotificationKind::UserCreated,
            "Ny användare skapad",
            format!("En ny användare '{username}' har skapats"),
        ),
        UserChange::Deleted => (
            NotificationKind::UserDeleted,
            "Användare borttagen",
            format!("Användaren '{username}' har tagits bort"),
        ),
        UserChange::PasswordChanged => (
            NotificationKind::PasswordChanged,
            "Lösenord ändrat",
            format!("Lösenordet har ändrats för användaren '{username}'"),
        ),
    };
    if let Some(by) = performed_by {
        details.push_str(&format!(" av {by}"));
    }
    let timestamp = format_timestamp(now);
    Notification {
        kind,
        subject: "Matförvaring - Användarhantering".to_string(),
        body: format!("Matförvaring - {title}\n{details}\nTidpunkt: {timestamp}\n\n{SIGNATURE}"),
        recipient: recipient.map(String::from),
        timestamp,
    }
}

/// Short notice confirming that the configured channels deliver.
pub fn test_notice(recipient: Option<&str>, now: NaiveDateTime) -> Notification {
    let timestamp = format_timestamp(now);
    Notification {
        kind: NotificationKind::Test,
        subject: "Matförvaring - Testmeddelande".to_string(),
        body: format!(
            "Detta är ett testmeddelande från Matförvaringsappen.\n\
             Aviseringarna fungerar.\n\
             Tidpunkt: {timestamp}\n\n{SIGNATURE}"
        ),
        recipient: recipient.map(String::from),
        timestamp,
    }
}
