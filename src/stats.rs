//! Usage and expiry statistics over the history and current stock.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::history::{Action, HistoryEntry};
use crate::model::{strip_emoji, StorageUnits};

const TOP_N: usize = 10;
const NEAR_EXPIRY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week,
    Month,
    Year,
    All,
}

impl Period {
    pub fn days(self) -> Option<i64> {
        match self {
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::Year => Some(365),
            Period::All => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: String,
    pub days: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockExpiry {
    pub item: String,
    pub category: String,
    pub days_until_expiry: i64,
    pub storage_unit: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityStats {
    pub category_counts: Vec<Count>,
    pub most_added: Vec<Count>,
    /// Removed before expiring
    pub most_used: Vec<Count>,
    pub most_expired: Vec<Count>,
    /// Events per date, oldest first
    pub daily_activity: Vec<Count>,
    pub total_added: usize,
    pub used: usize,
    pub expired_removals: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpiryStats {
    pub near_expiry: Vec<StockExpiry>,
    pub expired_by_category: Vec<Count>,
    pub avg_shelf_life: Vec<CategoryAverage>,
    pub currently_expired: usize,
    pub expiring_within_week: usize,
    pub avg_days_to_expiry: i64,
    pub has_stock: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub period: Period,
    pub entries: usize,
    pub activity: ActivityStats,
    pub expiry: ExpiryStats,
}

/// Build statistics for `period`, or `None` when there is no history.
pub fn generate_statistics(
    history: &[HistoryEntry],
    units: &StorageUnits,
    period: Period,
    now: NaiveDateTime,
) -> Option<Statistics> {
    if history.is_empty() {
        return None;
    }

    let entries: Vec<&HistoryEntry> = match period.days() {
        Some(days) => {
            let cutoff = now - Duration::days(days);
            history
                .iter()
                .filter(|e| e.time().is_some_and(|ts| ts > cutoff))
                .collect()
        }
        None => history.iter().collect(),
    };

    Some(Statistics {
        period,
        entries: entries.len(),
        activity: activity_stats(&entries),
        expiry: expiry_stats(units, now.date()),
    })
}

fn activity_stats(entries: &[&HistoryEntry]) -> ActivityStats {
    let is_used = |e: &&&HistoryEntry| e.action == Action::Removed && !e.expired;
    let is_expired = |e: &&&HistoryEntry| e.action == Action::Removed && e.expired;
    let is_added = |e: &&&HistoryEntry| e.action == Action::Added;

    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for entry in entries {
        if let Some(ts) = entry.time() {
            *daily.entry(ts.date()).or_default() += 1;
        }
    }

    ActivityStats {
        category_counts: value_counts(entries.iter().map(|e| e.category.as_str()), usize::MAX),
        most_added: value_counts(entries.iter().filter(is_added).map(|e| e.item.as_str()), TOP_N),
        most_used: value_counts(entries.iter().filter(is_used).map(|e| e.item.as_str()), TOP_N),
        most_expired: value_counts(entries.iter().filter(is_expired).map(|e| e.item.as_str()), TOP_N),
        daily_activity: daily
            .into_iter()
            .map(|(date, count)| Count {
                name: date.format("%Y-%m-%d").to_string(),
                count,
            })
            .collect(),
        total_added: entries.iter().filter(is_added).count(),
        used: entries.iter().filter(is_used).count(),
        expired_removals: entries.iter().filter(is_expired).count(),
    }
}

fn expiry_stats(units: &StorageUnits, today: NaiveDate) -> ExpiryStats {
    let mut stock = Vec::new();
    for (unit_name, unit) in units {
        for (item_name, details) in &unit.contents {
            let Ok(expiration) = details.expiration() else {
                log::debug!("Skipping {} in {}: unreadable expiration date", item_name, unit_name);
                continue;
            };
            stock.push(StockExpiry {
                item: item_name.clone(),
                category: strip_emoji(&details.category),
                days_until_expiry: (expiration - today).num_days(),
                storage_unit: unit_name.clone(),
                quantity: details.quantity,
            });
        }
    }

    if stock.is_empty() {
        return ExpiryStats::default();
    }

    let mut near_expiry: Vec<StockExpiry> = stock
        .iter()
        .filter(|s| s.days_until_expiry > 0)
        .cloned()
        .collect();
    near_expiry.sort_by(|a, b| {
        a.days_until_expiry
            .cmp(&b.days_until_expiry)
            .then_with(|| a.item.cmp(&b.item))
    });
    near_expiry.truncate(TOP_N);

    let mut expired_by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for s in stock.iter().filter(|s| s.days_until_expiry < 0) {
        *expired_by_category.entry(s.category.as_str()).or_default() += 1;
    }

    let mut per_category: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
    for s in &stock {
        let slot = per_category.entry(s.category.as_str()).or_default();
        slot.0 += s.days_until_expiry;
        slot.1 += 1;
    }
    let mut avg_shelf_life: Vec<CategoryAverage> = per_category
        .into_iter()
        .map(|(category, (sum, n))| CategoryAverage {
            category: category.to_string(),
            days: sum as f64 / n as f64,
        })
        .collect();
    avg_shelf_life.sort_by(|a, b| a.days.total_cmp(&b.days));

    let positive: Vec<i64> = stock
        .iter()
        .map(|s| s.days_until_expiry)
        .filter(|d| *d > 0)
        .collect();
    let avg_days_to_expiry = if positive.is_empty() {
        0
    } else {
        positive.iter().sum::<i64>() / positive.len() as i64
    };

    ExpiryStats {
        currently_expired: stock.iter().filter(|s| s.days_until_expiry < 0).count(),
        expiring_within_week: stock
            .iter()
            .filter(|s| (0..=NEAR_EXPIRY_DAYS).contains(&s.days_until_expiry))
            .count(),
        near_expiry,
        expired_by_category: expired_by_category
            .into_iter()
            .map(|(name, count)| Count {
                name: name.to_string(),
                count,
            })
            .collect(),
        avg_shelf_life,
        avg_days_to_expiry,
        has_stock: true,
    }
}

/// Occurrences per value, most frequent first, ties by name.
fn value_counts<'a>(values: impl Iterator<Item = &'a str>, limit: usize) -> Vec<Count> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut counts: Vec<Count> = counts
        .into_iter()
        .map(|(name, count)| Count {
            name: name.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts.truncate(limit);
    counts
}
