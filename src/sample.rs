//! Demo content for trying the tool out. Everything created here carries
//! `is_example` so `admin clear examples` can take it away again.

use chrono::{Duration, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{InventoryError, Result};
use crate::history::Action;
use crate::inventory::{history_entry, HistoryRecord, Inventory};
use crate::model::{format_date, StorageUnit, StoredItem};

const SAMPLE_UNITS: &[(&str, &str)] = &[
    ("Kökskylskåp", "🧊 Kylskåp"),
    ("Köllarfrys", "❄️ Frys"),
    ("Skafferi", "🏪 Skafferi"),
    ("Kryddskåp", "🗄️ Skåp"),
];

const SAMPLE_ITEMS: &[(&str, &str)] = &[
    ("Mjölk", "🥛 Mejeri"),
    ("Ägg", "🥛 Mejeri"),
    ("Ost", "🥛 Mejeri"),
    ("Köttfärs", "🥩 Kött & Fisk"),
    ("Lax", "🥩 Kött & Fisk"),
    ("Kyckling", "🥩 Kött & Fisk"),
    ("Äpplen", "🥬 Frukt & Grönt"),
    ("Tomater", "🥬 Frukt & Grönt"),
    ("Sallad", "🥬 Frukt & Grönt"),
    ("Bröd", "🍝 Spannmål & Pasta"),
    ("Pasta", "🍝 Spannmål & Pasta"),
    ("Ris", "🍝 Spannmål & Pasta"),
    ("Juice", "🥤 Drycker"),
    ("Läsk", "🥤 Drycker"),
    ("Ketchup", "🧂 Kryddor & Såser"),
    ("Senap", "🧂 Kryddor & Såser"),
    ("Glass", "🧊 Frysta varor"),
    ("Frysta ärtor", "🧊 Frysta varor"),
    ("Chips", "🍿 Snacks"),
    ("Nötter", "🍿 Snacks"),
    ("Lasagne", "🍱 Matrester"),
];

const EXTRA_HISTORY_PAIRS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub units: Vec<String>,
    pub items: usize,
    pub history_entries: usize,
}

/// `Kylskåp 2` counts as an existing `Kylskåp`.
fn base_name(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit() || c == ' ')
}

fn pick<'a, R: Rng>(rng: &mut R, items: &'a [(&'a str, &'a str)]) -> (&'a str, &'a str) {
    // Both catalogs are non-empty constants.
    *items.choose(rng).unwrap_or(&items[0])
}

fn random_past(rng: &mut impl Rng, now: NaiveDateTime) -> NaiveDateTime {
    now - Duration::days(rng.gen_range(0..30))
}

/// Add the sample units missing from the inventory, fill them with random
/// items and a month of history, then save once.
pub fn populate<R: Rng>(
    inventory: &mut Inventory,
    rng: &mut R,
    actor: &str,
    now: NaiveDateTime,
) -> Result<SampleSummary> {
    let existing: Vec<&str> = inventory.units().keys().map(|n| base_name(n)).collect();
    let new_units: Vec<(&str, &str)> = SAMPLE_UNITS
        .iter()
        .filter(|(name, _)| !existing.contains(name))
        .copied()
        .collect();
    if new_units.is_empty() {
        return Err(InventoryError::AllSampleUnitsExist.into());
    }

    let today = now.date();
    let mut summary = SampleSummary::default();

    for &(unit_name, kind) in &new_units {
        let mut unit = StorageUnit::new(kind);
        unit.is_example = true;
        inventory.insert_unit_unsaved(unit_name.to_string(), unit);
        summary.units.push(unit_name.to_string());

        for _ in 0..rng.gen_range(3..=8) {
            let (item, category) = pick(rng, SAMPLE_ITEMS);
            let added_at = random_past(rng, now);
            let shelf_life = if rng.gen_bool(0.3) {
                rng.gen_range(3..=10)
            } else {
                rng.gen_range(7..=30)
            };
            let expiration = added_at.date() + Duration::days(shelf_life);
            let quantity = rng.gen_range(1..=5);

            if let Some(unit) = inventory.unit_mut_unsaved(unit_name) {
                unit.contents.insert(
                    item.to_string(),
                    StoredItem {
                        quantity,
                        category: category.to_string(),
                        date_added: format_date(added_at.date()),
                        expiration_date: format_date(expiration),
                    },
                );
            }
            summary.items += 1;

            inventory.record_unsaved(history_entry(HistoryRecord {
                action: Action::Added,
                item,
                category,
                quantity,
                storage_unit: unit_name,
                expired: false,
                expiration_date: Some(format_date(expiration)),
                is_example: true,
                username: actor,
                timestamp: added_at,
            }));
            summary.history_entries += 1;

            if expiration < today {
                inventory.record_unsaved(history_entry(HistoryRecord {
                    action: Action::Removed,
                    item,
                    category,
                    quantity: rng.gen_range(1..=quantity),
                    storage_unit: unit_name,
                    expired: true,
                    expiration_date: Some(format_date(expiration)),
                    is_example: true,
                    username: actor,
                    timestamp: added_at + Duration::days(rng.gen_range(1..=5)),
                }));
                summary.history_entries += 1;
            }
        }
    }

    for _ in 0..EXTRA_HISTORY_PAIRS {
        let (item, category) = pick(rng, SAMPLE_ITEMS);
        let (unit_name, _) = pick(rng, &new_units);
        let added_at = random_past(rng, now);
        let expiration = added_at.date() + Duration::days(rng.gen_range(5..=15));
        let removed_on = expiration + Duration::days(rng.gen_range(1..=5));
        let quantity = rng.gen_range(1..=5);

        for (action, expired, timestamp) in [
            (Action::Added, false, added_at),
            (Action::Removed, true, removed_on.and_time(chrono::NaiveTime::MIN)),
        ] {
            inventory.record_unsaved(history_entry(HistoryRecord {
                action,
                item,
                category,
                quantity,
                storage_unit: unit_name,
                expired,
                expiration_date: Some(format_date(expiration)),
                is_example: true,
                username: actor,
                timestamp,
            }));
            summary.history_entries += 1;
        }
    }

    inventory.save()?;
    log::info!(
        "Added sample data: {} units, {} items, {} history entries",
        summary.units.len(),
        summary.items,
        summary.history_entries
    );
    Ok(summary)
}
