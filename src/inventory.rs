use chrono::NaiveDateTime;
use std::collections::BTreeSet;

use crate::error::{InventoryError, Result};
use crate::history::{Action, HistoryEntry};
use crate::model::{
    format_date, format_timestamp, parse_date, reminder_key, strip_emoji, Reminders,
    StorageUnit, StorageUnits, StoredItem,
};
use crate::store::{Snapshot, Store};

/// What `clear` wipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    Storage,
    Reminders,
    History,
    /// Only units and history entries flagged as sample data
    Examples,
    All,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub unit: String,
    pub name: String,
    pub quantity: u32,
    pub category: String,
    pub expiration: chrono::NaiveDate,
}

/// Storage units, history and dismissed reminders, persisted after every
/// mutation.
pub struct Inventory {
    store: Store,
    data: Snapshot,
}

impl Inventory {
    pub fn open(store: Store) -> Result<Self> {
        let data = store.load()?;
        Ok(Self { store, data })
    }

    pub fn units(&self) -> &StorageUnits {
        &self.data.units
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.data.history
    }

    pub fn reminders(&self) -> &Reminders {
        &self.data.reminders
    }

    pub fn unit(&self, name: &str) -> Result<&StorageUnit> {
        self.data
            .units
            .get(name)
            .ok_or_else(|| InventoryError::UnitNotFound(name.to_string()).into())
    }

    pub fn save(&self) -> Result<()> {
        self.store.save(&self.data)
    }

    pub fn add_unit(&mut self, name: &str, kind: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InventoryError::EmptyName.into());
        }
        if self.data.units.contains_key(name) {
            return Err(InventoryError::UnitExists(name.to_string()).into());
        }
        self.data
            .units
            .insert(name.to_string(), StorageUnit::new(kind));
        self.save()
    }

    /// Remove a unit together with every dismissed reminder for its items.
    pub fn remove_unit(&mut self, name: &str) -> Result<StorageUnit> {
        let unit = self
            .data
            .units
            .remove(name)
            .ok_or_else(|| InventoryError::UnitNotFound(name.to_string()))?;
        let prefix = format!("{name}_");
        self.data.reminders.retain(|k, _| !k.starts_with(&prefix));
        self.save()?;
        Ok(unit)
    }

    /// Store an item, replacing any item of the same name in that unit.
    pub fn add_item(&mut self, item: NewItem, actor: &str, now: NaiveDateTime) -> Result<HistoryEntry> {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(InventoryError::EmptyName.into());
        }
        if item.quantity == 0 {
            return Err(InventoryError::InvalidQuantity.into());
        }
        let today = now.date();
        if item.expiration < today {
            return Err(InventoryError::ExpirationInPast(format_date(item.expiration)).into());
        }

        let unit = self
            .data
            .units
            .get_mut(&item.unit)
            .ok_or_else(|| InventoryError::UnitNotFound(item.unit.clone()))?;
        let expiration_date = format_date(item.expiration);
        unit.contents.insert(
            name.to_string(),
            StoredItem {
                quantity: item.quantity,
                category: item.category.clone(),
                date_added: format_date(today),
                expiration_date: expiration_date.clone(),
            },
        );

        let entry = history_entry(HistoryRecord {
            action: Action::Added,
            item: name,
            category: &item.category,
            quantity: item.quantity,
            storage_unit: &item.unit,
            expired: false,
            expiration_date: Some(expiration_date),
            is_example: false,
            username: actor,
            timestamp: now,
        });
        self.data.history.push(entry.clone());
        self.save()?;
        Ok(entry)
    }

    /// Take `quantity` of an item out, or all of it when `quantity` is
    /// `None` or at least the stored amount.
    pub fn remove_item(
        &mut self,
        unit_name: &str,
        item_name: &str,
        quantity: Option<u32>,
        actor: &str,
        now: NaiveDateTime,
    ) -> Result<HistoryEntry> {
        let item_name = item_name.trim();
        if quantity == Some(0) {
            return Err(InventoryError::InvalidQuantity.into());
        }
        let unit = self
            .data
            .units
            .get_mut(unit_name)
            .ok_or_else(|| InventoryError::UnitNotFound(unit_name.to_string()))?;
        let stored = unit
            .contents
            .get_mut(item_name)
            .ok_or_else(|| InventoryError::ItemNotFound {
                unit: unit_name.to_string(),
                item: item_name.to_string(),
            })?;

        let expired = match parse_date(&stored.expiration_date) {
            Ok(date) => date < now.date(),
            Err(_) => {
                log::warn!(
                    "Invalid expiration date for {} in {}: {}",
                    item_name,
                    unit_name,
                    stored.expiration_date
                );
                false
            }
        };
        let category = stored.category.clone();
        let expiration_date = stored.expiration_date.clone();

        let removed = match quantity {
            Some(q) if q < stored.quantity => {
                stored.quantity -= q;
                q
            }
            _ => {
                let all = stored.quantity;
                unit.contents.remove(item_name);
                all
            }
        };

        let entry = history_entry(HistoryRecord {
            action: Action::Removed,
            item: item_name,
            category: &category,
            quantity: removed,
            storage_unit: unit_name,
            expired,
            expiration_date: Some(expiration_date),
            is_example: false,
            username: actor,
            timestamp: now,
        });
        self.data.history.push(entry.clone());
        self.save()?;
        Ok(entry)
    }

    /// Every item name seen in history or currently stored, sorted.
    pub fn known_items(&self) -> Vec<String> {
        let mut names: BTreeSet<&str> = self.data.history.iter().map(|e| e.item.as_str()).collect();
        for unit in self.data.units.values() {
            names.extend(unit.contents.keys().map(String::as_str));
        }
        names.into_iter().map(String::from).collect()
    }

    /// Silence the expiry warning for one item.
    pub fn dismiss_reminder(&mut self, unit_name: &str, item_name: &str, now: NaiveDateTime) -> Result<()> {
        let item_name = item_name.trim();
        let unit = self.unit(unit_name)?;
        if !unit.contents.contains_key(item_name) {
            return Err(InventoryError::ItemNotFound {
                unit: unit_name.to_string(),
                item: item_name.to_string(),
            }
            .into());
        }
        self.data
            .reminders
            .insert(reminder_key(unit_name, item_name), format_timestamp(now));
        self.save()
    }

    pub fn clear(&mut self, target: ClearTarget) -> Result<()> {
        match target {
            ClearTarget::Storage => self.data.units.clear(),
            ClearTarget::Reminders => self.data.reminders.clear(),
            ClearTarget::History => self.data.history.clear(),
            ClearTarget::Examples => {
                self.data.units.retain(|_, u| !u.is_example);
                self.data.history.retain(|e| !e.is_example);
            }
            ClearTarget::All => {
                self.data.units.clear();
                self.data.reminders.clear();
                self.data.history.clear();
            }
        }
        log::info!("Cleared {:?}", target);
        self.save()
    }

    /// Insert sample data without saving; the caller saves once at the end.
    pub(crate) fn insert_unit_unsaved(&mut self, name: String, unit: StorageUnit) {
        self.data.units.insert(name, unit);
    }

    pub(crate) fn unit_mut_unsaved(&mut self, name: &str) -> Option<&mut StorageUnit> {
        self.data.units.get_mut(name)
    }

    pub(crate) fn record_unsaved(&mut self, entry: HistoryEntry) {
        self.data.history.push(entry);
    }
}

pub(crate) struct HistoryRecord<'a> {
    pub action: Action,
    pub item: &'a str,
    pub category: &'a str,
    pub quantity: u32,
    pub storage_unit: &'a str,
    pub expired: bool,
    pub expiration_date: Option<String>,
    pub is_example: bool,
    pub username: &'a str,
    pub timestamp: NaiveDateTime,
}

pub(crate) fn history_entry(record: HistoryRecord<'_>) -> HistoryEntry {
    HistoryEntry {
        timestamp: format_timestamp(record.timestamp),
        action: record.action,
        item: record.item.to_string(),
        category: strip_emoji(record.category),
        quantity: record.quantity,
        storage_unit: record.storage_unit.to_string(),
        expired: record.expired,
        expiration_date: record.expiration_date,
        is_example: record.is_example,
        username: record.username.to_string(),
    }
}
