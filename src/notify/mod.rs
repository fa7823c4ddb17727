pub mod message;
pub mod schedule;
pub mod stdout;
pub mod webhook;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NotifyError, Result, StoreError};
use crate::history::{Action, HistoryEntry};
use crate::model::{format_timestamp, Reminders, StorageUnits};
use message::{Notification, UserChange};

pub const NOTIFY_FILE: &str = "notify.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Webhook(String),
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Stdout => write!(f, "stdout"),
            Channel::Webhook(url) => write!(f, "webhook:{url}"),
        }
    }
}

pub fn parse_channel(s: &str) -> Option<Channel> {
    match s {
        "stdout" => Some(Channel::Stdout),
        s if s.starts_with("webhook:") => {
            let url = s.strip_prefix("webhook:")?.trim();
            if url.is_empty() {
                None
            } else {
                Some(Channel::Webhook(url.to_string()))
            }
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub notify_expired: bool,
    pub notify_expiring_soon: bool,
    pub notify_low_quantity: bool,
    pub notify_removed_items: bool,
    pub notify_added_items: bool,
    pub expiring_soon_days: i64,
    pub low_quantity_threshold: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notify_expired: true,
            notify_expiring_soon: true,
            notify_low_quantity: false,
            notify_removed_items: false,
            notify_added_items: false,
            expiring_soon_days: 7,
            low_quantity_threshold: 2,
        }
    }
}

impl Preferences {
    pub fn validate(&self) -> std::result::Result<(), NotifyError> {
        if !(1..=30).contains(&self.expiring_soon_days) {
            return Err(NotifyError::InvalidSchedule(format!(
                "expiring_soon_days must be 1-30, got {}",
                self.expiring_soon_days
            )));
        }
        if !(1..=10).contains(&self.low_quantity_threshold) {
            return Err(NotifyError::InvalidSchedule(format!(
                "low_quantity_threshold must be 1-10, got {}",
                self.low_quantity_threshold
            )));
        }
        Ok(())
    }

    fn wants(&self, action: Action) -> bool {
        match action {
            Action::Added => self.notify_added_items,
            Action::Removed => self.notify_removed_items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// 0 = Monday
    pub weekdays: Vec<u8>,
    /// HH:MM, local time
    pub time: String,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            weekdays: (0..7).collect(),
            time: "08:00".to_string(),
        }
    }
}

impl Schedule {
    pub fn time_of_day(&self) -> std::result::Result<NaiveTime, NotifyError> {
        schedule::parse_time(&self.time)
    }

    pub fn describe(&self) -> String {
        format!("{} kl {}", schedule::format_weekdays(&self.weekdays), self.time)
    }
}

/// Contents of notify.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub recipient: Option<String>,
    pub channels: Vec<String>,
    pub last_sent: Option<String>,
    pub schedule: Schedule,
    pub preferences: Preferences,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            recipient: None,
            channels: vec!["stdout".to_string()],
            last_sent: None,
            schedule: Schedule::default(),
            preferences: Preferences::default(),
        }
    }
}

impl NotifySettings {
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(NOTIFY_FILE)
    }

    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let settings = serde_yml::from_str(&content).map_err(|e| NotifyError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(settings)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = Self::path(data_dir);
        let content = serde_yml::to_string(self).map_err(NotifyError::Serialize)?;
        std::fs::create_dir_all(data_dir)?;
        std::fs::write(&path, content).map_err(|e| StoreError::FileWrite {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.recipient.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    pub fn parsed_channels(&self) -> std::result::Result<Vec<Channel>, NotifyError> {
        self.channels
            .iter()
            .map(|c| parse_channel(c).ok_or_else(|| NotifyError::UnknownChannel(c.clone())))
            .collect()
    }

    pub fn last_sent_time(&self) -> Option<NaiveDateTime> {
        self.last_sent.as_deref().and_then(schedule::parse_last_sent)
    }

    pub fn next_send(&self, now: NaiveDateTime) -> std::result::Result<NaiveDateTime, NotifyError> {
        Ok(schedule::next_scheduled_time(
            &self.schedule.weekdays,
            self.schedule.time_of_day()?,
            now,
        ))
    }

    pub fn is_due(&self, now: NaiveDateTime) -> std::result::Result<bool, NotifyError> {
        Ok(schedule::is_due(
            &self.schedule.weekdays,
            self.schedule.time_of_day()?,
            self.last_sent_time(),
            now,
        ))
    }
}

pub trait NotificationSink {
    fn deliver(&self, notification: &Notification) -> Result<()>;
    fn channel(&self) -> Channel;
}

/// Fans a notification out to every configured channel.
pub struct Notifier {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl Notifier {
    pub fn new(channels: &[Channel]) -> Self {
        let mut sinks: Vec<Box<dyn NotificationSink>> = Vec::new();
        for channel in channels {
            match channel {
                Channel::Stdout => sinks.push(Box::new(stdout::StdoutSink::new())),
                Channel::Webhook(url) => {
                    sinks.push(Box::new(webhook::WebhookSink::new(url.clone())))
                }
            }
        }

        // Default to stdout if no channels configured
        if sinks.is_empty() {
            sinks.push(Box::new(stdout::StdoutSink::new()));
        }

        Self { sinks }
    }

    pub fn from_settings(settings: &NotifySettings) -> Result<Self> {
        Ok(Self::new(&settings.parsed_channels()?))
    }

    /// Succeeds when at least one sink accepted the notification.
    pub fn dispatch(&self, notification: &Notification) -> Result<()> {
        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.deliver(notification) {
                Ok(()) => delivered += 1,
                Err(e) => log::error!("Notification delivery failed for {}: {}", sink.channel(), e),
            }
        }
        if delivered == 0 {
            return Err(NotifyError::AllSinksFailed.into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    NothingToReport,
    NotDue { next: NaiveDateTime },
}

/// Send the status report if it is due (or `force`), recording `last_sent`.
pub fn send_status_report(
    settings: &mut NotifySettings,
    notifier: &Notifier,
    units: &StorageUnits,
    reminders: &Reminders,
    now: NaiveDateTime,
    force: bool,
) -> Result<SendOutcome> {
    if !settings.is_configured() {
        return Err(NotifyError::NotConfigured.into());
    }
    if !force && !settings.is_due(now)? {
        return Ok(SendOutcome::NotDue {
            next: settings.next_send(now)?,
        });
    }
    let Some(notification) = message::status_report(
        units,
        reminders,
        &settings.preferences,
        settings.recipient.as_deref(),
        now,
    ) else {
        log::info!("No items to report after applying preferences");
        return Ok(SendOutcome::NothingToReport);
    };
    notifier.dispatch(&notification)?;
    settings.last_sent = Some(format_timestamp(now));
    Ok(SendOutcome::Sent)
}

/// Deliver a test notice now, ignoring the schedule and leaving
/// `last_sent` untouched.
pub fn send_test_notice(settings: &NotifySettings, notifier: &Notifier, now: NaiveDateTime) -> Result<()> {
    if !settings.is_configured() {
        return Err(NotifyError::NotConfigured.into());
    }
    notifier.dispatch(&message::test_notice(settings.recipient.as_deref(), now))
}

/// Immediate notice for an added or removed item. Delivery problems are
/// logged, never returned: the inventory change already happened.
pub fn notify_item_change(settings: &NotifySettings, entry: &HistoryEntry) {
    if entry.is_example || !settings.is_configured() || !settings.preferences.wants(entry.action) {
        return;
    }
    let notifier = match Notifier::from_settings(settings) {
        Ok(n) => n,
        Err(e) => {
            log::warn!("Skipping item notification: {}", e);
            return;
        }
    };
    let notice = message::item_notice(entry, settings.recipient.as_deref());
    if let Err(e) = notifier.dispatch(&notice) {
        log::warn!("Item notification failed: {}", e);
    }
}

pub fn notify_user_change(
    settings: &NotifySettings,
    change: UserChange,
    username: &str,
    performed_by: Option<&str>,
    now: NaiveDateTime,
) {
    if !settings.is_configured() {
        return;
    }
    let notifier = match Notifier::from_settings(settings) {
        Ok(n) => n,
        Err(e) => {
            log::warn!("Skipping user notification: {}", e);
            return;
        }
    };
    let notice = message::user_notice(change, username, performed_by, settings.recipient.as_deref(), now);
    if let Err(e) = notifier.dispatch(&notice) {
        log::warn!("User notification failed: {}", e);
    }
}
