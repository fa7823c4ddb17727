use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDateTime};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use crate::auth::{Actor, Role, UserDirectory};
use crate::cli::{
    AdminCommand, HistoryArgs, ItemCommand, NotifyCommand, NotifyConfigureArgs, OutputFormat,
    RemindCommand, StatsArgs, UnitCommand, UserCommand,
};
use crate::config::LarderConfig;
use crate::expiry::check_expiring_items;
use crate::history::HistoryFilter;
use crate::inventory::{Inventory, NewItem};
use crate::model::{parse_date, StorageUnit};
use crate::notify::message::UserChange;
use crate::notify::{self, schedule, Notifier, NotifySettings, SendOutcome};
use crate::output::{self, Report};
use crate::sample;
use crate::stats::generate_statistics;
use crate::store::Store;

pub const PASSWORD_ENV: &str = "LARDER_PASSWORD";
pub const NEW_PASSWORD_ENV: &str = "LARDER_NEW_PASSWORD";

const DEFAULT_SHELF_LIFE_DAYS: i64 = 7;

/// Everything a command needs to know about this invocation.
pub struct Session {
    config: LarderConfig,
    data_dir: PathBuf,
    user: Option<String>,
}

impl Session {
    pub fn new(config: LarderConfig, user: Option<String>) -> Self {
        let data_dir = config.data_path();
        Self {
            config,
            data_dir,
            user,
        }
    }

    fn store(&self) -> Store {
        Store::new(&self.data_dir)
    }

    fn inventory(&self) -> Result<Inventory> {
        Inventory::open(self.store())
            .with_context(|| format!("failed to load data from {}", self.data_dir.display()))
    }

    fn users(&self) -> Result<UserDirectory> {
        UserDirectory::load(&self.data_dir).context("failed to load users")
    }

    fn actor(&self) -> Result<Actor> {
        let password = std::env::var(PASSWORD_ENV).ok();
        let actor = self.users()?.login(
            self.user.as_deref(),
            password.as_deref(),
            &self.config.history_user_fallback,
        )?;
        Ok(actor)
    }

    fn logged_in(&self) -> Result<Actor> {
        let actor = self.actor()?;
        actor.require_login()?;
        Ok(actor)
    }

    fn admin(&self) -> Result<Actor> {
        let actor = self.actor()?;
        actor.require_admin()?;
        Ok(actor)
    }

    /// Notification settings for side notices; a broken file only costs
    /// the notice.
    fn notify_settings_lenient(&self) -> NotifySettings {
        NotifySettings::load(&self.data_dir).unwrap_or_else(|e| {
            log::warn!("Ignoring notification settings: {}", e);
            NotifySettings::default()
        })
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn new_password() -> Result<String> {
    match std::env::var(NEW_PASSWORD_ENV) {
        Ok(p) if !p.is_empty() => Ok(p),
        _ => bail!("Set {} to the new password", NEW_PASSWORD_ENV),
    }
}

/// Read-only overview. Never writes to disk, tolerates corrupt files.
pub fn run_status(session: &Session) -> Result<()> {
    let snapshot = session.store().load_lenient();
    let window = session.config.expiring_soon_days;
    let expiry = check_expiring_items(&snapshot.units, &snapshot.reminders, now().date(), window);
    output::show(
        OutputFormat::Terminal,
        &Report::Status {
            units: &snapshot.units,
            expiry: &expiry,
            window,
        },
    )?;
    Ok(())
}

pub fn run_unit(session: &Session, command: UnitCommand) -> Result<()> {
    match command {
        UnitCommand::Add(args) => {
            args.validate()?;
            let kind = args.storage_type()?;
            session.admin()?;
            let mut inventory = session.inventory()?;
            inventory.add_unit(&args.name, kind)?;
            eprintln!("  {} {} {}", "created".green(), kind, args.name.trim().bold());
        }
        UnitCommand::Remove(args) => {
            session.admin()?;
            let mut inventory = session.inventory()?;
            let unit = inventory.remove_unit(&args.name)?;
            eprintln!(
                "  {} {} ({} items)",
                "removed".yellow(),
                args.name.bold(),
                unit.contents.len()
            );
        }
        UnitCommand::List(args) => {
            let inventory = session.inventory()?;
            output::show(args.format, &Report::Units(inventory.units()))?;
        }
    }
    Ok(())
}

pub fn run_item(session: &Session, command: ItemCommand) -> Result<()> {
    match command {
        ItemCommand::Add(args) => {
            args.validate()?;
            let category = args.food_category()?;
            let now = now();
            let expiration = match args.expires.as_deref() {
                Some(date) => parse_date(date)?,
                None => now.date() + Duration::days(DEFAULT_SHELF_LIFE_DAYS),
            };
            let actor = session.logged_in()?;
            let mut inventory = session.inventory()?;
            let entry = inventory.add_item(
                NewItem {
                    unit: args.unit.clone(),
                    name: args.name.clone(),
                    quantity: args.quantity,
                    category: category.to_string(),
                    expiration,
                },
                &actor.name,
                now,
            )?;
            eprintln!(
                "  {} {} ×{} in {} (expires {})",
                "added".green(),
                entry.item.bold(),
                entry.quantity,
                entry.storage_unit,
                entry.expiration_date.as_deref().unwrap_or("-")
            );
            notify::notify_item_change(&session.notify_settings_lenient(), &entry);
        }
        ItemCommand::Remove(args) => {
            args.validate()?;
            let actor = session.logged_in()?;
            let mut inventory = session.inventory()?;
            let entry = inventory.remove_item(&args.unit, &args.name, args.quantity, &actor.name, now())?;
            let left = inventory
                .unit(&args.unit)?
                .contents
                .get(&args.name)
                .map(|i| i.quantity)
                .unwrap_or(0);
            eprintln!(
                "  {} {} ×{} from {} ({} left)",
                "removed".yellow(),
                entry.item.bold(),
                entry.quantity,
                entry.storage_unit,
                left
            );
            notify::notify_item_change(&session.notify_settings_lenient(), &entry);
        }
        ItemCommand::List(args) => {
            let inventory = session.inventory()?;
            let units: Vec<(&str, &StorageUnit)> = match args.unit.as_deref() {
                Some(name) => vec![(name, inventory.unit(name)?)],
                None => inventory
                    .units()
                    .iter()
                    .map(|(name, unit)| (name.as_str(), unit))
                    .collect(),
            };
            output::show(
                args.format,
                &Report::Items {
                    units,
                    today: now().date(),
                },
            )?;
        }
        ItemCommand::Known => {
            let inventory = session.inventory()?;
            let names = inventory.known_items();
            output::show(OutputFormat::Terminal, &Report::KnownItems(&names))?;
        }
    }
    Ok(())
}

pub fn run_history(session: &Session, args: HistoryArgs) -> Result<()> {
    args.validate()?;
    let inventory = session.inventory()?;
    let filter = HistoryFilter {
        days: args.days,
        category: args.category.clone(),
        action: args.action_filter(),
    };
    let mut entries = filter.apply(inventory.history(), now());
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    output::show(args.format, &Report::History(&entries))?;
    Ok(())
}

pub fn run_stats(session: &Session, args: StatsArgs) -> Result<()> {
    let inventory = session.inventory()?;
    let stats = generate_statistics(inventory.history(), inventory.units(), args.period(), now());
    output::show(args.format, &Report::Stats(stats.as_ref()))?;
    Ok(())
}

pub fn run_remind(session: &Session, command: RemindCommand) -> Result<()> {
    match command {
        RemindCommand::Dismiss { unit, item } => {
            session.logged_in()?;
            let mut inventory = session.inventory()?;
            inventory.dismiss_reminder(&unit, &item, now())?;
            eprintln!("  {} reminder for {} in {}", "dismissed".green(), item.bold(), unit);
        }
    }
    Ok(())
}

pub fn run_admin(session: &Session, command: AdminCommand) -> Result<()> {
    let actor = session.admin()?;
    let mut inventory = session.inventory()?;
    match command {
        AdminCommand::SampleData { seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let summary = sample::populate(&mut inventory, &mut rng, &actor.name, now())?;
            eprintln!(
                "  {} {} units, {} items, {} history entries",
                "added".green(),
                summary.units.len(),
                summary.items,
                summary.history_entries
            );
            for unit in &summary.units {
                eprintln!("    {unit}");
            }
        }
        AdminCommand::Clear(args) => {
            args.validate()?;
            let target = args.clear_target();
            inventory.clear(target)?;
            eprintln!("  {} {:?}", "cleared".yellow(), target);
        }
    }
    Ok(())
}

pub fn run_user(session: &Session, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::List => {
            let users = session.users()?.list_users();
            output::show(OutputFormat::Terminal, &Report::Users(&users))?;
        }
        UserCommand::Add { name, role } => {
            let actor = session.admin()?;
            let role = Role::from(role);
            let password = new_password()?;
            let mut users = session.users()?;
            if users.is_empty() && role != Role::Admin {
                bail!("The first account must have the admin role (--role admin)");
            }
            users.add_user(&name, &password, role)?;
            eprintln!("  {} {} ({})", "created".green(), name.bold(), role);
            notify::notify_user_change(
                &session.notify_settings_lenient(),
                UserChange::Created,
                &name,
                Some(&actor.name),
                now(),
            );
        }
        UserCommand::Remove { name, yes } => {
            if !yes {
                bail!("Removing user '{}' requires --yes", name);
            }
            let actor = session.admin()?;
            let mut users = session.users()?;
            users.delete_user(&name)?;
            eprintln!("  {} {}", "removed".yellow(), name.bold());
            notify::notify_user_change(
                &session.notify_settings_lenient(),
                UserChange::Deleted,
                &name,
                Some(&actor.name),
                now(),
            );
        }
        UserCommand::Passwd { name } => {
            let actor = session.logged_in()?;
            if actor.name != name && !actor.is_admin() {
                bail!("Only admins can change another user's password");
            }
            let password = new_password()?;
            let mut users = session.users()?;
            users.change_password(&name, &password)?;
            eprintln!("  {} password for {}", "changed".green(), name.bold());
            notify::notify_user_change(
                &session.notify_settings_lenient(),
                UserChange::PasswordChanged,
                &name,
                Some(&actor.name),
                now(),
            );
        }
    }
    Ok(())
}

pub fn run_notify(session: &Session, command: NotifyCommand) -> Result<()> {
    match command {
        NotifyCommand::Configure(args) => {
            args.validate()?;
            session.admin()?;
            let mut settings = NotifySettings::load(&session.data_dir)?;
            apply_configure(&mut settings, &args)?;
            settings.save(&session.data_dir)?;
            eprintln!(
                "  {} {}",
                "saved".green(),
                NotifySettings::path(&session.data_dir).display()
            );
            if !settings.is_configured() {
                eprintln!("  {} no recipient set (use --recipient)", "warning".yellow());
            }
        }
        NotifyCommand::Status => {
            let settings = NotifySettings::load(&session.data_dir)?;
            print_notify_status(&settings)?;
        }
        NotifyCommand::Send { force } => {
            session.logged_in()?;
            let mut settings = NotifySettings::load(&session.data_dir)?;
            let notifier = Notifier::from_settings(&settings)?;
            let inventory = session.inventory()?;
            let outcome = notify::send_status_report(
                &mut settings,
                &notifier,
                inventory.units(),
                inventory.reminders(),
                now(),
                force,
            )?;
            match outcome {
                SendOutcome::Sent => {
                    settings.save(&session.data_dir)?;
                    eprintln!("  {} status report", "sent".green());
                }
                SendOutcome::NothingToReport => {
                    eprintln!("  {} nothing to report", "skipped".dimmed());
                }
                SendOutcome::NotDue { next } => {
                    eprintln!(
                        "  {} next report at {} (use --force to send now)",
                        "not due".dimmed(),
                        next.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        NotifyCommand::Test => {
            session.admin()?;
            let settings = NotifySettings::load(&session.data_dir)?;
            let notifier = Notifier::from_settings(&settings)?;
            notify::send_test_notice(&settings, &notifier, now())?;
            eprintln!("  {} test notice", "sent".green());
        }
        NotifyCommand::Reset => {
            session.admin()?;
            let path = NotifySettings::path(&session.data_dir);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
                eprintln!("  {} {}", "removed".yellow(), path.display());
            } else {
                eprintln!("  {} no notification settings", "skipped".dimmed());
            }
        }
    }
    Ok(())
}

fn apply_configure(settings: &mut NotifySettings, args: &NotifyConfigureArgs) -> Result<()> {
    if let Some(recipient) = &args.recipient {
        settings.recipient = Some(recipient.trim().to_string()).filter(|r| !r.is_empty());
    }
    if !args.channels.is_empty() {
        settings.channels = args.channels.clone();
    }
    if let Some(weekdays) = &args.weekdays {
        settings.schedule.weekdays = schedule::parse_weekdays(weekdays)?;
    }
    if let Some(time) = &args.time {
        let parsed = schedule::parse_time(time)?;
        settings.schedule.time = parsed.format("%H:%M").to_string();
    }

    let prefs = &mut settings.preferences;
    let toggles = [
        (args.expired, &mut prefs.notify_expired),
        (args.expiring_soon, &mut prefs.notify_expiring_soon),
        (args.low_quantity, &mut prefs.notify_low_quantity),
        (args.added_items, &mut prefs.notify_added_items),
        (args.removed_items, &mut prefs.notify_removed_items),
    ];
    for (value, slot) in toggles {
        if let Some(v) = value {
            *slot = v;
        }
    }
    if let Some(days) = args.expiring_soon_days {
        prefs.expiring_soon_days = days;
    }
    if let Some(n) = args.low_quantity_threshold {
        prefs.low_quantity_threshold = n;
    }
    prefs.validate()?;
    Ok(())
}

fn print_notify_status(settings: &NotifySettings) -> Result<()> {
    let on_off = |b: bool| if b { "on".green() } else { "off".dimmed() };
    let p = &settings.preferences;

    println!("{}", "NOTIFICATIONS".bold());
    println!(
        "Recipient:   {}",
        settings.recipient.as_deref().unwrap_or("(not configured)")
    );
    println!("Channels:    {}", settings.channels.join(", "));
    println!("Schedule:    {}", settings.schedule.describe());
    println!(
        "Last sent:   {}",
        settings.last_sent.as_deref().unwrap_or("never")
    );
    if settings.is_configured() {
        let next = settings.next_send(now())?;
        println!("Next send:   {}", next.format("%Y-%m-%d %H:%M"));
    }
    println!();
    println!("Expired items:        {}", on_off(p.notify_expired));
    println!(
        "Expiring soon:        {} (within {} days)",
        on_off(p.notify_expiring_soon),
        p.expiring_soon_days
    );
    println!(
        "Low quantity:         {} (at most {})",
        on_off(p.notify_low_quantity),
        p.low_quantity_threshold
    );
    println!("Added items:          {}", on_off(p.notify_added_items));
    println!("Removed items:        {}", on_off(p.notify_removed_items));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configure_args() -> NotifyConfigureArgs {
        NotifyConfigureArgs {
            recipient: None,
            channels: vec![],
            weekdays: None,
            time: None,
            expired: None,
            expiring_soon: None,
            low_quantity: None,
            added_items: None,
            removed_items: None,
            expiring_soon_days: None,
            low_quantity_threshold: None,
        }
    }

    #[test]
    fn test_apply_configure_updates_only_given_fields() {
        let mut settings = NotifySettings::default();
        let args = NotifyConfigureArgs {
            recipient: Some(" hem@example.com ".into()),
            weekdays: Some("weekends".into()),
            time: Some("7:30".into()),
            low_quantity: Some(true),
            low_quantity_threshold: Some(3),
            ..configure_args()
        };
        apply_configure(&mut settings, &args).unwrap();

        assert_eq!(settings.recipient.as_deref(), Some("hem@example.com"));
        assert_eq!(settings.schedule.weekdays, vec![5, 6]);
        assert_eq!(settings.schedule.time, "07:30");
        assert!(settings.preferences.notify_low_quantity);
        assert_eq!(settings.preferences.low_quantity_threshold, 3);
        assert!(settings.preferences.notify_expired);
        assert_eq!(settings.channels, vec!["stdout"]);
    }

    #[test]
    fn test_apply_configure_rejects_bad_schedule() {
        let mut settings = NotifySettings::default();
        let args = NotifyConfigureArgs {
            time: Some("25:00".into()),
            ..configure_args()
        };
        assert!(apply_configure(&mut settings, &args).is_err());
    }

    #[test]
    fn test_blank_recipient_clears() {
        let mut settings = NotifySettings {
            recipient: Some("hem@example.com".into()),
            ..NotifySettings::default()
        };
        let args = NotifyConfigureArgs {
            recipient: Some("  ".into()),
            ..configure_args()
        };
        apply_configure(&mut settings, &args).unwrap();
        assert!(!settings.is_configured());
    }
}
