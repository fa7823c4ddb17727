use std::io::{BufWriter, Write};

use chrono::NaiveDate;
use colored::Colorize;

use super::{OutputSink, Report};
use crate::error::Result;
use crate::expiry::{ExpiryNotice, ExpiryReport};
use crate::history::{Action, HistoryEntry};
use crate::model::{category_emoji, parse_date, StorageUnit, StorageUnits};
use crate::stats::{Count, Statistics};

const RULE_WIDTH: usize = 60;

/// Colored, human-readable output.
pub struct TerminalSink {
    writer: BufWriter<Box<dyn Write>>,
}

impl TerminalSink {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    fn rule(&self) -> String {
        "─".repeat(RULE_WIDTH).dimmed().to_string()
    }

    fn format_status(&self, units: &StorageUnits, expiry: &ExpiryReport, window: i64) -> Vec<String> {
        let mut lines = vec![format!("{}", "MATFÖRVARING".bold()), self.rule()];
        if units.is_empty() {
            lines.push("No storage units yet. Add one with `larder unit add <NAME> --type <TYPE>`.".into());
        }
        for (name, unit) in units {
            let count: u64 = unit.contents.values().map(|i| u64::from(i.quantity)).sum();
            lines.push(format!(
                "  {} {} {}",
                unit.kind,
                name.bold(),
                format!("({} items, {} pieces)", unit.contents.len(), count).dimmed()
            ));
        }

        if !expiry.expired.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}", "🚨 Expired".red().bold()));
            for n in &expiry.expired {
                lines.push(self.format_notice(n, format!("expired {} days ago", n.days).red().to_string()));
            }
        }
        if !expiry.expiring.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "{}",
                format!("⚠️  Expiring within {window} days").yellow().bold()
            ));
            for n in &expiry.expiring {
                let when = match n.days {
                    0 => "expires today".to_string(),
                    1 => "expires tomorrow".to_string(),
                    d => format!("expires in {d} days"),
                };
                lines.push(self.format_notice(n, when.yellow().to_string()));
            }
        }
        if expiry.is_empty() && !units.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}", "Nothing expired or expiring soon.".green()));
        }
        lines.push(self.rule());
        lines
    }

    fn format_notice(&self, n: &ExpiryNotice, when: String) -> String {
        format!(
            "  {} {} ×{} in {} {} {}",
            category_emoji(&n.category),
            n.item.bold(),
            n.quantity,
            n.unit,
            format!("[{}]", n.exp_date).dimmed(),
            when
        )
    }

    fn format_units(&self, units: &StorageUnits) -> Vec<String> {
        if units.is_empty() {
            return vec!["No storage units.".into()];
        }
        units
            .iter()
            .map(|(name, unit)| {
                let example = if unit.is_example { " (example)".dimmed().to_string() } else { String::new() };
                format!("{:<24} {:<14} {:>3} items{}", name.bold(), unit.kind, unit.contents.len(), example)
            })
            .collect()
    }

    fn format_items(&self, units: &[(&str, &StorageUnit)], today: NaiveDate) -> Vec<String> {
        let mut lines = Vec::new();
        for (name, unit) in units {
            lines.push(format!("{} {}", unit.kind, name.bold()));
            if unit.contents.is_empty() {
                lines.push(format!("  {}", "(empty)".dimmed()));
            }
            for (item, details) in &unit.contents {
                let left = match parse_date(&details.expiration_date) {
                    Ok(date) => {
                        let days = (date - today).num_days();
                        let text = format!("{days:>4}d");
                        if days < 0 {
                            text.red().bold().to_string()
                        } else if days <= 3 {
                            text.yellow().to_string()
                        } else {
                            text.green().to_string()
                        }
                    }
                    Err(_) => "   ?".dimmed().to_string(),
                };
                lines.push(format!(
                    "  {} {:<20} ×{:<3} {} {}",
                    category_emoji(&details.category),
                    item,
                    details.quantity,
                    details.expiration_date.dimmed(),
                    left
                ));
            }
        }
        if lines.is_empty() {
            lines.push("No storage units.".into());
        }
        lines
    }

    fn format_history(&self, entries: &[&HistoryEntry]) -> Vec<String> {
        if entries.is_empty() {
            return vec!["No history entries match.".into()];
        }
        entries
            .iter()
            .map(|e| {
                let action = match e.action {
                    Action::Added => "ADDED  ".green().to_string(),
                    Action::Removed if e.expired => "EXPIRED".red().to_string(),
                    Action::Removed => "REMOVED".blue().to_string(),
                };
                let example = if e.is_example { " (example)".dimmed().to_string() } else { String::new() };
                format!(
                    "{} {} {} ×{} [{}] {} {}{}",
                    e.timestamp.dimmed(),
                    action,
                    e.item.bold(),
                    e.quantity,
                    e.category,
                    e.storage_unit,
                    format!("by {}", e.username).dimmed(),
                    example
                )
            })
            .collect()
    }

    fn format_counts(&self, title: &str, counts: &[Count], lines: &mut Vec<String>) {
        if counts.is_empty() {
            return;
        }
        lines.push(format!("\n{}", title.bold()));
        for c in counts {
            lines.push(format!("  {:<24} {:>4}", c.name, c.count));
        }
    }

    fn format_stats(&self, stats: Option<&Statistics>) -> Vec<String> {
        let Some(stats) = stats else {
            return vec!["No history yet.".into()];
        };
        let a = &stats.activity;
        let x = &stats.expiry;
        let mut lines = vec![
            format!("{}", "STATISTICS".bold()),
            self.rule(),
            format!("Period:            {:?} ({} events)", stats.period, stats.entries),
            format!("Added:             {}", a.total_added),
            format!("Used:              {}", a.used),
            format!("Thrown away:       {}", a.expired_removals),
        ];
        self.format_counts("Events per category", &a.category_counts, &mut lines);
        self.format_counts("Most added", &a.most_added, &mut lines);
        self.format_counts("Most used", &a.most_used, &mut lines);
        self.format_counts("Most often expired", &a.most_expired, &mut lines);
        self.format_counts("Daily activity", &a.daily_activity, &mut lines);

        lines.push(format!("\n{}", "Current stock".bold()));
        if !x.has_stock {
            lines.push("  No items stored.".into());
        } else {
            lines.push(format!("  Expired now:           {}", x.currently_expired));
            lines.push(format!("  Expiring within 7 days: {}", x.expiring_within_week));
            lines.push(format!("  Avg days to expiry:    {}", x.avg_days_to_expiry));
            if !x.near_expiry.is_empty() {
                lines.push(format!("\n{}", "Closest to expiry".bold()));
                for s in &x.near_expiry {
                    lines.push(format!(
                        "  {:<20} {:>3}d  {} ×{}",
                        s.item, s.days_until_expiry, s.storage_unit, s.quantity
                    ));
                }
            }
            self.format_counts("Expired per category", &x.expired_by_category, &mut lines);
            if !x.avg_shelf_life.is_empty() {
                lines.push(format!("\n{}", "Avg days left per category".bold()));
                for c in &x.avg_shelf_life {
                    lines.push(format!("  {:<24} {:>6.1}", c.category, c.days));
                }
            }
        }
        lines.push(self.rule());
        lines
    }

    fn format_users(&self, users: &[(String, crate::auth::Role)]) -> Vec<String> {
        if users.is_empty() {
            return vec!["No users; authentication is off.".into()];
        }
        users
            .iter()
            .map(|(name, role)| format!("{:<20} {}", name.bold(), role.to_string().cyan()))
            .collect()
    }
}

impl OutputSink for TerminalSink {
    fn emit(&mut self, report: &Report<'_>) -> Result<()> {
        let lines = match report {
            Report::Status { units, expiry, window } => self.format_status(units, expiry, *window),
            Report::Units(units) => self.format_units(units),
            Report::Items { units, today } => self.format_items(units, *today),
            Report::KnownItems(names) => {
                if names.is_empty() {
                    vec!["No known items.".to_string()]
                } else {
                    names.to_vec()
                }
            }
            Report::History(entries) => self.format_history(entries),
            Report::Stats(stats) => self.format_stats(*stats),
            Report::Users(users) => self.format_users(users),
        };
        for line in lines {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoredItem;
    use crate::output::Capture;

    fn render(report: &Report<'_>) -> String {
        colored::control::set_override(false);
        let capture = Capture::default();
        let mut sink = TerminalSink::new(Box::new(capture.clone()));
        sink.emit(report).unwrap();
        sink.flush().unwrap();
        capture.text()
    }

    fn notice(item: &str, days: i64) -> ExpiryNotice {
        ExpiryNotice {
            item: item.into(),
            unit: "Kyl".into(),
            days,
            exp_date: "2024-03-18".into(),
            category: "🥛 Mejeri".into(),
            quantity: 1,
            key: None,
        }
    }

    #[test]
    fn test_status_sections() {
        let mut units = StorageUnits::new();
        units.insert("Kyl".into(), StorageUnit::new("🧊 Kylskåp"));
        let expiry = ExpiryReport {
            expired: vec![notice("Mjölk", 2)],
            expiring: vec![notice("Ost", 1)],
        };
        let text = render(&Report::Status { units: &units, expiry: &expiry, window: 7 });
        assert!(text.contains("🧊 Kylskåp Kyl"));
        assert!(text.contains("Mjölk ×1 in Kyl [2024-03-18] expired 2 days ago"));
        assert!(text.contains("Expiring within 7 days"));
        assert!(text.contains("expires tomorrow"));
    }

    #[test]
    fn test_empty_status() {
        let units = StorageUnits::new();
        let text = render(&Report::Status {
            units: &units,
            expiry: &ExpiryReport::default(),
            window: 7,
        });
        assert!(text.contains("No storage units yet"));
    }

    #[test]
    fn test_items_days_left() {
        let mut unit = StorageUnit::new("❄️ Frys");
        unit.contents.insert(
            "Glass".into(),
            StoredItem {
                quantity: 3,
                category: "🧊 Frysta varor".into(),
                date_added: "2024-03-01".into(),
                expiration_date: "2024-03-30".into(),
            },
        );
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let text = render(&Report::Items { units: vec![("Frys", &unit)], today });
        assert!(text.contains("❄️ Frys Frys"));
        assert!(text.contains("Glass"));
        assert!(text.contains("  10d"));
    }

    #[test]
    fn test_status_piece_count_does_not_overflow() {
        let mut unit = StorageUnit::new("🧊 Kylskåp");
        for name in ["Mjölk", "Ost"] {
            unit.contents.insert(
                name.into(),
                StoredItem {
                    quantity: u32::MAX,
                    category: "🥛 Mejeri".into(),
                    date_added: "2024-03-01".into(),
                    expiration_date: "2024-03-30".into(),
                },
            );
        }
        let mut units = StorageUnits::new();
        units.insert("Kyl".into(), unit);
        let text = render(&Report::Status {
            units: &units,
            expiry: &ExpiryReport::default(),
            window: 7,
        });
        assert!(text.contains("(2 items, 8589934590 pieces)"));
    }

    #[test]
    fn test_no_stats() {
        assert_eq!(render(&Report::Stats(None)).trim(), "No history yet.");
    }
}
