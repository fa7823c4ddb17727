use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::auth::Role;
use crate::history::Action;
use crate::inventory::ClearTarget;
use crate::model::{resolve_label, FOOD_CATEGORIES, STORAGE_TYPES};
use crate::stats::Period;

#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(about = "Keep track of what is stored in fridges, freezers and pantries, and what expires when")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Act as this user (password from LARDER_PASSWORD)
    #[arg(long, global = true, value_name = "NAME")]
    pub user: Option<String>,

    /// Disable colored terminal output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Overview of storage units and expiry warnings (the default)
    Status,

    /// Initialize ~/.larder/ with a default config and data directory
    Init(InitArgs),

    /// Manage storage units
    #[command(subcommand)]
    Unit(UnitCommand),

    /// Add, remove and list stored items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Show the activity history
    History(HistoryArgs),

    /// Activity and expiry statistics
    Stats(StatsArgs),

    /// Expiry reminders
    #[command(subcommand)]
    Remind(RemindCommand),

    /// Data maintenance (admin)
    #[command(subcommand)]
    Admin(AdminCommand),

    /// User accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Scheduled and immediate notifications
    #[command(subcommand)]
    Notify(NotifyCommand),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum UnitCommand {
    /// Create a storage unit
    Add(UnitAddArgs),
    /// Delete a storage unit and its contents
    Remove(UnitRemoveArgs),
    /// List storage units
    List(FormatArgs),
}

#[derive(Args, Debug)]
pub struct UnitAddArgs {
    pub name: String,

    /// Storage type, e.g. "Kylskåp" or "🧊 Kylskåp"
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: String,
}

#[derive(Args, Debug)]
pub struct UnitRemoveArgs {
    pub name: String,
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Store an item (replaces an item of the same name)
    Add(ItemAddArgs),
    /// Take out some or all of an item
    Remove(ItemRemoveArgs),
    /// List stored items
    List(ItemListArgs),
    /// Item names seen before, for reuse
    Known,
}

#[derive(Args, Debug)]
pub struct ItemAddArgs {
    pub unit: String,
    pub name: String,

    #[arg(short, long, default_value_t = 1)]
    pub quantity: u32,

    /// Food category, e.g. "Mejeri"
    #[arg(short, long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Expiration date YYYY-MM-DD (default: one week from today)
    #[arg(long, value_name = "DATE")]
    pub expires: Option<String>,
}

#[derive(Args, Debug)]
pub struct ItemRemoveArgs {
    pub unit: String,
    pub name: String,

    /// How many to take out (default: all)
    #[arg(short, long)]
    pub quantity: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ItemListArgs {
    /// Only this unit
    pub unit: Option<String>,

    #[arg(long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    #[arg(long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only entries from the last N days
    #[arg(long, value_name = "N")]
    pub days: Option<i64>,

    /// Only this category
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,

    #[arg(long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[arg(long, value_enum, default_value = "month")]
    pub period: PeriodArg,

    #[arg(long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum RemindCommand {
    /// Stop warning about an item that expires soon
    Dismiss { unit: String, item: String },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Add sample units, items and history
    SampleData {
        /// Seed for reproducible sample data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Delete stored data
    Clear(ClearArgs),
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    #[arg(value_enum)]
    pub target: ClearArg,

    /// Confirm clearing everything
    #[arg(long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// List users and roles
    List,
    /// Create a user (password from LARDER_NEW_PASSWORD)
    Add {
        name: String,
        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
    },
    /// Delete a user
    Remove {
        name: String,
        #[arg(long)]
        yes: bool,
    },
    /// Change a password (new password from LARDER_NEW_PASSWORD)
    Passwd { name: String },
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommand {
    /// Set recipient, channels, schedule and preferences
    Configure(NotifyConfigureArgs),
    /// Show the current settings and the next send time
    Status,
    /// Send the status report if it is due
    Send {
        /// Send even if not due
        #[arg(long)]
        force: bool,
    },
    /// Send a test notice through the configured channels
    Test,
    /// Delete notification settings
    Reset,
}

#[derive(Args, Debug)]
pub struct NotifyConfigureArgs {
    #[arg(long)]
    pub recipient: Option<String>,

    /// Delivery channel: stdout or webhook:<url> (repeatable)
    #[arg(long = "channel", value_name = "CHANNEL")]
    pub channels: Vec<String>,

    /// all, weekdays, weekends or day numbers like 0,4 (0 = Monday)
    #[arg(long)]
    pub weekdays: Option<String>,

    /// Send time HH:MM
    #[arg(long)]
    pub time: Option<String>,

    #[arg(long)]
    pub expired: Option<bool>,

    #[arg(long)]
    pub expiring_soon: Option<bool>,

    #[arg(long)]
    pub low_quantity: Option<bool>,

    #[arg(long)]
    pub added_items: Option<bool>,

    #[arg(long)]
    pub removed_items: Option<bool>,

    /// Warn this many days before expiry (1-30)
    #[arg(long, value_name = "DAYS")]
    pub expiring_soon_days: Option<i64>,

    /// Report items with at most this quantity (1-10)
    #[arg(long, value_name = "N")]
    pub low_quantity_threshold: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodArg {
    Week,
    Month,
    Year,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ClearArg {
    Storage,
    Reminders,
    History,
    Examples,
    All,
}

impl UnitAddArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Unit name must not be empty");
        }
        Ok(())
    }

    pub fn storage_type(&self) -> anyhow::Result<&'static str> {
        resolve_label(&self.kind, STORAGE_TYPES).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown storage type '{}' (choose from: {})",
                self.kind,
                STORAGE_TYPES.join(", ")
            )
        })
    }
}

impl ItemAddArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Item name must not be empty");
        }
        if self.quantity == 0 {
            anyhow::bail!("Quantity must be at least 1");
        }
        Ok(())
    }

    pub fn food_category(&self) -> anyhow::Result<&'static str> {
        match &self.category {
            None => Ok(crate::model::DEFAULT_CATEGORY),
            Some(c) => resolve_label(c, FOOD_CATEGORIES).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown category '{}' (choose from: {})",
                    c,
                    FOOD_CATEGORIES.join(", ")
                )
            }),
        }
    }
}

impl ItemRemoveArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.quantity == Some(0) {
            anyhow::bail!("Quantity must be at least 1");
        }
        Ok(())
    }
}

impl HistoryArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(days) = self.days {
            if days < 1 {
                anyhow::bail!("--days must be at least 1");
            }
        }
        Ok(())
    }

    pub fn action_filter(&self) -> Option<Action> {
        self.action.map(|a| match a {
            ActionArg::Added => Action::Added,
            ActionArg::Removed => Action::Removed,
        })
    }
}

impl StatsArgs {
    pub fn period(&self) -> Period {
        match self.period {
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
            PeriodArg::Year => Period::Year,
            PeriodArg::All => Period::All,
        }
    }
}

impl ClearArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if matches!(self.target, ClearArg::All) && !self.yes {
            anyhow::bail!("Clearing all data requires --yes");
        }
        Ok(())
    }

    pub fn clear_target(&self) -> ClearTarget {
        match self.target {
            ClearArg::Storage => ClearTarget::Storage,
            ClearArg::Reminders => ClearTarget::Reminders,
            ClearArg::History => ClearTarget::History,
            ClearArg::Examples => ClearTarget::Examples,
            ClearArg::All => ClearTarget::All,
        }
    }
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Role::User,
            RoleArg::Admin => Role::Admin,
        }
    }
}

impl NotifyConfigureArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        for channel in &self.channels {
            if crate::notify::parse_channel(channel).is_none() {
                anyhow::bail!("Unknown channel '{}' (use stdout or webhook:<url>)", channel);
            }
        }
        if let Some(days) = self.expiring_soon_days {
            if !(1..=30).contains(&days) {
                anyhow::bail!("--expiring-soon-days must be between 1 and 30");
            }
        }
        if let Some(n) = self.low_quantity_threshold {
            if !(1..=10).contains(&n) {
                anyhow::bail!("--low-quantity-threshold must be between 1 and 10");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["larder"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_user_after_subcommand() {
        let cli = Cli::try_parse_from(["larder", "item", "known", "--user", "anna"]).unwrap();
        assert_eq!(cli.user.as_deref(), Some("anna"));
    }

    #[test]
    fn test_storage_type_resolution() {
        let args = UnitAddArgs {
            name: "Kyl".into(),
            kind: "kylskåp".into(),
        };
        assert_eq!(args.storage_type().unwrap(), "🧊 Kylskåp");
        let args = UnitAddArgs {
            name: "Kyl".into(),
            kind: "Garage".into(),
        };
        assert!(args.storage_type().is_err());
    }

    #[test]
    fn test_item_category_default_and_lookup() {
        let mut args = ItemAddArgs {
            unit: "Kyl".into(),
            name: "Ost".into(),
            quantity: 1,
            category: None,
            expires: None,
        };
        assert_eq!(args.food_category().unwrap(), "📦 Övrigt");
        args.category = Some("mejeri".into());
        assert_eq!(args.food_category().unwrap(), "🥛 Mejeri");
    }

    #[test]
    fn test_clear_all_needs_confirmation() {
        let args = ClearArgs {
            target: ClearArg::All,
            yes: false,
        };
        assert!(args.validate().is_err());
        let args = ClearArgs {
            target: ClearArg::History,
            yes: false,
        };
        assert!(args.validate().is_ok());
        assert_eq!(args.clear_target(), ClearTarget::History);
    }

    #[test]
    fn test_notify_configure_validation() {
        let cli = Cli::try_parse_from([
            "larder",
            "notify",
            "configure",
            "--channel",
            "pager",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Notify(NotifyCommand::Configure(args))) => {
                assert!(args.validate().is_err())
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_notify_test_subcommand() {
        let cli = Cli::try_parse_from(["larder", "notify", "test"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Notify(NotifyCommand::Test))));
        assert!(Cli::try_parse_from(["larder", "notify", "test", "--force"]).is_err());
    }
}
