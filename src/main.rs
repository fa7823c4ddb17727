mod auth;
mod cli;
mod commands;
mod config;
mod error;
mod expiry;
mod history;
mod init;
mod inventory;
mod model;
mod notify;
mod output;
mod sample;
mod stats;
mod store;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::Session;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let session = Session::new(config::load_config(), cli.user);

    match cli.command {
        None | Some(Commands::Status) => commands::run_status(&session),
        Some(Commands::Init(args)) => init::run_init(args.force),
        Some(Commands::Unit(command)) => commands::run_unit(&session, command),
        Some(Commands::Item(command)) => commands::run_item(&session, command),
        Some(Commands::History(args)) => commands::run_history(&session, args),
        Some(Commands::Stats(args)) => commands::run_stats(&session, args),
        Some(Commands::Remind(command)) => commands::run_remind(&session, command),
        Some(Commands::Admin(command)) => commands::run_admin(&session, command),
        Some(Commands::User(command)) => commands::run_user(&session, command),
        Some(Commands::Notify(command)) => commands::run_notify(&session, command),
    }
}
