use crate::config;
use colored::Colorize;
use std::path::Path;

pub fn run_init(force: bool) -> anyhow::Result<()> {
    let larder_dir = config::larder_dir();
    let config_path = config::config_path();

    eprintln!("{}", "Initializing larder configuration...".bold());

    create_dir_if_needed(&larder_dir)?;
    write_file_if_needed(&config_path, &config::default_config_toml(), force)?;

    // Read back so a kept config.toml decides where the data goes
    let data_dir = config::load_config().data_path();
    create_dir_if_needed(&data_dir)?;

    eprintln!();
    eprintln!("{}", "larder initialized.".green().bold());
    eprintln!("  Config: {}", config_path.display());
    eprintln!("  Data:   {}/", data_dir.display());
    eprintln!();
    eprintln!("Next steps:");
    eprintln!("  larder unit add Kyl --type Kylskåp");
    eprintln!("  larder item add Kyl Mjölk -c Mejeri --expires <YYYY-MM-DD>");
    eprintln!("  larder admin sample-data     (try it out with example data)");

    Ok(())
}

fn create_dir_if_needed(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        eprintln!("  {} {}/", "created".green(), path.display());
    } else {
        eprintln!("  {} {}/", "exists".dimmed(), path.display());
    }
    Ok(())
}

fn write_file_if_needed(path: &Path, content: &str, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        eprintln!("  {} {} (use --force to overwrite)", "skipped".yellow(), path.display());
    } else {
        let label = if path.exists() { "overwrote" } else { "created" };
        std::fs::write(path, content)?;
        eprintln!("  {} {}", label.green(), path.display());
    }
    Ok(())
}
