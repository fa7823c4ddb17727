use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global configuration loaded from ~/.larder/config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LarderConfig {
    /// Directory holding storage.json, history.json, reminders.json,
    /// users.toml and notify.yml
    pub data_dir: String,

    /// Items expiring within this many days are listed as warnings
    pub expiring_soon_days: i64,

    /// Username recorded in history when nobody is logged in
    pub history_user_fallback: String,
}

impl Default for LarderConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.larder/data".to_string(),
            expiring_soon_days: 7,
            history_user_fallback: "Okänd".to_string(),
        }
    }
}

impl LarderConfig {
    /// Data directory with `~` expanded. A relative path is resolved
    /// against the larder directory.
    pub fn data_path(&self) -> PathBuf {
        let expanded = expand_tilde_str(&self.data_dir);
        if expanded.is_relative() {
            larder_dir().join(expanded)
        } else {
            expanded
        }
    }
}

/// Load config from ~/.larder/config.toml, falling back to defaults.
pub fn load_config() -> LarderConfig {
    let config_path = config_path();
    if !config_path.exists() {
        return LarderConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                log::info!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                log::warn!(
                    "Failed to parse {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                LarderConfig::default()
            }
        },
        Err(e) => {
            log::warn!(
                "Failed to read {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            LarderConfig::default()
        }
    }
}

/// Returns the path to ~/.larder/config.toml
pub fn config_path() -> PathBuf {
    larder_dir().join("config.toml")
}

/// Returns $LARDER_HOME, or ~/.larder/
pub fn larder_dir() -> PathBuf {
    resolve_larder_dir(
        std::env::var("LARDER_HOME").ok(),
        std::env::var("HOME").ok(),
    )
}

fn resolve_larder_dir(larder_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(dir) = larder_home.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    let home = home.unwrap_or_else(|| "/tmp".to_string());
    PathBuf::from(home).join(".larder")
}

/// Expand ~ to $HOME in a path. `~/.larder` always means the larder
/// directory, so it follows LARDER_HOME when that is set.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str == "~/.larder" {
        return larder_dir();
    }
    if let Some(rest) = path_str.strip_prefix("~/.larder/") {
        return larder_dir().join(rest);
    }
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

/// Expand ~ in a string path
pub fn expand_tilde_str(path: &str) -> PathBuf {
    expand_tilde(Path::new(path))
}

/// Generate the default config.toml content
pub fn default_config_toml() -> String {
    let config = LarderConfig::default();

    let mut toml = String::from("# larder configuration\n\n");

    toml.push_str("# Where storage units, history, reminders, users and\n");
    toml.push_str("# notification settings are kept\n");
    toml.push_str(&format!("data_dir = {:?}\n\n", config.data_dir));

    toml.push_str("# Warn about items expiring within this many days\n");
    toml.push_str(&format!(
        "expiring_soon_days = {}\n\n",
        config.expiring_soon_days
    ));

    toml.push_str("# Name written to the history when nobody is logged in\n");
    toml.push_str(&format!(
        "history_user_fallback = {:?}\n",
        config.history_user_fallback
    ));

    toml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = LarderConfig::default();
        assert_eq!(config.expiring_soon_days, 7);
        assert_eq!(config.data_dir, "~/.larder/data");
        assert_eq!(config.history_user_fallback, "Okänd");
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let toml_str = default_config_toml();
        let parsed: LarderConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, "~/.larder/data");
        assert_eq!(parsed.expiring_soon_days, 7);
        assert_eq!(parsed.history_user_fallback, "Okänd");
    }

    #[test]
    fn test_partial_config_deserialize() {
        let config: LarderConfig = toml::from_str("expiring_soon_days = 3\n").unwrap();
        assert_eq!(config.expiring_soon_days, 3);
        assert_eq!(config.data_dir, "~/.larder/data");
    }

    #[test]
    fn test_larder_home_override() {
        let dir = resolve_larder_dir(Some("/srv/larder".into()), Some("/home/a".into()));
        assert_eq!(dir, PathBuf::from("/srv/larder"));
    }

    #[test]
    fn test_larder_dir_from_home() {
        let dir = resolve_larder_dir(None, Some("/home/a".into()));
        assert_eq!(dir, PathBuf::from("/home/a/.larder"));

        let blank = resolve_larder_dir(Some("  ".into()), Some("/home/b".into()));
        assert_eq!(blank, PathBuf::from("/home/b/.larder"));
    }

    #[test]
    fn test_larder_dir_without_home() {
        assert_eq!(resolve_larder_dir(None, None), PathBuf::from("/tmp/.larder"));
    }

    #[test]
    fn test_absolute_data_dir_is_kept() {
        let config = LarderConfig {
            data_dir: "/var/lib/larder".to_string(),
            ..LarderConfig::default()
        };
        assert_eq!(config.data_path(), PathBuf::from("/var/lib/larder"));
    }
}
