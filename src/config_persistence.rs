use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::{sanitize_config, Config};

const CONFIG_DIR_NAME: &str = "genretag";
const CONFIG_FILE_NAME: &str = "config.toml";

/// `<config_dir>/genretag/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Writes a default config file at `path` unless one already exists.
pub fn ensure_config_file(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create config directory {}: {}",
                parent.display(),
                err
            )
        })?;
    }

    let default_text = toml::to_string(&Config::default())
        .map_err(|err| format!("failed to serialize default config to TOML: {}", err))?;
    info!(
        "Config file not found. Creating default config. path={}",
        path.display()
    );
    std::fs::write(path, default_text)
        .map_err(|err| format!("Failed to write default config {}: {}", path.display(), err))
}

/// Loads and sanitizes the config at `path`, falling back to defaults when it cannot be
/// read or parsed.
pub fn load_config_file(path: &Path) -> Config {
    let config_content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(
                "Failed to read config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            return Config::default();
        }
    };

    match toml::from_str::<Config>(&config_content) {
        Ok(config) => sanitize_config(config),
        Err(err) => {
            warn!(
                "Failed to parse config file {}. Using defaults. error={}",
                path.display(),
                err
            );
            Config::default()
        }
    }
}

/// Resolves, creates if needed, and loads the user's config file.
pub fn load_or_create_config() -> Result<Config, String> {
    let Some(config_path) = default_config_path() else {
        warn!("No platform config directory available. Using default config.");
        return Ok(Config::default());
    };

    ensure_config_file(&config_path)?;
    Ok(load_config_file(&config_path))
}
