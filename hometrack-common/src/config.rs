//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "hometrack.db";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "HOMETRACK_ROOT";

/// Environment variable carrying the text-generation API key
pub const OPENAI_API_KEY_ENV: &str = "HOMETRACK_OPENAI_API_KEY";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(value) = read_config_value("root_folder") {
        return PathBuf::from(value);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve the text-generation service API key (env var, then TOML config).
///
/// Returns None when unconfigured; the AI-assisted enrichment endpoint is
/// then disabled and reports an internal error when called.
pub fn resolve_openai_api_key() -> Option<String> {
    if let Ok(key) = std::env::var(OPENAI_API_KEY_ENV) {
        if !key.trim().is_empty() {
            return Some(key);
        }
    }
    read_config_value("openai_api_key")
}

/// Ensure the root folder directory exists, creating it if needed
pub fn ensure_root_folder(root_folder: &Path) -> Result<()> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        tracing::info!("Created root folder: {}", root_folder.display());
    }
    Ok(())
}

/// Path of the SQLite database inside the root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// Read a single string value from the platform config file, if present
fn read_config_value(key: &str) -> Option<String> {
    let config_path = find_config_file().ok()?;
    let toml_content = std::fs::read_to_string(&config_path).ok()?;
    let config = toml::from_str::<toml::Value>(&toml_content).ok()?;
    config
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Get configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/hometrack/config.toml first, then /etc/hometrack/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("hometrack").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/hometrack/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("hometrack").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("hometrack"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/hometrack"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("hometrack"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/hometrack"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("hometrack"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\hometrack"))
    } else {
        PathBuf::from("./hometrack_data")
    }
}
