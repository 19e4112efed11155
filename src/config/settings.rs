use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "DefectPromptBuilder";
const CONFIG_FILE: &str = "settings.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "defectpromptbuilder", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

fn resolve_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => get_config_file_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the settings record, from `config_path` if given, else from the
/// platform config directory.
///
/// A missing file is created with defaults. A file that cannot be parsed logs
/// a warning and yields the defaults, leaving the broken file untouched.
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig> {
    let config_path = resolve_path(config_path)?;

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, Some(&config_path))?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;

    match parse_config(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(AppConfig::default())
        }
    }
}

/// Saves the provided configuration, creating the parent directory if needed.
pub fn save_config(config: &AppConfig, config_path: Option<&Path>) -> Result<()> {
    let config_path = resolve_path(config_path)?;

    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(&config_path, config_json)?;
    tracing::debug!("Saved config to {:?}", config_path);

    Ok(())
}

/// Exports the current configuration to a user-specified JSON file.
pub fn export_config(config: &AppConfig, export_path: &Path) -> Result<()> {
    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, config_json)?;
    tracing::info!("Exported config to {:?}", export_path);
    Ok(())
}

/// Imports a configuration from a user-specified JSON file. Unlike
/// [`load_config`], a malformed file is an error.
pub fn import_config(import_path: &Path) -> Result<AppConfig> {
    let config_content = fs::read_to_string(import_path)?;
    let config = parse_config(&config_content)?;
    tracing::info!("Imported config from {:?}", import_path);
    Ok(config)
}

/// Parses a settings record. Only a JSON object is accepted; serde would
/// otherwise read `[]` as a record of defaults.
fn parse_config(content: &str) -> Result<AppConfig> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.is_object() {
        anyhow::bail!("Settings must be a JSON object, found {}", json_kind(&value));
    }
    Ok(serde_json::from_value(value)?)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.defectpromptbuilder.DefectPromptBuilder/
// Linux:   ~/.config/defectpromptbuilder/
// Windows: %APPDATA%/defectpromptbuilder/DefectPromptBuilder/config/
