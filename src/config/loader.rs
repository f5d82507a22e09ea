use crate::config::schema::{Config, app_dir};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
pub(crate) static CONFIG_TEST_ENV_LOCK: Mutex<()> = Mutex::new(());

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Loads configuration: defaults, then file, then environment, then CLI flags.
pub fn load_config(cli_model: Option<String>, cli_config_path: Option<PathBuf>) -> Result<Config> {
    tracing::debug!("Loading configuration");

    let mut config = Config::default();

    // Layer 1: config file (~/.askcmd/config.json)
    let config_file = cli_config_path.or_else(get_default_config_path);

    if let Some(ref path) = config_file {
        if path.exists() {
            tracing::debug!(config_path = %path.display(), "Loading configuration from file");
            config = merge_config_from_file(config, path)?;
        } else {
            tracing::debug!(config_path = %path.display(), "Config file not found, using defaults");
        }
    }

    // Layer 2: environment variables
    config = merge_env_variables(config);

    // Layer 3: CLI flags
    if let Some(model) = cli_model {
        tracing::debug!(model = %model, "Applying CLI model override");
        config.model = Some(model);
    }

    let summary = config.get_safe_summary();
    tracing::debug!(
        api_key_configured = summary.api_key_configured,
        base_url = %summary.base_url,
        model = %summary.model,
        "Configuration loaded"
    );

    Ok(config)
}

fn get_default_config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("config.json"))
}

fn merge_config_from_file(config: Config, path: &Path) -> Result<Config> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
        Err(e) => return Err(e).context("Failed to read metadata for config file"),
    };

    let mode = metadata.permissions().mode() & 0o777;
    if mode != 0o600 {
        tracing::error!(
            "Config file {:?} has permissions {:o}, expected 0600 - skipping for security",
            path,
            mode
        );
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let file_config: Config = serde_json::from_str(&content).map_err(|e| {
        eprintln!("Error: Configuration file contains invalid JSON.");
        eprintln!("Suggestion: Run 'askcmd --setup' to recreate the configuration file.");
        ConfigError::InvalidJson(e)
    })?;

    Ok(Config {
        api_key: file_config.api_key.or(config.api_key),
        base_url: file_config.base_url.or(config.base_url),
        model: file_config.model.or(config.model),
        timeout_seconds: file_config.timeout_seconds.or(config.timeout_seconds),
        max_tokens: file_config.max_tokens.or(config.max_tokens),
        history_path: file_config.history_path.or(config.history_path),
        log_path: file_config.log_path.or(config.log_path),
    })
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn merge_env_variables(config: Config) -> Config {
    // Empty strings are treated as unset
    let api_key = env_value("ASKCMD_API_KEY").or_else(|| env_value("OPENAI_API_KEY"));

    Config {
        api_key: api_key.or(config.api_key),
        base_url: env_value("ASKCMD_BASE_URL").or(config.base_url),
        model: env_value("ASKCMD_MODEL").or(config.model),
        ..config
    }
}

/// Writes the config as pretty JSON with 0600 permissions.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(config)?;

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create config file: {:?}", path))?;

    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    let mut permissions = file.metadata()?.permissions();
    permissions.set_mode(0o600);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to set permissions on config file: {:?}", path))?;

    tracing::info!("Configuration saved to {:?}", path);
    Ok(())
}

pub fn get_config_path() -> Option<PathBuf> {
    get_default_config_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    fn clear_env() {
        unsafe {
            env::remove_var("ASKCMD_API_KEY");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("ASKCMD_BASE_URL");
            env::remove_var("ASKCMD_MODEL");
        }
    }

    #[test]
    fn test_load_config_defaults() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let nonexistent_path = temp_dir.path().join("nonexistent_config.json");

        let config = load_config(None, Some(nonexistent_path)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let file_config = Config {
            api_key: Some("file-key".to_string()),
            model: Some("file-model".to_string()),
            max_tokens: Some(512),
            ..Config::default()
        };
        save_config(&file_config, &config_path).unwrap();

        let loaded = load_config(None, Some(config_path)).unwrap();
        assert_eq!(loaded, file_config);
    }

    #[test]
    fn test_load_config_invalid_json() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        fs::write(&config_path, "not valid json").unwrap();
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600)).unwrap();

        let result = load_config(None, Some(config_path));
        let err_msg = format!("{}", result.unwrap_err());
        assert!(err_msg.to_lowercase().contains("json"));
    }

    #[test]
    fn test_world_readable_config_is_skipped() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        fs::write(&config_path, r#"{"api_key": "leaked"}"#).unwrap();
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();

        let config = load_config(None, Some(config_path)).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_env_variable_override() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let file_config = Config {
            api_key: Some("file-key".to_string()),
            base_url: Some("https://file.example/v1".to_string()),
            ..Config::default()
        };
        save_config(&file_config, &config_path).unwrap();

        unsafe {
            env::set_var("OPENAI_API_KEY", "openai-env-key");
            env::set_var("ASKCMD_BASE_URL", "https://env.example/v1");
        }

        let config = load_config(None, Some(config_path)).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("openai-env-key"));
        assert_eq!(config.base_url(), "https://env.example/v1");

        clear_env();
    }

    #[test]
    fn test_askcmd_key_wins_over_openai_key() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("OPENAI_API_KEY", "openai-key");
            env::set_var("ASKCMD_API_KEY", "askcmd-key");
        }

        let temp_dir = TempDir::new().unwrap();
        let config = load_config(None, Some(temp_dir.path().join("none.json"))).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("askcmd-key"));

        clear_env();
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var("ASKCMD_MODEL", "");
        }

        let temp_dir = TempDir::new().unwrap();
        let config = load_config(None, Some(temp_dir.path().join("none.json"))).unwrap();
        assert!(config.model.is_none());

        clear_env();
    }

    #[test]
    fn test_config_hierarchy_precedence() {
        let _lock = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        // Layer 1: file
        let file_config = Config {
            api_key: Some("file-key".to_string()),
            model: Some("file-model".to_string()),
            timeout_seconds: Some(90),
            ..Config::default()
        };
        save_config(&file_config, &config_path).unwrap();

        // Layer 2: env
        unsafe {
            env::set_var("ASKCMD_MODEL", "env-model");
        }

        // Layer 3: CLI
        let config = load_config(Some("cli-model".to_string()), Some(config_path)).unwrap();

        assert_eq!(config.model(), "cli-model");
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.timeout_seconds(), 90);

        clear_env();
    }

    #[test]
    fn test_save_config_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        save_config(&Config::default(), &config_path).unwrap();

        let mode = fs::metadata(&config_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "Config file should have 0600 permissions");
    }

    #[test]
    fn test_get_config_path() {
        if let Some(path) = get_config_path() {
            assert!(path.ends_with(".askcmd/config.json"));
        }
    }
}
