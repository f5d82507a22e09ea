use crate::config::schema::{Config, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::config::{get_config_path, save_config};
use anyhow::{Context, Result};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use std::path::{Path, PathBuf};

/// Interactive configuration flow behind `askcmd --setup`.
///
/// Values already present in `existing` are offered as defaults; an empty API
/// key answer keeps the existing key.
pub fn run_setup(existing: &Config, custom_path: Option<PathBuf>) -> Result<()> {
    let path = match custom_path {
        Some(path) => path,
        None => get_config_path().context("Could not determine home directory")?,
    };

    tracing::debug!(path = %path.display(), "Starting interactive setup");

    println!("Let's configure askcmd!");
    println!("Any OpenAI-compatible chat completions endpoint can be used.");
    println!();

    let config = collect_configuration(existing)?;

    if !confirm_configuration(&config, &path)? {
        println!("Configuration cancelled. No changes were made.");
        return Ok(());
    }

    save_config(&config, &path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn collect_configuration(existing: &Config) -> Result<Config> {
    let base_url = Text::new("API base URL:")
        .with_default(existing.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
        .with_help_message("The endpoint must serve POST <base URL>/chat/completions")
        .prompt()?;

    let model = Text::new("Model:")
        .with_default(existing.model.as_deref().unwrap_or(DEFAULT_MODEL))
        .prompt()?;

    let api_key = Password::new("API key (press Enter to keep the current one):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;

    Ok(Config {
        api_key: if api_key.trim().is_empty() {
            existing.api_key.clone()
        } else {
            Some(api_key.trim().to_string())
        },
        base_url: Some(base_url.trim().to_string()),
        model: Some(model.trim().to_string()),
        ..existing.clone()
    })
}

fn confirm_configuration(config: &Config, path: &Path) -> Result<bool> {
    println!();
    println!("Please review your configuration:");
    println!("  Base URL: {}", config.base_url());
    println!("  Model:    {}", config.model());
    match &config.api_key {
        Some(key) => println!("  API key:  {}", mask_secret(key)),
        None => println!("  API key:  (not set)"),
    }
    println!("  File:     {}", path.display());
    println!();

    let confirmed = Confirm::new("Save this configuration?")
        .with_default(true)
        .prompt()?;

    Ok(confirmed)
}

/// Shows only the last four characters of a secret
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-abcdef123456"), "****3456");
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret(""), "****");
    }
}
