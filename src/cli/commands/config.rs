//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&redacted(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }

        ConfigAction::Init => {
            // Loaded settings carry credentials from the environment
            write_config(&Settings::default(), &path)?;
        }
    }

    Ok(())
}

fn write_config(settings: &Settings, path: &PathBuf) -> Result<()> {
    if path.exists() {
        Output::warning(&format!("Config already exists at {}", path.display()));
        return Ok(());
    }
    settings.save_to(path)?;
    Output::success(&format!("Created config at {}", path.display()));
    Ok(())
}

/// Hide credentials before printing.
fn redacted(mut settings: Settings) -> Settings {
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("********".to_string());
        }
    };
    mask(&mut settings.completion.api_key);
    mask(&mut settings.tools.youtube_api_key);
    mask(&mut settings.web_search.brave_api_key);
    settings
}
