//! `smartflow config`: Show the effective configuration.

use smartflow_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    println!("{}", render(&config)?);
    Ok(())
}

/// The config as TOML, with the API key masked.
fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.openai.api_key.is_some() {
        shown.openai.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown)
}
