use anyhow::Result;

use crate::cli::output::OutputOptions;
use crate::core::config::AppConfig;
use crate::core::session::SessionStore;

pub fn init(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    match AppConfig::default().save() {
        Ok(path) => {
            let config = AppConfig::default();
            println!("Generated config at {}", path.display());
            println!("  API: {}", config.api.base_url);
            println!("  Campaign: {}", config.api.campaign);
            println!("  Live refresh every {}s", config.api.poll_interval_secs);
        }
        Err(e) => {
            eprintln!("Failed to generate config: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

pub fn check(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `calldash config init` to create one.");
        return Ok(());
    }

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let issues = config.validate();
    if issues.is_empty() {
        println!("Config is valid: {}", path.display());
        println!("  API: {}", config.api.effective_base_url());
        println!("  Campaign: {}", config.api.campaign);
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        std::process::exit(1);
    }
    Ok(())
}

pub fn path(_opts: &OutputOptions) -> Result<()> {
    println!("config:  {}", AppConfig::config_path().display());
    println!("session: {}", SessionStore::default_path().display());
    Ok(())
}
