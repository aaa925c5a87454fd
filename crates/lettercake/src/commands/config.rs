use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_default()?;
    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "(not created yet, showing defaults)".dimmed());
    }
    println!();

    let defaults = config.defaults.clone().unwrap_or_default();
    let unset = || "(unset)".dimmed().to_string();
    println!("{}", "defaults".bold());
    println!("  windowed:       {}", defaults.windowed.unwrap_or(false));
    println!("  music:          {}", if config.music_on() { "on" } else { "off" });
    println!(
        "  music_file:     {}",
        defaults
            .music_file
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in melody)".dimmed().to_string())
    );
    println!(
        "  letters_dir:    {}",
        defaults
            .letters_dir
            .map(|p| p.display().to_string())
            .unwrap_or_else(unset)
    );
    println!(
        "  blow_threshold: {}",
        defaults
            .blow_threshold
            .unwrap_or(crate::audio::detector::DEFAULT_BLOW_THRESHOLD)
    );
    println!("{}", "card".bold());
    println!("  recipient:      {}", config.recipient());
    println!("  signature:      {}", config.signature());
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let path = Config::path()?;
    Config::update_file(&path, key, value)?;
    println!("{} {key} = {value} ({})", "Saved".green().bold(), path.display());
    Ok(())
}
