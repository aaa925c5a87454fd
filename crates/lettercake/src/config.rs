use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "lettercake";

pub const DEFAULT_RECIPIENT: &str = "Sifu";
pub const DEFAULT_SIGNATURE: &str = "Yours, always";

const VALID_KEYS: &str = "defaults.windowed, defaults.music, defaults.music_file, \
defaults.letters_dir, defaults.blow_threshold, card.recipient, card.signature";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windowed: Option<bool>,

    /// `on` or `off`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letters_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blow_threshold: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Defaults when no config file exists yet. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from_or_default(&path)
    }

    pub fn load_from_or_default(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => anyhow::bail!("Failed to read config {}: {e}", path.display()),
        };
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Change one key in the file at `path`, keeping every other value.
    pub fn update_file(path: &Path, key: &str, value: &str) -> Result<()> {
        let mut config = Self::load_from_or_default(path)?;
        config.set(key, value)?;
        config.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# Lettercake configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.windowed" => {
                let windowed = match value {
                    "true" => true,
                    "false" => false,
                    _ => anyhow::bail!("Invalid windowed: {value}. Must be 'true' or 'false'."),
                };
                self.defaults_mut().windowed = Some(windowed);
            }
            "defaults.music" => {
                match value {
                    "on" | "off" => {}
                    _ => anyhow::bail!("Invalid music: {value}. Must be 'on' or 'off'."),
                }
                self.defaults_mut().music = Some(value.to_string());
            }
            "defaults.music_file" => {
                if value.is_empty() {
                    anyhow::bail!("Invalid music_file: must not be empty.");
                }
                self.defaults_mut().music_file = Some(PathBuf::from(value));
            }
            "defaults.letters_dir" => {
                if value.is_empty() {
                    anyhow::bail!("Invalid letters_dir: must not be empty.");
                }
                self.defaults_mut().letters_dir = Some(PathBuf::from(value));
            }
            "defaults.blow_threshold" => {
                let threshold = value
                    .parse::<f32>()
                    .ok()
                    .filter(|t| *t > 0.0 && *t < 255.0)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "Invalid blow_threshold: {value}. Must be a number between 0 and 255."
                        )
                    })?;
                self.defaults_mut().blow_threshold = Some(threshold);
            }
            "card.recipient" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Invalid recipient: must not be empty.");
                }
                self.card_mut().recipient = Some(value.to_string());
            }
            "card.signature" => {
                self.card_mut().signature = Some(value.to_string());
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {VALID_KEYS}"),
        }
        Ok(())
    }

    fn defaults_mut(&mut self) -> &mut DefaultsConfig {
        self.defaults.get_or_insert_with(DefaultsConfig::default)
    }

    fn card_mut(&mut self) -> &mut CardConfig {
        self.card.get_or_insert_with(CardConfig::default)
    }

    pub fn recipient(&self) -> &str {
        self.card
            .as_ref()
            .and_then(|c| c.recipient.as_deref())
            .unwrap_or(DEFAULT_RECIPIENT)
    }

    pub fn signature(&self) -> &str {
        self.card
            .as_ref()
            .and_then(|c| c.signature.as_deref())
            .unwrap_or(DEFAULT_SIGNATURE)
    }

    pub fn music_on(&self) -> bool {
        self.defaults
            .as_ref()
            .and_then(|d| d.music.as_deref())
            .is_none_or(|m| m == "on")
    }
}
