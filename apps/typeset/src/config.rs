use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::layout::{LayoutConfig, SpacingConfig, TypesetSettings};
use crate::markup::SpacingTable;

/// Application configuration loaded from environment variables.
/// Every variable has a default; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory holding `<id>.pos` / `<id>.attr` sheets from the compile step.
    pub sheet_dir: PathBuf,
    pub spacing_enabled: bool,
    pub spacer_unit_pt: f32,
    pub sheet_font_size_pt: f32,
    pub default_font_size: f32,
    /// Replaces the built-in spacing table when set.
    pub spacing_commands: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            sheet_dir: lookup("SHEET_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./sheets")),
            spacing_enabled: parse_or(&lookup, "SPACING_ENABLED", true)?,
            spacer_unit_pt: parse_or(&lookup, "SPACER_UNIT_PT", 3.0)?,
            sheet_font_size_pt: parse_or(&lookup, "SHEET_FONT_SIZE_PT", 10.0)?,
            default_font_size: parse_or(&lookup, "DEFAULT_FONT_SIZE", 10.0)?,
            spacing_commands: lookup("SPACING_COMMANDS").map(|v| parse_spacing_commands(&v)),
        };

        if !(config.sheet_font_size_pt.is_finite() && config.sheet_font_size_pt > 0.0) {
            bail!("SHEET_FONT_SIZE_PT must be positive");
        }
        if !(config.default_font_size.is_finite() && config.default_font_size > 0.0) {
            bail!("DEFAULT_FONT_SIZE must be positive");
        }
        Ok(config)
    }

    pub fn spacing_table(&self) -> SpacingTable {
        match &self.spacing_commands {
            Some(commands) => SpacingTable::from_commands(commands),
            None => SpacingTable::default(),
        }
    }

    pub fn typeset_settings(&self) -> TypesetSettings {
        TypesetSettings {
            spacing_table: self.spacing_table(),
            layout: LayoutConfig {
                font_size: self.default_font_size,
                sheet_font_size_pt: self.sheet_font_size_pt,
                spacing: SpacingConfig {
                    enabled: self.spacing_enabled,
                    unit_pt: self.spacer_unit_pt,
                },
            },
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// Whitespace-separated command list. Commas are valid command characters (`\,`), so
/// they cannot separate entries; a lone `\` stands for the control space `\ `.
fn parse_spacing_commands(raw: &str) -> Vec<String> {
    raw.split_whitespace()
        .map(|c| if c == "\\" { "\\ ".to_string() } else { c.to_string() })
        .collect()
}
