use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::ConfigurationError;

/// Application configuration module
/// This module holds the conversion options, their documented defaults and
/// the JSON configuration file that the command line merges its flags into.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Conversion options
    #[serde(default)]
    pub options: AssOptions,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Largest accepted manual offset (one day)
pub const MAX_OFFSET_MS: i64 = 86_400_000;

/// How timestamps are shifted during conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "OffsetRepr", into = "OffsetRepr")]
pub enum Offset {
    // @mode: Use the sync offset declared by the document, zero if none
    #[default]
    Auto,
    // @mode: No shift at all
    Disabled,
    // @mode: Shift by a fixed number of milliseconds
    Fixed(i64),
}

impl Offset {
    // @param declared_ms: Offset declared by the document, if any
    // @returns: Offset to apply in milliseconds
    pub fn resolve(&self, declared_ms: Option<i64>) -> i64 {
        match self {
            Self::Auto => declared_ms.unwrap_or(0),
            Self::Disabled => 0,
            Self::Fixed(ms) => *ms,
        }
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Disabled => write!(f, "none"),
            Self::Fixed(ms) => write!(f, "{}", ms),
        }
    }
}

impl std::str::FromStr for Offset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "true" => Ok(Self::Auto),
            "none" | "false" | "off" => Ok(Self::Disabled),
            other => other
                .parse::<i64>()
                .map(Self::Fixed)
                .map_err(|_| anyhow!("Invalid offset: {} (expected auto, none or milliseconds)", s)),
        }
    }
}

/// JSON shape of `Offset`: `true`, `false` or a number of milliseconds
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OffsetRepr {
    Flag(bool),
    Millis(i64),
}

impl From<OffsetRepr> for Offset {
    fn from(repr: OffsetRepr) -> Self {
        match repr {
            OffsetRepr::Flag(true) => Offset::Auto,
            OffsetRepr::Flag(false) => Offset::Disabled,
            OffsetRepr::Millis(ms) => Offset::Fixed(ms),
        }
    }
}

impl From<Offset> for OffsetRepr {
    fn from(offset: Offset) -> Self {
        match offset {
            Offset::Auto => OffsetRepr::Flag(true),
            Offset::Disabled => OffsetRepr::Flag(false),
            Offset::Fixed(ms) => OffsetRepr::Millis(ms),
        }
    }
}

/// Options controlling the generated ASS script
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct AssOptions {
    // @field: Outlined text (true) or opaque background box (false)
    #[serde(default = "default_true")]
    pub border: bool,

    // @field: Scale the font per line by how crowded the page is
    #[serde(default = "default_true")]
    pub float_font: bool,

    // @field: Explicit per-line positions instead of a fixed anchor
    #[serde(default)]
    pub float_pos: bool,

    // @field: Output canvas width
    #[serde(default = "default_target_x")]
    pub target_x: i64,

    // @field: Output canvas height
    #[serde(default = "default_target_y")]
    pub target_y: i64,

    // @field: Fade in (ms)
    #[serde(default = "default_fade_in")]
    pub fade_in: i64,

    // @field: Fade out (ms)
    #[serde(default = "default_fade_out")]
    pub fade_out: i64,

    // @field: Render background-coloured parts and unsung text see-through
    #[serde(default = "default_true")]
    pub transparency: bool,

    // @field: Time shift
    #[serde(default)]
    pub offset: Offset,
}

impl Default for AssOptions {
    fn default() -> Self {
        Self {
            border: true,
            float_font: true,
            float_pos: false,
            target_x: default_target_x(),
            target_y: default_target_y(),
            fade_in: default_fade_in(),
            fade_out: default_fade_out(),
            transparency: true,
            offset: Offset::default(),
        }
    }
}

impl AssOptions {
    /// Check that every option is in range
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if self.fade_in < 0 {
            return Err(ConfigurationError::NegativeFade { which: "fade_in", value: self.fade_in });
        }
        if self.fade_out < 0 {
            return Err(ConfigurationError::NegativeFade { which: "fade_out", value: self.fade_out });
        }
        if self.target_x <= 0 || self.target_y <= 0 {
            return Err(ConfigurationError::InvalidCanvas { x: self.target_x, y: self.target_y });
        }
        if let Offset::Fixed(ms) = self.offset {
            if !(-MAX_OFFSET_MS..=MAX_OFFSET_MS).contains(&ms) {
                return Err(ConfigurationError::OffsetOutOfRange { value: ms, limit: MAX_OFFSET_MS });
            }
        }
        Ok(())
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_true() -> bool {
    true
}

fn default_target_x() -> i64 {
    300
}

fn default_target_y() -> i64 {
    216
}

fn default_fade_in() -> i64 {
    300
}

fn default_fade_out() -> i64 {
    200
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;
        Ok(())
    }
}
