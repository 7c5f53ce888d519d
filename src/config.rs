//! Configuration for podfeed.

use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// Static channel header values shared by both feeds.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChannelConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_copyright")]
    pub copyright: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// `itunes:summary`. Falls back to the description when unset.
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default = "default_owner_name")]
    pub owner_name: String,
    #[serde(default = "default_owner_email")]
    pub owner_email: String,
    #[serde(default = "default_image_url")]
    pub image_url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_subcategory")]
    pub subcategory: String,
}

fn default_title() -> String {
    "Software Daily".to_string()
}

fn default_link() -> String {
    "https://softwaredaily.com".to_string()
}

fn default_language() -> String {
    "en-us".to_string()
}

fn default_copyright() -> String {
    "\u{a9} SoftwareDaily.com".to_string()
}

fn default_author() -> String {
    "SoftwareDaily.com".to_string()
}

fn default_description() -> String {
    "Technical interviews about software topics.".to_string()
}

fn default_owner_name() -> String {
    "Software Daily".to_string()
}

fn default_owner_email() -> String {
    "jeff@softwareengineeringdaily.com".to_string()
}

fn default_image_url() -> String {
    "https://www.softwaredaily.com/static/sedailywords.png".to_string()
}

fn default_category() -> String {
    "News".to_string()
}

fn default_subcategory() -> String {
    "Tech News".to_string()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            link: default_link(),
            language: default_language(),
            copyright: default_copyright(),
            author: default_author(),
            description: default_description(),
            summary: None,
            owner_name: default_owner_name(),
            owner_email: default_owner_email(),
            image_url: default_image_url(),
            category: default_category(),
            subcategory: default_subcategory(),
        }
    }
}

/// Ad-free audio rewrite settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// Prefix of original audio URLs.
    #[serde(default)]
    pub ad_free_from: String,
    /// Prefix substituted for the private feed.
    #[serde(default)]
    pub ad_free_to: String,
}

/// Episode source settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Timeout in milliseconds for HTTP sources.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
